//! Routing rules for scraper task names.
//!
//! The scraping tool names its tasks by convention:
//!
//! | Task name | Meaning |
//! |-----------|---------|
//! | `{competitor}-driver-{market}` | driver tariffs |
//! | `{competitor}-rider-{market}` | rider tariffs |
//! | `appstore-{competitor}` | iOS releases and reviews |
//! | `playstore-{competitor}` | Android releases and reviews |
//!
//! All functions expect the task name already lowercased.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Platform, SourceType};

static STORE_TASK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(appstore|playstore)-(\w+)$").expect("static regex")
});

static TARIFF_TASK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\w+)-(driver|rider)-\w+$").expect("static regex")
});

/// What a webhook batch contains, decided from its task name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
  DriverTariffs,
  RiderTariffs,
  AppStore(Platform),
  Unknown,
}

impl TaskKind {
  /// Substring checks in priority order: `-driver-`, `-rider-`, then the
  /// store prefixes.
  pub fn from_task_name(task_name: &str) -> Self {
    if task_name.contains("-driver-") {
      Self::DriverTariffs
    } else if task_name.contains("-rider-") {
      Self::RiderTariffs
    } else if task_name.starts_with("appstore-") {
      Self::AppStore(Platform::Ios)
    } else if task_name.starts_with("playstore-") {
      Self::AppStore(Platform::Android)
    } else {
      Self::Unknown
    }
  }
}

impl SourceType {
  pub fn from_task_name(task_name: &str) -> Self {
    if task_name.starts_with("appstore-") {
      Self::AppStore
    } else if task_name.starts_with("playstore-") {
      Self::PlayStore
    } else {
      Self::Website
    }
  }
}

/// Extract the competitor slug from a task name, or `None` when the name
/// follows neither convention.
///
/// `appstore-uber` → `uber`; `indriver-driver-pe` → `indriver`.
pub fn competitor_slug(task_name: &str) -> Option<&str> {
  if let Some(caps) = STORE_TASK.captures(task_name) {
    return caps.get(2).map(|m| m.as_str());
  }
  TARIFF_TASK
    .captures(task_name)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}
