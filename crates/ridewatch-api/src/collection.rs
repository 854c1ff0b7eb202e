//! Handlers for `/collection` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/collection/logs` | Optional `?limit=` |
//! | `GET`  | `/collection/status` | Latest outcome per scraper task |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use ridewatch_core::{
  model::{CollectionLog, CollectionStatus, SourceType},
  store::IntelStore,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, LimitParams, error::ApiError};

/// Logs inspected when summarising source health.
const STATUS_WINDOW: usize = 100;

/// `GET /collection/logs[?limit=<n>]`
pub async fn logs<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<CollectionLog>>, ApiError>
where
  S: IntelStore + 'static,
{
  let logs = state
    .store
    .list_collection_logs(params.get())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(logs))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
  Healthy,
  Warning,
  Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
  pub task_name:       String,
  pub source_type:     SourceType,
  pub competitor_id:   Option<Uuid>,
  pub last_status:     CollectionStatus,
  /// Completion time of the latest run, when that run succeeded.
  pub last_success:    Option<DateTime<Utc>>,
  pub items_collected: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionHealth {
  pub sources:     Vec<SourceStatus>,
  pub health:      Health,
  pub last_update: DateTime<Utc>,
}

/// Reduce newest-first `logs` to the latest run of each task.
///
/// More than half the sources failing is an error; any failure, or more than
/// a third partial, is a warning.
pub fn summarize(logs: &[CollectionLog], now: DateTime<Utc>) -> CollectionHealth {
  let mut sources: Vec<SourceStatus> = Vec::new();
  for log in logs {
    if sources.iter().any(|s| s.task_name == log.task_name) {
      continue;
    }
    sources.push(SourceStatus {
      task_name:       log.task_name.clone(),
      source_type:     log.source_type,
      competitor_id:   log.competitor_id,
      last_status:     log.status,
      last_success:    (log.status == CollectionStatus::Success)
        .then_some(log.completed_at)
        .flatten(),
      items_collected: log.items_collected,
    });
  }

  let total = sources.len();
  let count = |status: CollectionStatus| sources.iter().filter(|s| s.last_status == status).count();
  let (failed, partial) = (count(CollectionStatus::Failed), count(CollectionStatus::Partial));
  let health = if failed * 2 > total {
    Health::Error
  } else if failed > 0 || partial * 3 > total {
    Health::Warning
  } else {
    Health::Healthy
  };

  CollectionHealth { sources, health, last_update: now }
}

/// `GET /collection/status`
pub async fn status<S>(State(state): State<ApiState<S>>) -> Result<Json<CollectionHealth>, ApiError>
where
  S: IntelStore + 'static,
{
  let logs = state
    .store
    .list_collection_logs(STATUS_WINDOW)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summarize(&logs, Utc::now())))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn log(task: &str, status: CollectionStatus) -> CollectionLog {
    let mut log = CollectionLog::start(task, SourceType::Website, json!({}));
    log.status = status;
    log.completed_at = Some(Utc::now());
    log
  }

  #[test]
  fn latest_run_per_task_wins() {
    let logs = [
      log("uber-driver-pe", CollectionStatus::Success),
      log("uber-driver-pe", CollectionStatus::Failed),
      log("appstore-uber", CollectionStatus::Partial),
    ];
    let summary = summarize(&logs, Utc::now());
    assert_eq!(summary.sources.len(), 2);
    assert_eq!(summary.sources[0].last_status, CollectionStatus::Success);
    assert!(summary.sources[0].last_success.is_some());
    assert!(summary.sources[1].last_success.is_none());
    // One of two partial is more than a third.
    assert_eq!(summary.health, Health::Warning);
  }

  #[test]
  fn majority_failed_is_error() {
    let logs = [
      log("a", CollectionStatus::Failed),
      log("b", CollectionStatus::Failed),
      log("c", CollectionStatus::Success),
    ];
    assert_eq!(summarize(&logs, Utc::now()).health, Health::Error);
  }

  #[test]
  fn no_logs_is_healthy() {
    let summary = summarize(&[], Utc::now());
    assert!(summary.sources.is_empty());
    assert_eq!(summary.health, Health::Healthy);
  }
}
