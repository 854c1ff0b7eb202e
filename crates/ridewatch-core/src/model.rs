//! Domain records — the rows the ingestion and news pipelines produce.
//!
//! Every persisted record comes in two shapes: a `New*` input accepted by
//! [`crate::store::IntelStore`] and the stored form, whose identifier and
//! `collected_at` timestamp are assigned by the store.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The app store a release or review was scraped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Ios,
  Android,
}

impl Platform {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Ios => "ios",
      Self::Android => "android",
    }
  }
}

impl FromStr for Platform {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ios" => Ok(Self::Ios),
      "android" => Ok(Self::Android),
      other => Err(unknown("platform", other)),
    }
  }
}

/// How much a release changes the product.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Significance {
  Major,
  #[default]
  Minor,
  Bugfix,
}

impl Significance {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Major => "major",
      Self::Minor => "minor",
      Self::Bugfix => "bugfix",
    }
  }
}

impl FromStr for Significance {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "major" => Ok(Self::Major),
      "minor" => Ok(Self::Minor),
      "bugfix" => Ok(Self::Bugfix),
      other => Err(unknown("significance", other)),
    }
  }
}

/// Which side of the marketplace wrote a review.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
  Driver,
  Rider,
  #[default]
  Unknown,
}

impl UserRole {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Driver => "driver",
      Self::Rider => "rider",
      Self::Unknown => "unknown",
    }
  }
}

impl FromStr for UserRole {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "driver" => Ok(Self::Driver),
      "rider" => Ok(Self::Rider),
      "unknown" => Ok(Self::Unknown),
      other => Err(unknown("user role", other)),
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
  Positive,
  #[default]
  Neutral,
  Negative,
}

impl Sentiment {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Positive => "positive",
      Self::Neutral => "neutral",
      Self::Negative => "negative",
    }
  }
}

impl FromStr for Sentiment {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "positive" => Ok(Self::Positive),
      "neutral" => Ok(Self::Neutral),
      "negative" => Ok(Self::Negative),
      other => Err(unknown("sentiment", other)),
    }
  }
}

/// Where a webhook batch was scraped from, derived from the task name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
  Website,
  AppStore,
  PlayStore,
}

impl SourceType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Website => "website",
      Self::AppStore => "appstore",
      Self::PlayStore => "playstore",
    }
  }
}

impl FromStr for SourceType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "website" => Ok(Self::Website),
      "appstore" => Ok(Self::AppStore),
      "playstore" => Ok(Self::PlayStore),
      other => Err(unknown("source type", other)),
    }
  }
}

/// Terminal state of one webhook invocation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
  #[default]
  Success,
  Partial,
  Failed,
}

impl CollectionStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Success => "success",
      Self::Partial => "partial",
      Self::Failed => "failed",
    }
  }
}

impl FromStr for CollectionStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "success" => Ok(Self::Success),
      "partial" => Ok(Self::Partial),
      "failed" => Ok(Self::Failed),
      other => Err(unknown("collection status", other)),
    }
  }
}

fn unknown(kind: &'static str, value: &str) -> Error {
  Error::UnknownVariant { kind, value: value.to_owned() }
}

// ─── Competitor ──────────────────────────────────────────────────────────────

/// A tracked rival. Seeded by configuration; ingestion only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
  pub competitor_id: Uuid,
  /// Unique lowercase identifier used in scraper task names.
  pub slug:          String,
  pub name:          String,
  pub is_active:     bool,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCompetitor {
  pub slug: String,
  pub name: String,
}

// ─── Tariffs ─────────────────────────────────────────────────────────────────

/// Conditions a competitor offers its drivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverTariff {
  pub tariff_id:       Uuid,
  pub competitor_id:   Uuid,
  /// Commission as a percentage, e.g. `25.00`.
  pub commission_rate: Option<Decimal>,
  pub min_fare:        Option<Decimal>,
  pub signup_bonus:    Option<Decimal>,
  pub referral_bonus:  Option<Decimal>,
  pub requirements:    Option<Vec<String>>,
  pub benefits:        Option<Vec<String>>,
  pub currency:        String,
  pub source_url:      Option<String>,
  /// Set on every row of the most recent batch for the competitor.
  pub is_latest:       bool,
  pub collected_at:    DateTime<Utc>,
}

/// One row of a driver-tariff batch. The competitor is supplied per batch.
#[derive(Debug, Clone, Default)]
pub struct NewDriverTariff {
  pub commission_rate: Option<Decimal>,
  pub min_fare:        Option<Decimal>,
  pub signup_bonus:    Option<Decimal>,
  pub referral_bonus:  Option<Decimal>,
  pub requirements:    Option<Vec<String>>,
  pub benefits:        Option<Vec<String>>,
  pub currency:        String,
  pub source_url:      Option<String>,
}

/// Prices a competitor charges its riders for one service type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderTariff {
  pub tariff_id:     Uuid,
  pub competitor_id: Uuid,
  pub service_type:  String,
  pub base_fare:     Option<Decimal>,
  pub per_km_rate:   Option<Decimal>,
  pub per_min_rate:  Option<Decimal>,
  pub booking_fee:   Option<Decimal>,
  pub currency:      String,
  pub source_url:    Option<String>,
  pub is_latest:     bool,
  pub collected_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewRiderTariff {
  pub service_type: String,
  pub base_fare:    Option<Decimal>,
  pub per_km_rate:  Option<Decimal>,
  pub per_min_rate: Option<Decimal>,
  pub booking_fee:  Option<Decimal>,
  pub currency:     String,
  pub source_url:   Option<String>,
}

// ─── Releases ────────────────────────────────────────────────────────────────

/// An app version published by a competitor.
///
/// Natural key: `(competitor_id, platform, version)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
  pub release_id:    Uuid,
  pub competitor_id: Uuid,
  pub platform:      Platform,
  pub version:       String,
  pub release_date:  Option<NaiveDate>,
  pub release_notes: Option<String>,
  pub rating:        Option<Decimal>,
  pub rating_count:  Option<i64>,
  pub significance:  Significance,
  pub categories:    Vec<String>,
  /// Short AI-written (or fallback) summary of the release notes.
  pub summary:       Option<String>,
  pub collected_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRelease {
  pub competitor_id: Uuid,
  pub platform:      Platform,
  pub version:       String,
  pub release_date:  Option<NaiveDate>,
  pub release_notes: Option<String>,
  pub rating:        Option<Decimal>,
  pub rating_count:  Option<i64>,
  pub significance:  Significance,
  pub categories:    Vec<String>,
  pub summary:       Option<String>,
}

// ─── Reviews ─────────────────────────────────────────────────────────────────

/// A store review, classified by role and sentiment.
///
/// Natural key: `external_id`, which is globally unique across platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
  pub review_id:     Uuid,
  pub external_id:   String,
  pub competitor_id: Uuid,
  pub platform:      Platform,
  pub author:        Option<String>,
  /// Star rating in `1..=5`.
  pub rating:        u8,
  pub text:          Option<String>,
  pub review_date:   Option<NaiveDate>,
  pub app_version:   Option<String>,
  pub role:          UserRole,
  pub sentiment:     Sentiment,
  pub categories:    Vec<String>,
  pub key_topics:    Vec<String>,
  pub collected_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
  pub external_id:   String,
  pub competitor_id: Uuid,
  pub platform:      Platform,
  pub author:        Option<String>,
  pub rating:        u8,
  pub text:          Option<String>,
  pub review_date:   Option<NaiveDate>,
  pub app_version:   Option<String>,
  pub role:          UserRole,
  pub sentiment:     Sentiment,
  pub categories:    Vec<String>,
  pub key_topics:    Vec<String>,
}

/// Build the platform-scoped external id for a review.
pub fn review_external_id(platform: Platform, source_id: &str) -> String {
  format!("{}_{source_id}", platform.as_str())
}

// ─── News ────────────────────────────────────────────────────────────────────

/// A market news article found through a search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
  pub news_id:               Uuid,
  /// Hex digest of the normalised source URL; the deduplication key.
  pub unique_id:             String,
  pub search_query:          String,
  pub title:                 String,
  pub summary:               Option<String>,
  pub source_url:            String,
  pub source_name:           Option<String>,
  /// Name of the search provider that returned the article.
  pub provider:              String,
  pub published_date:        Option<NaiveDate>,
  pub competitors_mentioned: Vec<String>,
  pub topics:                Vec<String>,
  pub category:              String,
  pub sentiment:             Sentiment,
  pub relevance_score:       f64,
  pub is_relevant:           bool,
  pub collected_at:          DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNewsItem {
  pub unique_id:             String,
  pub search_query:          String,
  pub title:                 String,
  pub summary:               Option<String>,
  pub source_url:            String,
  pub source_name:           Option<String>,
  pub provider:              String,
  pub published_date:        Option<NaiveDate>,
  pub competitors_mentioned: Vec<String>,
  pub topics:                Vec<String>,
  pub category:              String,
  pub sentiment:             Sentiment,
  pub relevance_score:       f64,
}

// ─── Collection log ──────────────────────────────────────────────────────────

/// Audit row summarising one webhook invocation. Written once, at the end of
/// the invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionLog {
  pub log_id:          Uuid,
  pub task_name:       String,
  pub source_type:     SourceType,
  pub competitor_id:   Option<Uuid>,
  pub status:          CollectionStatus,
  pub error_message:   Option<String>,
  pub items_collected: u32,
  /// Identifying fields of the incoming payload (`taskId`, `dataCount`).
  pub raw_payload:     serde_json::Value,
  pub started_at:      DateTime<Utc>,
  pub completed_at:    Option<DateTime<Utc>>,
}

impl CollectionLog {
  /// Open a log in the `Success` state, stamped with the current time.
  pub fn start(
    task_name: impl Into<String>,
    source_type: SourceType,
    raw_payload: serde_json::Value,
  ) -> Self {
    Self {
      log_id: Uuid::new_v4(),
      task_name: task_name.into(),
      source_type,
      competitor_id: None,
      status: CollectionStatus::Success,
      error_message: None,
      items_collected: 0,
      raw_payload,
      started_at: Utc::now(),
      completed_at: None,
    }
  }
}

// ─── Insertion outcome ───────────────────────────────────────────────────────

/// Result of an insert guarded by a natural-key uniqueness constraint.
#[derive(Debug, Clone)]
pub enum Insertion<T> {
  Inserted(T),
  /// A row with the same natural key already exists; nothing was written.
  Duplicate,
}

impl<T> Insertion<T> {
  pub fn is_inserted(&self) -> bool { matches!(self, Self::Inserted(_)) }

  pub fn inserted(self) -> Option<T> {
    match self {
      Self::Inserted(v) => Some(v),
      Self::Duplicate => None,
    }
  }
}
