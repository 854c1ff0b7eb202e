//! The `IntelStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `ridewatch-store-sqlite`). The ingestion and news pipelines depend on this
//! abstraction, not on any concrete backend.
//!
//! Backends must enforce the natural keys as uniqueness constraints:
//! `Review.external_id`, `Release(competitor_id, platform, version)` and
//! `NewsItem.unique_id`. An insert that loses a race against a concurrent
//! insert of the same key reports [`Insertion::Duplicate`] instead of failing.

use std::future::Future;

use uuid::Uuid;

use crate::model::{
  CollectionLog, Competitor, DriverTariff, Insertion, NewCompetitor,
  NewDriverTariff, NewNewsItem, NewRelease, NewReview, NewRiderTariff,
  NewsItem, Platform, Release, Review, RiderTariff,
};

/// Abstraction over a ridewatch store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IntelStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Competitors ───────────────────────────────────────────────────────

  /// Persist a competitor. Fails if the slug is already taken.
  fn add_competitor(
    &self,
    input: NewCompetitor,
  ) -> impl Future<Output = Result<Competitor, Self::Error>> + Send + '_;

  fn find_competitor_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Competitor>, Self::Error>> + Send + 'a;

  fn list_competitors(
    &self,
  ) -> impl Future<Output = Result<Vec<Competitor>, Self::Error>> + Send + '_;

  // ── Tariffs ───────────────────────────────────────────────────────────

  /// Replace the latest driver tariffs of a competitor.
  ///
  /// Clears `is_latest` on every existing row for the competitor, then
  /// inserts `batch` with `is_latest = true`. Both steps run in one
  /// transaction; on failure neither is visible.
  fn replace_driver_tariffs(
    &self,
    competitor_id: Uuid,
    batch: Vec<NewDriverTariff>,
  ) -> impl Future<Output = Result<Vec<DriverTariff>, Self::Error>> + Send + '_;

  /// Rider-tariff counterpart of [`IntelStore::replace_driver_tariffs`].
  fn replace_rider_tariffs(
    &self,
    competitor_id: Uuid,
    batch: Vec<NewRiderTariff>,
  ) -> impl Future<Output = Result<Vec<RiderTariff>, Self::Error>> + Send + '_;

  fn latest_driver_tariffs(
    &self,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<DriverTariff>, Self::Error>> + Send + '_;

  fn latest_rider_tariffs(
    &self,
    competitor_id: Uuid,
  ) -> impl Future<Output = Result<Vec<RiderTariff>, Self::Error>> + Send + '_;

  // ── Releases ──────────────────────────────────────────────────────────

  fn release_exists<'a>(
    &'a self,
    competitor_id: Uuid,
    platform: Platform,
    version: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn insert_release(
    &self,
    input: NewRelease,
  ) -> impl Future<Output = Result<Insertion<Release>, Self::Error>> + Send + '_;

  /// A competitor's releases, newest release date first (undated last).
  fn list_releases(
    &self,
    competitor_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Release>, Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  fn review_exists<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn insert_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Insertion<Review>, Self::Error>> + Send + '_;

  /// A competitor's reviews, newest review date first (undated last).
  fn list_reviews(
    &self,
    competitor_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;

  // ── News ──────────────────────────────────────────────────────────────

  fn news_item_exists<'a>(
    &'a self,
    unique_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn insert_news_item(
    &self,
    input: NewNewsItem,
  ) -> impl Future<Output = Result<Insertion<NewsItem>, Self::Error>> + Send + '_;

  /// Most recently collected news items first.
  fn list_news_items(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<NewsItem>, Self::Error>> + Send + '_;

  // ── Collection logs ───────────────────────────────────────────────────

  /// Append a finished collection log.
  fn record_collection_log(
    &self,
    log: CollectionLog,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Most recently started logs first.
  fn list_collection_logs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<CollectionLog>, Self::Error>> + Send + '_;
}
