//! [`WebhookProcessor`] — turns one scraper webhook into stored rows and a
//! collection log.

use std::sync::Arc;

use chrono::Utc;
use ridewatch_ai::Classifier;
use ridewatch_core::{
  model::{
    CollectionLog, CollectionStatus, Competitor, NewDriverTariff, NewRelease,
    NewReview, NewRiderTariff, Platform, SourceType, review_external_id,
  },
  parse::{DateFormats, Record},
  store::IntelStore,
  task::{TaskKind, competitor_slug},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  Error, IngestConfig, Result,
  records::{AppStoreRecord, DriverTariffRecord, ReviewRecord, RiderTariffRecord},
};

pub const UNKNOWN_TASK: &str = "Unknown task type";

/// Row counts saturate instead of wrapping.
fn row_count(rows: usize) -> u32 { u32::try_from(rows).unwrap_or(u32::MAX) }

/// Body of a scraper webhook.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
  #[serde(default)]
  pub task_id:     String,
  pub task_name:   String,
  #[serde(default)]
  pub task_group:  Option<String>,
  #[serde(default)]
  pub data_count:  u64,
  #[serde(default)]
  pub data_list:   Vec<Record>,
  #[serde(default)]
  pub exported_at: Option<String>,
}

/// What a webhook invocation achieved.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
  /// Rows actually written.
  pub processed: u32,
  pub status:    CollectionStatus,
}

pub struct WebhookProcessor<S> {
  store:        Arc<S>,
  classifier:   Arc<dyn Classifier>,
  date_formats: DateFormats,
}

impl<S> WebhookProcessor<S>
where
  S: IntelStore,
{
  pub fn new(store: Arc<S>, classifier: Arc<dyn Classifier>, config: IngestConfig) -> Self {
    Self { store, classifier, date_formats: config.date_formats }
  }

  /// Process one webhook. Never fails: errors end up in the collection log
  /// and the returned status.
  pub async fn process(&self, payload: WebhookPayload) -> ProcessOutcome {
    let task_name = payload.task_name.to_lowercase();
    let mut log = CollectionLog::start(
      payload.task_name.as_str(),
      SourceType::from_task_name(&task_name),
      json!({ "taskId": payload.task_id, "dataCount": payload.data_count }),
    );
    info!(
      task_name = %payload.task_name,
      task_id = %payload.task_id,
      data_count = payload.data_count,
      "processing webhook"
    );

    let mut processed = 0u32;
    match self
      .dispatch(&task_name, &payload.data_list, &mut log, &mut processed)
      .await
    {
      Ok(None) => {}
      Ok(Some(reason)) => {
        warn!(task_name = %payload.task_name, reason = %reason, "webhook partially processed");
        log.status = CollectionStatus::Partial;
        log.error_message = Some(reason);
      }
      Err(e) => {
        error!(task_name = %payload.task_name, error = %e, processed, "webhook failed");
        log.status = CollectionStatus::Failed;
        log.error_message = Some(e.to_string());
      }
    }

    log.items_collected = processed;
    log.completed_at = Some(Utc::now());
    let status = log.status;

    if let Err(e) = self.store.record_collection_log(log).await {
      error!(task_name = %payload.task_name, error = %e, "failed to record collection log");
    }

    info!(
      task_name = %payload.task_name,
      processed,
      status = status.as_str(),
      "webhook processed"
    );
    ProcessOutcome { processed, status }
  }

  /// Route the batch. `Ok(Some(reason))` means nothing could be done.
  async fn dispatch(
    &self,
    task_name: &str,
    data: &[Record],
    log: &mut CollectionLog,
    processed: &mut u32,
  ) -> Result<Option<String>> {
    let kind = TaskKind::from_task_name(task_name);
    let competitor = self.resolve(task_name).await?;
    log.competitor_id = competitor.as_ref().map(|c| c.competitor_id);

    match (kind, competitor) {
      (TaskKind::Unknown, _) => Ok(Some(UNKNOWN_TASK.to_owned())),
      (_, None) => Ok(Some(format!(
        "Unknown competitor: {}",
        competitor_slug(task_name).unwrap_or(task_name)
      ))),
      (TaskKind::DriverTariffs, Some(c)) => {
        *processed = processed.saturating_add(self.driver_tariffs(&c, data).await?);
        Ok(None)
      }
      (TaskKind::RiderTariffs, Some(c)) => {
        *processed = processed.saturating_add(self.rider_tariffs(&c, data).await?);
        Ok(None)
      }
      (TaskKind::AppStore(platform), Some(c)) => {
        self.app_store(c.competitor_id, platform, data, processed).await?;
        Ok(None)
      }
    }
  }

  async fn resolve(&self, task_name: &str) -> Result<Option<Competitor>> {
    let Some(slug) = competitor_slug(task_name) else {
      return Ok(None);
    };
    self
      .store
      .find_competitor_by_slug(slug)
      .await
      .map_err(Error::store)
  }

  // ─── Tariffs ───────────────────────────────────────────────────────────────

  async fn driver_tariffs(&self, competitor: &Competitor, data: &[Record]) -> Result<u32> {
    if data.is_empty() {
      return Ok(0);
    }
    let batch: Vec<NewDriverTariff> = data
      .iter()
      .map(|r| DriverTariffRecord::from_record(r).into())
      .collect();
    let stored = self
      .store
      .replace_driver_tariffs(competitor.competitor_id, batch)
      .await
      .map_err(Error::store)?;
    debug!(competitor = %competitor.slug, count = stored.len(), "driver tariffs replaced");
    Ok(row_count(stored.len()))
  }

  async fn rider_tariffs(&self, competitor: &Competitor, data: &[Record]) -> Result<u32> {
    if data.is_empty() {
      return Ok(0);
    }
    let batch: Vec<NewRiderTariff> = data
      .iter()
      .map(|r| RiderTariffRecord::from_record(r).into())
      .collect();
    let stored = self
      .store
      .replace_rider_tariffs(competitor.competitor_id, batch)
      .await
      .map_err(Error::store)?;
    debug!(competitor = %competitor.slug, count = stored.len(), "rider tariffs replaced");
    Ok(row_count(stored.len()))
  }

  // ─── App stores ────────────────────────────────────────────────────────────

  /// Rows are counted as they are written so a failure midway still reports
  /// what was persisted.
  async fn app_store(
    &self,
    competitor_id: Uuid,
    platform: Platform,
    data: &[Record],
    processed: &mut u32,
  ) -> Result<()> {
    for record in data {
      let item = AppStoreRecord::from_record(record, &self.date_formats);
      if self.release(competitor_id, platform, &item).await? {
        *processed = processed.saturating_add(1);
      }
      for review in &item.reviews {
        if self.review(competitor_id, platform, review).await? {
          *processed = processed.saturating_add(1);
        }
      }
    }
    Ok(())
  }

  async fn release(
    &self,
    competitor_id: Uuid,
    platform: Platform,
    item: &AppStoreRecord,
  ) -> Result<bool> {
    let Some(version) = item.app_version.as_deref() else {
      return Ok(false);
    };
    if self
      .store
      .release_exists(competitor_id, platform, version)
      .await
      .map_err(Error::store)?
    {
      debug!(version, platform = platform.as_str(), "release already known");
      return Ok(false);
    }

    let notes = item.release_notes.as_deref().unwrap_or_default();
    let class = self.classifier.classify_release(notes).await;
    let inserted = self
      .store
      .insert_release(NewRelease {
        competitor_id,
        platform,
        version: version.to_owned(),
        release_date: item.release_date,
        release_notes: item.release_notes.clone(),
        rating: item.rating,
        rating_count: item.rating_count,
        significance: class.significance,
        categories: class.categories,
        summary: class.summary,
      })
      .await
      .map_err(Error::store)?;
    Ok(inserted.is_inserted())
  }

  async fn review(
    &self,
    competitor_id: Uuid,
    platform: Platform,
    review: &ReviewRecord,
  ) -> Result<bool> {
    let Some(source_id) = review.source_id.as_deref() else {
      debug!("review without id skipped");
      return Ok(false);
    };
    let external_id = review_external_id(platform, source_id);
    if self
      .store
      .review_exists(&external_id)
      .await
      .map_err(Error::store)?
    {
      return Ok(false);
    }

    let text = review.text.as_deref().unwrap_or_default();
    let class = self.classifier.classify_review(text, review.rating).await;
    let inserted = self
      .store
      .insert_review(NewReview {
        external_id,
        competitor_id,
        platform,
        author: review.author.clone(),
        rating: review.rating,
        text: review.text.clone(),
        review_date: review.review_date,
        app_version: review.app_version.clone(),
        role: class.role,
        sentiment: class.sentiment,
        categories: class.categories,
        key_topics: class.key_topics,
      })
      .await
      .map_err(Error::store)?;
    Ok(inserted.is_inserted())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use ridewatch_ai::RuleClassifier;
  use ridewatch_core::model::{
    DriverTariff, Insertion, NewCompetitor, NewNewsItem, NewsItem, Release,
    Review, RiderTariff, Sentiment, Significance, UserRole,
  };
  use ridewatch_store_sqlite::SqliteStore;
  use rust_decimal::Decimal;
  use serde_json::Value;

  use super::*;

  fn payload(task_name: &str, data: Value) -> WebhookPayload {
    let data_list: Vec<Record> = serde_json::from_value(data).unwrap();
    WebhookPayload {
      task_id: "t-1".into(),
      task_name: task_name.into(),
      data_count: data_list.len() as u64,
      data_list,
      ..WebhookPayload::default()
    }
  }

  async fn seeded<S: IntelStore>(store: &S, slug: &str) -> Competitor {
    store
      .add_competitor(NewCompetitor { slug: slug.into(), name: slug.into() })
      .await
      .unwrap()
  }

  fn processor<S: IntelStore>(store: Arc<S>) -> WebhookProcessor<S> {
    WebhookProcessor::new(store, Arc::new(RuleClassifier), IngestConfig::default())
  }

  async fn last_log<S: IntelStore>(store: &S) -> CollectionLog {
    store.list_collection_logs(1).await.unwrap().remove(0)
  }

  #[tokio::test]
  async fn driver_tariff_batch_becomes_latest() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let indriver = seeded(&*store, "indriver").await;
    let p = processor(store.clone());

    let first = p
      .process(payload("indriver-driver-pe", json!([{ "commission": "10%" }])))
      .await;
    assert_eq!(first.status, CollectionStatus::Success);

    let outcome = p
      .process(payload(
        "INDRIVER-driver-pe",
        json!([{ "commission": "25%", "signup_bonus": "S/200", "requirements": "SOAT|Licencia A-I" }]),
      ))
      .await;
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.status, CollectionStatus::Success);

    let latest = store.latest_driver_tariffs(indriver.competitor_id).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].commission_rate, Some(Decimal::from(25)));
    assert_eq!(latest[0].signup_bonus, Some(Decimal::from(200)));
    assert_eq!(
      latest[0].requirements,
      Some(vec!["SOAT".to_owned(), "Licencia A-I".to_owned()])
    );

    let log = last_log(&*store).await;
    assert_eq!(log.task_name, "INDRIVER-driver-pe");
    assert_eq!(log.source_type, SourceType::Website);
    assert_eq!(log.competitor_id, Some(indriver.competitor_id));
    assert_eq!(log.items_collected, 1);
    assert_eq!(log.raw_payload, json!({ "taskId": "t-1", "dataCount": 1 }));
    assert!(log.completed_at.is_some());
  }

  #[tokio::test]
  async fn every_row_of_a_driver_batch_is_latest() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let indriver = seeded(&*store, "indriver").await;
    let p = processor(store.clone());

    p.process(payload("indriver-driver-pe", json!([{ "commission": "18%" }])))
      .await;
    let outcome = p
      .process(payload(
        "indriver-driver-pe",
        json!([{ "commission": "25%" }, { "commission": "30%" }]),
      ))
      .await;
    assert_eq!(outcome.processed, 2);
    assert_eq!(outcome.status, CollectionStatus::Success);

    let latest = store.latest_driver_tariffs(indriver.competitor_id).await.unwrap();
    assert_eq!(latest.len(), 2);
    assert!(latest.iter().all(|t| t.is_latest));
    let mut rates: Vec<_> = latest.iter().filter_map(|t| t.commission_rate).collect();
    rates.sort();
    assert_eq!(rates, [Decimal::from(25), Decimal::from(30)]);
    assert_eq!(last_log(&*store).await.items_collected, 2);
  }

  #[test]
  fn row_count_saturates() {
    assert_eq!(row_count(2), 2);
    assert_eq!(row_count(usize::MAX), u32::MAX);
  }

  #[tokio::test]
  async fn rider_tariffs_default_service_type() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cabify = seeded(&*store, "cabify").await;
    let outcome = processor(store.clone())
      .process(payload(
        "cabify-rider-pe",
        json!([{ "base_fare": "4,50" }, { "service_type": "lite", "per_km_rate": 1.2 }]),
      ))
      .await;
    assert_eq!(outcome.processed, 2);

    let latest = store.latest_rider_tariffs(cabify.competitor_id).await.unwrap();
    let mut kinds: Vec<_> = latest.iter().map(|t| t.service_type.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, ["lite", "standard"]);
  }

  #[tokio::test]
  async fn app_store_batch_is_idempotent() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let uber = seeded(&*store, "uber").await;
    let p = processor(store.clone());
    let batch = json!([{
      "app_version": "5.2.1",
      "release_notes": "Nueva función de seguridad",
      "reviews": [
        { "review_id": "r1", "rating": 1, "text": "Me cobraron de más en el viaje" },
        { "id": "r2", "rating": "5", "text": "Buenas ganancias como conductor" },
        { "text": "sin id" }
      ]
    }]);

    let first = p.process(payload("appstore-uber", batch.clone())).await;
    assert_eq!(first.processed, 3);
    assert_eq!(first.status, CollectionStatus::Success);

    let again = p.process(payload("appstore-uber", batch)).await;
    assert_eq!(again.processed, 0);
    assert_eq!(again.status, CollectionStatus::Success);

    assert!(store.review_exists("ios_r1").await.unwrap());
    assert!(store.review_exists("ios_r2").await.unwrap());
    assert!(!store.review_exists("android_r1").await.unwrap());
    assert_eq!(last_log(&*store).await.source_type, SourceType::AppStore);

    // Classifications reach the stored rows.
    let releases = store.list_releases(uber.competitor_id, 10).await.unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].platform, Platform::Ios);
    assert_eq!(releases[0].significance, Significance::Major);
    assert_eq!(releases[0].categories, vec!["other".to_owned()]);

    let mut reviews = store.list_reviews(uber.competitor_id, 10).await.unwrap();
    reviews.sort_by(|a, b| a.external_id.cmp(&b.external_id));
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].external_id, "ios_r1");
    assert_eq!(reviews[0].rating, 1);
    assert_eq!(reviews[0].role, UserRole::Rider);
    assert_eq!(reviews[0].sentiment, Sentiment::Negative);
    assert_eq!(reviews[1].external_id, "ios_r2");
    assert_eq!(reviews[1].rating, 5);
    assert_eq!(reviews[1].role, UserRole::Driver);
    assert_eq!(reviews[1].sentiment, Sentiment::Positive);
  }

  #[tokio::test]
  async fn play_store_reviews_are_android_scoped() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    seeded(&*store, "didi").await;
    let outcome = processor(store.clone())
      .process(payload("playstore-didi", json!([{ "reviews": [{ "id": 9, "rating": 3 }] }])))
      .await;
    assert_eq!(outcome.processed, 1);
    assert!(store.review_exists("android_9").await.unwrap());
  }

  #[tokio::test]
  async fn unknown_task_is_partial() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let outcome = processor(store.clone())
      .process(payload("weekly-promos", json!([{ "x": 1 }])))
      .await;
    assert_eq!(outcome.status, CollectionStatus::Partial);
    assert_eq!(outcome.processed, 0);
    let log = last_log(&*store).await;
    assert_eq!(log.error_message.as_deref(), Some(UNKNOWN_TASK));
  }

  #[tokio::test]
  async fn unknown_competitor_is_partial() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let outcome = processor(store.clone())
      .process(payload("bolt-driver-pe", json!([{ "commission": "20%" }])))
      .await;
    assert_eq!(outcome.status, CollectionStatus::Partial);
    let log = last_log(&*store).await;
    assert_eq!(log.error_message.as_deref(), Some("Unknown competitor: bolt"));
    assert_eq!(log.competitor_id, None);
  }

  #[tokio::test]
  async fn empty_batch_succeeds_with_nothing() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    seeded(&*store, "yango").await;
    let outcome = processor(store.clone())
      .process(payload("yango-driver-pe", json!([])))
      .await;
    assert_eq!(outcome.status, CollectionStatus::Success);
    assert_eq!(outcome.processed, 0);
  }

  // ─── Failure path ──────────────────────────────────────────────────────────

  /// Delegates to SQLite but fails every review insert after the first.
  struct FlakyStore {
    inner:   SqliteStore,
    reviews: AtomicUsize,
  }

  type StoreResult<T> = std::result::Result<T, ridewatch_store_sqlite::Error>;

  impl IntelStore for FlakyStore {
    type Error = ridewatch_store_sqlite::Error;

    async fn add_competitor(&self, input: NewCompetitor) -> StoreResult<Competitor> {
      self.inner.add_competitor(input).await
    }

    async fn find_competitor_by_slug(&self, slug: &str) -> StoreResult<Option<Competitor>> {
      self.inner.find_competitor_by_slug(slug).await
    }

    async fn list_competitors(&self) -> StoreResult<Vec<Competitor>> {
      self.inner.list_competitors().await
    }

    async fn replace_driver_tariffs(
      &self,
      competitor_id: Uuid,
      batch: Vec<NewDriverTariff>,
    ) -> StoreResult<Vec<DriverTariff>> {
      self.inner.replace_driver_tariffs(competitor_id, batch).await
    }

    async fn replace_rider_tariffs(
      &self,
      competitor_id: Uuid,
      batch: Vec<NewRiderTariff>,
    ) -> StoreResult<Vec<RiderTariff>> {
      self.inner.replace_rider_tariffs(competitor_id, batch).await
    }

    async fn latest_driver_tariffs(&self, competitor_id: Uuid) -> StoreResult<Vec<DriverTariff>> {
      self.inner.latest_driver_tariffs(competitor_id).await
    }

    async fn latest_rider_tariffs(&self, competitor_id: Uuid) -> StoreResult<Vec<RiderTariff>> {
      self.inner.latest_rider_tariffs(competitor_id).await
    }

    async fn release_exists(
      &self,
      competitor_id: Uuid,
      platform: Platform,
      version: &str,
    ) -> StoreResult<bool> {
      self.inner.release_exists(competitor_id, platform, version).await
    }

    async fn insert_release(&self, input: NewRelease) -> StoreResult<Insertion<Release>> {
      self.inner.insert_release(input).await
    }

    async fn list_releases(&self, competitor_id: Uuid, limit: usize) -> StoreResult<Vec<Release>> {
      self.inner.list_releases(competitor_id, limit).await
    }

    async fn review_exists(&self, external_id: &str) -> StoreResult<bool> {
      self.inner.review_exists(external_id).await
    }

    async fn insert_review(&self, input: NewReview) -> StoreResult<Insertion<Review>> {
      if self.reviews.fetch_add(1, Ordering::SeqCst) >= 1 {
        return Err(ridewatch_store_sqlite::Error::OutOfRange("injected failure"));
      }
      self.inner.insert_review(input).await
    }

    async fn list_reviews(&self, competitor_id: Uuid, limit: usize) -> StoreResult<Vec<Review>> {
      self.inner.list_reviews(competitor_id, limit).await
    }

    async fn news_item_exists(&self, unique_id: &str) -> StoreResult<bool> {
      self.inner.news_item_exists(unique_id).await
    }

    async fn insert_news_item(&self, input: NewNewsItem) -> StoreResult<Insertion<NewsItem>> {
      self.inner.insert_news_item(input).await
    }

    async fn list_news_items(&self, limit: usize) -> StoreResult<Vec<NewsItem>> {
      self.inner.list_news_items(limit).await
    }

    async fn record_collection_log(&self, log: CollectionLog) -> StoreResult<()> {
      self.inner.record_collection_log(log).await
    }

    async fn list_collection_logs(&self, limit: usize) -> StoreResult<Vec<CollectionLog>> {
      self.inner.list_collection_logs(limit).await
    }
  }

  #[tokio::test]
  async fn store_failure_is_recorded_with_partial_count() {
    let store = Arc::new(FlakyStore {
      inner:   SqliteStore::open_in_memory().await.unwrap(),
      reviews: AtomicUsize::new(0),
    });
    seeded(&*store, "uber").await;

    let outcome = processor(store.clone())
      .process(payload(
        "appstore-uber",
        json!([{ "reviews": [
          { "id": "a", "rating": 5 },
          { "id": "b", "rating": 4 },
          { "id": "c", "rating": 3 }
        ] }]),
      ))
      .await;

    assert_eq!(outcome.status, CollectionStatus::Failed);
    assert_eq!(outcome.processed, 1);
    let log = last_log(&*store).await;
    assert_eq!(log.status, CollectionStatus::Failed);
    assert_eq!(log.items_collected, 1);
    assert!(log.error_message.unwrap().contains("injected failure"));
    // Rows written before the failure stay.
    assert!(store.review_exists("ios_a").await.unwrap());
  }
}
