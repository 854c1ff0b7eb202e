//! [`SqliteStore`] — the SQLite implementation of [`IntelStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension as _, ffi};
use uuid::Uuid;

use ridewatch_core::{
  model::{
    CollectionLog, Competitor, DriverTariff, Insertion, NewCompetitor,
    NewDriverTariff, NewNewsItem, NewRelease, NewReview, NewRiderTariff,
    NewsItem, Platform, Release, Review, RiderTariff,
  },
  store::IntelStore,
};

use crate::{
  Error, Result,
  encode::{
    RawCollectionLog, RawCompetitor, RawDriverTariff, RawNewsItem, RawRelease,
    RawReview, RawRiderTariff, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ridewatch store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Whether `err` is a `UNIQUE` / `PRIMARY KEY` violation.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if e.code == ErrorCode::ConstraintViolation
        && (e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
          || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
  )
}

/// Run an insert, mapping a natural-key collision to `Ok(false)`.
fn insert_unique(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<bool> {
  match conn.execute(sql, params) {
    Ok(_) => Ok(true),
    Err(e) if is_unique_violation(&e) => Ok(false),
    Err(e) => Err(e),
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert `competitor` unless its slug is taken, in which case the stored
  /// competitor is returned unchanged.
  pub async fn ensure_competitor(&self, input: NewCompetitor) -> Result<Competitor> {
    if let Some(existing) = self.find_competitor_by_slug(&input.slug).await? {
      return Ok(existing);
    }
    match self.add_competitor(input).await {
      Err(Error::DuplicateSlug(slug)) => self
        .find_competitor_by_slug(&slug)
        .await?
        .ok_or(Error::DuplicateSlug(slug)),
      other => other,
    }
  }

  async fn exists(&self, sql: &'static str, key: Vec<String>) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params_from_iter(key), |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }
}

// ─── IntelStore impl ─────────────────────────────────────────────────────────

impl IntelStore for SqliteStore {
  type Error = Error;

  // ── Competitors ───────────────────────────────────────────────────────────

  async fn add_competitor(&self, input: NewCompetitor) -> Result<Competitor> {
    let competitor = Competitor {
      competitor_id: Uuid::new_v4(),
      slug:          input.slug,
      name:          input.name,
      is_active:     true,
      created_at:    Utc::now(),
    };
    let raw = RawCompetitor::encode(&competitor);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          "INSERT INTO competitors (competitor_id, slug, name, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            raw.competitor_id,
            raw.slug,
            raw.name,
            raw.is_active,
            raw.created_at,
          ],
        )?)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateSlug(competitor.slug));
    }
    Ok(competitor)
  }

  async fn find_competitor_by_slug(&self, slug: &str) -> Result<Option<Competitor>> {
    let slug = slug.to_owned();

    let raw: Option<RawCompetitor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM competitors WHERE slug = ?1",
                RawCompetitor::COLUMNS
              ),
              rusqlite::params![slug],
              RawCompetitor::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCompetitor::decode).transpose()
  }

  async fn list_competitors(&self) -> Result<Vec<Competitor>> {
    let raws: Vec<RawCompetitor> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM competitors ORDER BY slug",
          RawCompetitor::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map([], RawCompetitor::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawCompetitor::decode).collect()
  }

  // ── Tariffs ───────────────────────────────────────────────────────────────

  async fn replace_driver_tariffs(
    &self,
    competitor_id: Uuid,
    batch: Vec<NewDriverTariff>,
  ) -> Result<Vec<DriverTariff>> {
    let now = Utc::now();
    let tariffs: Vec<DriverTariff> = batch
      .into_iter()
      .map(|t| DriverTariff {
        tariff_id: Uuid::new_v4(),
        competitor_id,
        commission_rate: t.commission_rate,
        min_fare: t.min_fare,
        signup_bonus: t.signup_bonus,
        referral_bonus: t.referral_bonus,
        requirements: t.requirements,
        benefits: t.benefits,
        currency: t.currency,
        source_url: t.source_url,
        is_latest: true,
        collected_at: now,
      })
      .collect();

    let raws = tariffs
      .iter()
      .map(RawDriverTariff::encode)
      .collect::<Result<Vec<_>>>()?;
    let cid = encode_uuid(competitor_id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE driver_tariffs SET is_latest = 0
           WHERE competitor_id = ?1 AND is_latest = 1",
          rusqlite::params![cid],
        )?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO driver_tariffs ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            RawDriverTariff::COLUMNS
          ))?;
          for r in &raws {
            stmt.execute(rusqlite::params![
              r.tariff_id,
              r.competitor_id,
              r.commission_rate,
              r.min_fare,
              r.signup_bonus,
              r.referral_bonus,
              r.requirements,
              r.benefits,
              r.currency,
              r.source_url,
              r.is_latest,
              r.collected_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(tariffs)
  }

  async fn replace_rider_tariffs(
    &self,
    competitor_id: Uuid,
    batch: Vec<NewRiderTariff>,
  ) -> Result<Vec<RiderTariff>> {
    let now = Utc::now();
    let tariffs: Vec<RiderTariff> = batch
      .into_iter()
      .map(|t| RiderTariff {
        tariff_id: Uuid::new_v4(),
        competitor_id,
        service_type: t.service_type,
        base_fare: t.base_fare,
        per_km_rate: t.per_km_rate,
        per_min_rate: t.per_min_rate,
        booking_fee: t.booking_fee,
        currency: t.currency,
        source_url: t.source_url,
        is_latest: true,
        collected_at: now,
      })
      .collect();

    let raws: Vec<RawRiderTariff> =
      tariffs.iter().map(RawRiderTariff::encode).collect();
    let cid = encode_uuid(competitor_id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE rider_tariffs SET is_latest = 0
           WHERE competitor_id = ?1 AND is_latest = 1",
          rusqlite::params![cid],
        )?;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT INTO rider_tariffs ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            RawRiderTariff::COLUMNS
          ))?;
          for r in &raws {
            stmt.execute(rusqlite::params![
              r.tariff_id,
              r.competitor_id,
              r.service_type,
              r.base_fare,
              r.per_km_rate,
              r.per_min_rate,
              r.booking_fee,
              r.currency,
              r.source_url,
              r.is_latest,
              r.collected_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(tariffs)
  }

  async fn latest_driver_tariffs(
    &self,
    competitor_id: Uuid,
  ) -> Result<Vec<DriverTariff>> {
    let cid = encode_uuid(competitor_id);

    let raws: Vec<RawDriverTariff> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM driver_tariffs
           WHERE competitor_id = ?1 AND is_latest = 1
           ORDER BY collected_at, rowid",
          RawDriverTariff::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map(rusqlite::params![cid], RawDriverTariff::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawDriverTariff::decode).collect()
  }

  async fn latest_rider_tariffs(
    &self,
    competitor_id: Uuid,
  ) -> Result<Vec<RiderTariff>> {
    let cid = encode_uuid(competitor_id);

    let raws: Vec<RawRiderTariff> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM rider_tariffs
           WHERE competitor_id = ?1 AND is_latest = 1
           ORDER BY collected_at, rowid",
          RawRiderTariff::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map(rusqlite::params![cid], RawRiderTariff::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawRiderTariff::decode).collect()
  }

  // ── Releases ──────────────────────────────────────────────────────────────

  async fn release_exists(
    &self,
    competitor_id: Uuid,
    platform: Platform,
    version: &str,
  ) -> Result<bool> {
    self
      .exists(
        "SELECT 1 FROM releases
         WHERE competitor_id = ?1 AND platform = ?2 AND version = ?3",
        vec![
          encode_uuid(competitor_id),
          platform.as_str().to_owned(),
          version.to_owned(),
        ],
      )
      .await
  }

  async fn insert_release(&self, input: NewRelease) -> Result<Insertion<Release>> {
    let release = Release {
      release_id:    Uuid::new_v4(),
      competitor_id: input.competitor_id,
      platform:      input.platform,
      version:       input.version,
      release_date:  input.release_date,
      release_notes: input.release_notes,
      rating:        input.rating,
      rating_count:  input.rating_count,
      significance:  input.significance,
      categories:    input.categories,
      summary:       input.summary,
      collected_at:  Utc::now(),
    };
    let r = RawRelease::encode(&release)?;

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          &format!(
            "INSERT INTO releases ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            RawRelease::COLUMNS
          ),
          rusqlite::params![
            r.release_id,
            r.competitor_id,
            r.platform,
            r.version,
            r.release_date,
            r.release_notes,
            r.rating,
            r.rating_count,
            r.significance,
            r.categories,
            r.summary,
            r.collected_at,
          ],
        )?)
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(release) } else { Insertion::Duplicate })
  }

  async fn list_releases(&self, competitor_id: Uuid, limit: usize) -> Result<Vec<Release>> {
    let cid = encode_uuid(competitor_id);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawRelease> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM releases WHERE competitor_id = ?1
           ORDER BY release_date IS NULL, release_date DESC, collected_at DESC, rowid DESC
           LIMIT ?2",
          RawRelease::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map(rusqlite::params![cid, limit], RawRelease::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawRelease::decode).collect()
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn review_exists(&self, external_id: &str) -> Result<bool> {
    self
      .exists("SELECT 1 FROM reviews WHERE external_id = ?1", vec![
        external_id.to_owned(),
      ])
      .await
  }

  async fn insert_review(&self, input: NewReview) -> Result<Insertion<Review>> {
    let review = Review {
      review_id:     Uuid::new_v4(),
      external_id:   input.external_id,
      competitor_id: input.competitor_id,
      platform:      input.platform,
      author:        input.author,
      rating:        input.rating,
      text:          input.text,
      review_date:   input.review_date,
      app_version:   input.app_version,
      role:          input.role,
      sentiment:     input.sentiment,
      categories:    input.categories,
      key_topics:    input.key_topics,
      collected_at:  Utc::now(),
    };
    let r = RawReview::encode(&review)?;

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          &format!(
            "INSERT INTO reviews ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            RawReview::COLUMNS
          ),
          rusqlite::params![
            r.review_id,
            r.external_id,
            r.competitor_id,
            r.platform,
            r.author,
            r.rating,
            r.text,
            r.review_date,
            r.app_version,
            r.role,
            r.sentiment,
            r.categories,
            r.key_topics,
            r.collected_at,
          ],
        )?)
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(review) } else { Insertion::Duplicate })
  }

  async fn list_reviews(&self, competitor_id: Uuid, limit: usize) -> Result<Vec<Review>> {
    let cid = encode_uuid(competitor_id);
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM reviews WHERE competitor_id = ?1
           ORDER BY review_date IS NULL, review_date DESC, collected_at DESC, rowid DESC
           LIMIT ?2",
          RawReview::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map(rusqlite::params![cid, limit], RawReview::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawReview::decode).collect()
  }

  // ── News ──────────────────────────────────────────────────────────────────

  async fn news_item_exists(&self, unique_id: &str) -> Result<bool> {
    self
      .exists("SELECT 1 FROM news_items WHERE unique_id = ?1", vec![
        unique_id.to_owned(),
      ])
      .await
  }

  async fn insert_news_item(
    &self,
    input: NewNewsItem,
  ) -> Result<Insertion<NewsItem>> {
    let item = NewsItem {
      news_id:               Uuid::new_v4(),
      unique_id:             input.unique_id,
      search_query:          input.search_query,
      title:                 input.title,
      summary:               input.summary,
      source_url:            input.source_url,
      source_name:           input.source_name,
      provider:              input.provider,
      published_date:        input.published_date,
      competitors_mentioned: input.competitors_mentioned,
      topics:                input.topics,
      category:              input.category,
      sentiment:             input.sentiment,
      relevance_score:       input.relevance_score,
      is_relevant:           true,
      collected_at:          Utc::now(),
    };
    let r = RawNewsItem::encode(&item)?;

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_unique(
          conn,
          &format!(
            "INSERT INTO news_items ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            RawNewsItem::COLUMNS
          ),
          rusqlite::params![
            r.news_id,
            r.unique_id,
            r.search_query,
            r.title,
            r.summary,
            r.source_url,
            r.source_name,
            r.provider,
            r.published_date,
            r.competitors_mentioned,
            r.topics,
            r.category,
            r.sentiment,
            r.relevance_score,
            r.is_relevant,
            r.collected_at,
          ],
        )?)
      })
      .await?;

    Ok(if inserted { Insertion::Inserted(item) } else { Insertion::Duplicate })
  }

  async fn list_news_items(&self, limit: usize) -> Result<Vec<NewsItem>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawNewsItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM news_items ORDER BY collected_at DESC, rowid DESC LIMIT ?1",
          RawNewsItem::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map(rusqlite::params![limit], RawNewsItem::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawNewsItem::decode).collect()
  }

  // ── Collection logs ───────────────────────────────────────────────────────

  async fn record_collection_log(&self, log: CollectionLog) -> Result<()> {
    let r = RawCollectionLog::encode(&log)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO collection_logs ({}) VALUES
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            RawCollectionLog::COLUMNS
          ),
          rusqlite::params![
            r.log_id,
            r.task_name,
            r.source_type,
            r.competitor_id,
            r.status,
            r.error_message,
            r.items_collected,
            r.raw_payload,
            r.started_at,
            r.completed_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_collection_logs(&self, limit: usize) -> Result<Vec<CollectionLog>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawCollectionLog> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM collection_logs ORDER BY started_at DESC, rowid DESC LIMIT ?1",
          RawCollectionLog::COLUMNS
        ))?;
        Ok(
          stmt
            .query_map(rusqlite::params![limit], RawCollectionLog::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        )
      })
      .await?;

    raws.into_iter().map(RawCollectionLog::decode).collect()
  }
}
