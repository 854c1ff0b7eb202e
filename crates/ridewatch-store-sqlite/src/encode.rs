//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that lexical order
//! matches chronological order. Calendar dates are `YYYY-MM-DD`. Decimals are
//! stored as their canonical string to avoid float rounding. String lists are
//! compact JSON arrays. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use ridewatch_core::model::{
  CollectionLog, Competitor, DriverTariff, NewsItem, Release, Review,
  RiderTariff,
};
use rust_decimal::Decimal;
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn encode_decimal(d: Option<Decimal>) -> Option<String> {
  d.map(|d| d.normalize().to_string())
}

fn decode_decimal(s: Option<String>) -> Result<Option<Decimal>> {
  Ok(s.as_deref().map(str::parse::<Decimal>).transpose()?)
}

fn encode_list(list: &[String]) -> Result<String> {
  Ok(serde_json::to_string(list)?)
}

fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

fn encode_opt_list(list: Option<&Vec<String>>) -> Result<Option<String>> {
  list.map(|l| encode_list(l)).transpose()
}

fn decode_opt_list(s: Option<String>) -> Result<Option<Vec<String>>> {
  s.as_deref().map(decode_list).transpose()
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` struct mirrors one table row as SQLite-native values. `encode`
// prepares a row for insertion on the database thread; `decode` turns a
// selected row back into the domain type.

pub struct RawCompetitor {
  pub competitor_id: String,
  pub slug:          String,
  pub name:          String,
  pub is_active:     bool,
  pub created_at:    String,
}

impl RawCompetitor {
  pub const COLUMNS: &str = "competitor_id, slug, name, is_active, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      competitor_id: row.get(0)?,
      slug:          row.get(1)?,
      name:          row.get(2)?,
      is_active:     row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn encode(c: &Competitor) -> Self {
    Self {
      competitor_id: encode_uuid(c.competitor_id),
      slug:          c.slug.clone(),
      name:          c.name.clone(),
      is_active:     c.is_active,
      created_at:    encode_dt(c.created_at),
    }
  }

  pub fn decode(self) -> Result<Competitor> {
    Ok(Competitor {
      competitor_id: decode_uuid(&self.competitor_id)?,
      slug:          self.slug,
      name:          self.name,
      is_active:     self.is_active,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawDriverTariff {
  pub tariff_id:       String,
  pub competitor_id:   String,
  pub commission_rate: Option<String>,
  pub min_fare:        Option<String>,
  pub signup_bonus:    Option<String>,
  pub referral_bonus:  Option<String>,
  pub requirements:    Option<String>,
  pub benefits:        Option<String>,
  pub currency:        String,
  pub source_url:      Option<String>,
  pub is_latest:       bool,
  pub collected_at:    String,
}

impl RawDriverTariff {
  pub const COLUMNS: &str = "tariff_id, competitor_id, commission_rate, \
                             min_fare, signup_bonus, referral_bonus, \
                             requirements, benefits, currency, source_url, \
                             is_latest, collected_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tariff_id:       row.get(0)?,
      competitor_id:   row.get(1)?,
      commission_rate: row.get(2)?,
      min_fare:        row.get(3)?,
      signup_bonus:    row.get(4)?,
      referral_bonus:  row.get(5)?,
      requirements:    row.get(6)?,
      benefits:        row.get(7)?,
      currency:        row.get(8)?,
      source_url:      row.get(9)?,
      is_latest:       row.get(10)?,
      collected_at:    row.get(11)?,
    })
  }

  pub fn encode(t: &DriverTariff) -> Result<Self> {
    Ok(Self {
      tariff_id:       encode_uuid(t.tariff_id),
      competitor_id:   encode_uuid(t.competitor_id),
      commission_rate: encode_decimal(t.commission_rate),
      min_fare:        encode_decimal(t.min_fare),
      signup_bonus:    encode_decimal(t.signup_bonus),
      referral_bonus:  encode_decimal(t.referral_bonus),
      requirements:    encode_opt_list(t.requirements.as_ref())?,
      benefits:        encode_opt_list(t.benefits.as_ref())?,
      currency:        t.currency.clone(),
      source_url:      t.source_url.clone(),
      is_latest:       t.is_latest,
      collected_at:    encode_dt(t.collected_at),
    })
  }

  pub fn decode(self) -> Result<DriverTariff> {
    Ok(DriverTariff {
      tariff_id:       decode_uuid(&self.tariff_id)?,
      competitor_id:   decode_uuid(&self.competitor_id)?,
      commission_rate: decode_decimal(self.commission_rate)?,
      min_fare:        decode_decimal(self.min_fare)?,
      signup_bonus:    decode_decimal(self.signup_bonus)?,
      referral_bonus:  decode_decimal(self.referral_bonus)?,
      requirements:    decode_opt_list(self.requirements)?,
      benefits:        decode_opt_list(self.benefits)?,
      currency:        self.currency,
      source_url:      self.source_url,
      is_latest:       self.is_latest,
      collected_at:    decode_dt(&self.collected_at)?,
    })
  }
}

pub struct RawRiderTariff {
  pub tariff_id:     String,
  pub competitor_id: String,
  pub service_type:  String,
  pub base_fare:     Option<String>,
  pub per_km_rate:   Option<String>,
  pub per_min_rate:  Option<String>,
  pub booking_fee:   Option<String>,
  pub currency:      String,
  pub source_url:    Option<String>,
  pub is_latest:     bool,
  pub collected_at:  String,
}

impl RawRiderTariff {
  pub const COLUMNS: &str = "tariff_id, competitor_id, service_type, \
                             base_fare, per_km_rate, per_min_rate, \
                             booking_fee, currency, source_url, is_latest, \
                             collected_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tariff_id:     row.get(0)?,
      competitor_id: row.get(1)?,
      service_type:  row.get(2)?,
      base_fare:     row.get(3)?,
      per_km_rate:   row.get(4)?,
      per_min_rate:  row.get(5)?,
      booking_fee:   row.get(6)?,
      currency:      row.get(7)?,
      source_url:    row.get(8)?,
      is_latest:     row.get(9)?,
      collected_at:  row.get(10)?,
    })
  }

  pub fn encode(t: &RiderTariff) -> Self {
    Self {
      tariff_id:     encode_uuid(t.tariff_id),
      competitor_id: encode_uuid(t.competitor_id),
      service_type:  t.service_type.clone(),
      base_fare:     encode_decimal(t.base_fare),
      per_km_rate:   encode_decimal(t.per_km_rate),
      per_min_rate:  encode_decimal(t.per_min_rate),
      booking_fee:   encode_decimal(t.booking_fee),
      currency:      t.currency.clone(),
      source_url:    t.source_url.clone(),
      is_latest:     t.is_latest,
      collected_at:  encode_dt(t.collected_at),
    }
  }

  pub fn decode(self) -> Result<RiderTariff> {
    Ok(RiderTariff {
      tariff_id:     decode_uuid(&self.tariff_id)?,
      competitor_id: decode_uuid(&self.competitor_id)?,
      service_type:  self.service_type,
      base_fare:     decode_decimal(self.base_fare)?,
      per_km_rate:   decode_decimal(self.per_km_rate)?,
      per_min_rate:  decode_decimal(self.per_min_rate)?,
      booking_fee:   decode_decimal(self.booking_fee)?,
      currency:      self.currency,
      source_url:    self.source_url,
      is_latest:     self.is_latest,
      collected_at:  decode_dt(&self.collected_at)?,
    })
  }
}

pub struct RawRelease {
  pub release_id:    String,
  pub competitor_id: String,
  pub platform:      String,
  pub version:       String,
  pub release_date:  Option<String>,
  pub release_notes: Option<String>,
  pub rating:        Option<String>,
  pub rating_count:  Option<i64>,
  pub significance:  String,
  pub categories:    String,
  pub summary:       Option<String>,
  pub collected_at:  String,
}

impl RawRelease {
  pub const COLUMNS: &str = "release_id, competitor_id, platform, version, \
                             release_date, release_notes, rating, \
                             rating_count, significance, categories, summary, \
                             collected_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      release_id:    row.get(0)?,
      competitor_id: row.get(1)?,
      platform:      row.get(2)?,
      version:       row.get(3)?,
      release_date:  row.get(4)?,
      release_notes: row.get(5)?,
      rating:        row.get(6)?,
      rating_count:  row.get(7)?,
      significance:  row.get(8)?,
      categories:    row.get(9)?,
      summary:       row.get(10)?,
      collected_at:  row.get(11)?,
    })
  }

  pub fn encode(r: &Release) -> Result<Self> {
    Ok(Self {
      release_id:    encode_uuid(r.release_id),
      competitor_id: encode_uuid(r.competitor_id),
      platform:      r.platform.as_str().to_owned(),
      version:       r.version.clone(),
      release_date:  r.release_date.map(encode_date),
      release_notes: r.release_notes.clone(),
      rating:        encode_decimal(r.rating),
      rating_count:  r.rating_count,
      significance:  r.significance.as_str().to_owned(),
      categories:    encode_list(&r.categories)?,
      summary:       r.summary.clone(),
      collected_at:  encode_dt(r.collected_at),
    })
  }

  pub fn decode(self) -> Result<Release> {
    Ok(Release {
      release_id:    decode_uuid(&self.release_id)?,
      competitor_id: decode_uuid(&self.competitor_id)?,
      platform:      self.platform.parse()?,
      version:       self.version,
      release_date:  decode_opt_date(self.release_date)?,
      release_notes: self.release_notes,
      rating:        decode_decimal(self.rating)?,
      rating_count:  self.rating_count,
      significance:  self.significance.parse()?,
      categories:    decode_list(&self.categories)?,
      summary:       self.summary,
      collected_at:  decode_dt(&self.collected_at)?,
    })
  }
}

pub struct RawReview {
  pub review_id:     String,
  pub external_id:   String,
  pub competitor_id: String,
  pub platform:      String,
  pub author:        Option<String>,
  pub rating:        i64,
  pub text:          Option<String>,
  pub review_date:   Option<String>,
  pub app_version:   Option<String>,
  pub role:          String,
  pub sentiment:     String,
  pub categories:    String,
  pub key_topics:    String,
  pub collected_at:  String,
}

impl RawReview {
  pub const COLUMNS: &str = "review_id, external_id, competitor_id, \
                             platform, author, rating, text, review_date, \
                             app_version, role, sentiment, categories, \
                             key_topics, collected_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:     row.get(0)?,
      external_id:   row.get(1)?,
      competitor_id: row.get(2)?,
      platform:      row.get(3)?,
      author:        row.get(4)?,
      rating:        row.get(5)?,
      text:          row.get(6)?,
      review_date:   row.get(7)?,
      app_version:   row.get(8)?,
      role:          row.get(9)?,
      sentiment:     row.get(10)?,
      categories:    row.get(11)?,
      key_topics:    row.get(12)?,
      collected_at:  row.get(13)?,
    })
  }

  pub fn encode(r: &Review) -> Result<Self> {
    Ok(Self {
      review_id:     encode_uuid(r.review_id),
      external_id:   r.external_id.clone(),
      competitor_id: encode_uuid(r.competitor_id),
      platform:      r.platform.as_str().to_owned(),
      author:        r.author.clone(),
      rating:        i64::from(r.rating),
      text:          r.text.clone(),
      review_date:   r.review_date.map(encode_date),
      app_version:   r.app_version.clone(),
      role:          r.role.as_str().to_owned(),
      sentiment:     r.sentiment.as_str().to_owned(),
      categories:    encode_list(&r.categories)?,
      key_topics:    encode_list(&r.key_topics)?,
      collected_at:  encode_dt(r.collected_at),
    })
  }

  pub fn decode(self) -> Result<Review> {
    Ok(Review {
      review_id:     decode_uuid(&self.review_id)?,
      external_id:   self.external_id,
      competitor_id: decode_uuid(&self.competitor_id)?,
      platform:      self.platform.parse()?,
      author:        self.author,
      rating:        u8::try_from(self.rating)
        .map_err(|_| Error::OutOfRange("reviews.rating"))?,
      text:          self.text,
      review_date:   decode_opt_date(self.review_date)?,
      app_version:   self.app_version,
      role:          self.role.parse()?,
      sentiment:     self.sentiment.parse()?,
      categories:    decode_list(&self.categories)?,
      key_topics:    decode_list(&self.key_topics)?,
      collected_at:  decode_dt(&self.collected_at)?,
    })
  }
}

pub struct RawNewsItem {
  pub news_id:               String,
  pub unique_id:             String,
  pub search_query:          String,
  pub title:                 String,
  pub summary:               Option<String>,
  pub source_url:            String,
  pub source_name:           Option<String>,
  pub provider:              String,
  pub published_date:        Option<String>,
  pub competitors_mentioned: String,
  pub topics:                String,
  pub category:              String,
  pub sentiment:             String,
  pub relevance_score:       f64,
  pub is_relevant:           bool,
  pub collected_at:          String,
}

impl RawNewsItem {
  pub const COLUMNS: &str = "news_id, unique_id, search_query, title, \
                             summary, source_url, source_name, provider, \
                             published_date, competitors_mentioned, topics, \
                             category, sentiment, relevance_score, \
                             is_relevant, collected_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      news_id:               row.get(0)?,
      unique_id:             row.get(1)?,
      search_query:          row.get(2)?,
      title:                 row.get(3)?,
      summary:               row.get(4)?,
      source_url:            row.get(5)?,
      source_name:           row.get(6)?,
      provider:              row.get(7)?,
      published_date:        row.get(8)?,
      competitors_mentioned: row.get(9)?,
      topics:                row.get(10)?,
      category:              row.get(11)?,
      sentiment:             row.get(12)?,
      relevance_score:       row.get(13)?,
      is_relevant:           row.get(14)?,
      collected_at:          row.get(15)?,
    })
  }

  pub fn encode(n: &NewsItem) -> Result<Self> {
    Ok(Self {
      news_id:               encode_uuid(n.news_id),
      unique_id:             n.unique_id.clone(),
      search_query:          n.search_query.clone(),
      title:                 n.title.clone(),
      summary:               n.summary.clone(),
      source_url:            n.source_url.clone(),
      source_name:           n.source_name.clone(),
      provider:              n.provider.clone(),
      published_date:        n.published_date.map(encode_date),
      competitors_mentioned: encode_list(&n.competitors_mentioned)?,
      topics:                encode_list(&n.topics)?,
      category:              n.category.clone(),
      sentiment:             n.sentiment.as_str().to_owned(),
      relevance_score:       n.relevance_score,
      is_relevant:           n.is_relevant,
      collected_at:          encode_dt(n.collected_at),
    })
  }

  pub fn decode(self) -> Result<NewsItem> {
    Ok(NewsItem {
      news_id:               decode_uuid(&self.news_id)?,
      unique_id:             self.unique_id,
      search_query:          self.search_query,
      title:                 self.title,
      summary:               self.summary,
      source_url:            self.source_url,
      source_name:           self.source_name,
      provider:              self.provider,
      published_date:        decode_opt_date(self.published_date)?,
      competitors_mentioned: decode_list(&self.competitors_mentioned)?,
      topics:                decode_list(&self.topics)?,
      category:              self.category,
      sentiment:             self.sentiment.parse()?,
      relevance_score:       self.relevance_score,
      is_relevant:           self.is_relevant,
      collected_at:          decode_dt(&self.collected_at)?,
    })
  }
}

pub struct RawCollectionLog {
  pub log_id:          String,
  pub task_name:       String,
  pub source_type:     String,
  pub competitor_id:   Option<String>,
  pub status:          String,
  pub error_message:   Option<String>,
  pub items_collected: i64,
  pub raw_payload:     String,
  pub started_at:      String,
  pub completed_at:    Option<String>,
}

impl RawCollectionLog {
  pub const COLUMNS: &str = "log_id, task_name, source_type, competitor_id, \
                             status, error_message, items_collected, \
                             raw_payload, started_at, completed_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      log_id:          row.get(0)?,
      task_name:       row.get(1)?,
      source_type:     row.get(2)?,
      competitor_id:   row.get(3)?,
      status:          row.get(4)?,
      error_message:   row.get(5)?,
      items_collected: row.get(6)?,
      raw_payload:     row.get(7)?,
      started_at:      row.get(8)?,
      completed_at:    row.get(9)?,
    })
  }

  pub fn encode(l: &CollectionLog) -> Result<Self> {
    Ok(Self {
      log_id:          encode_uuid(l.log_id),
      task_name:       l.task_name.clone(),
      source_type:     l.source_type.as_str().to_owned(),
      competitor_id:   l.competitor_id.map(encode_uuid),
      status:          l.status.as_str().to_owned(),
      error_message:   l.error_message.clone(),
      items_collected: i64::from(l.items_collected),
      raw_payload:     serde_json::to_string(&l.raw_payload)?,
      started_at:      encode_dt(l.started_at),
      completed_at:    l.completed_at.map(encode_dt),
    })
  }

  pub fn decode(self) -> Result<CollectionLog> {
    Ok(CollectionLog {
      log_id:          decode_uuid(&self.log_id)?,
      task_name:       self.task_name,
      source_type:     self.source_type.parse()?,
      competitor_id:   self.competitor_id.as_deref().map(decode_uuid).transpose()?,
      status:          self.status.parse()?,
      error_message:   self.error_message,
      items_collected: u32::try_from(self.items_collected)
        .map_err(|_| Error::OutOfRange("collection_logs.items_collected"))?,
      raw_payload:     serde_json::from_str(&self.raw_payload)?,
      started_at:      decode_dt(&self.started_at)?,
      completed_at:    self.completed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = DateTime::parse_from_rfc3339("2024-05-01T09:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let late = DateTime::parse_from_rfc3339("2024-05-01T09:00:00.5Z")
      .unwrap()
      .with_timezone(&Utc);
    assert!(encode_dt(early) < encode_dt(late));
    assert_eq!(decode_dt(&encode_dt(late)).unwrap(), late);
  }

  #[test]
  fn decimals_keep_exact_value() {
    let d: Decimal = "25.50".parse().unwrap();
    let stored = encode_decimal(Some(d));
    assert_eq!(stored.as_deref(), Some("25.5"));
    assert_eq!(decode_decimal(stored).unwrap(), Some(d));
  }

  #[test]
  fn bad_date_is_an_error() {
    assert!(matches!(decode_date("15/03/2024"), Err(Error::DateParse(_))));
  }
}
