//! Typed views of webhook records.
//!
//! Each struct is built from one `dataList` entry with the lenient parsers in
//! [`ridewatch_core::parse`]; a field that cannot be read is `None`.

use chrono::NaiveDate;
use ridewatch_core::{
  model::{NewDriverTariff, NewRiderTariff},
  parse::{
    DateFormats, Record, field, parse_date, parse_decimal, parse_int,
    parse_list, parse_text,
  },
};
use rust_decimal::Decimal;
use serde_json::Value;

pub const DEFAULT_CURRENCY: &str = "PEN";
pub const DEFAULT_SERVICE_TYPE: &str = "standard";
/// Assumed when a review carries no readable rating; a zero counts as none.
pub const DEFAULT_RATING: u8 = 3;

// ─── Tariffs ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverTariffRecord {
  pub commission_rate: Option<Decimal>,
  pub min_fare:        Option<Decimal>,
  pub signup_bonus:    Option<Decimal>,
  pub referral_bonus:  Option<Decimal>,
  pub requirements:    Option<Vec<String>>,
  pub benefits:        Option<Vec<String>>,
  pub currency:        Option<String>,
  pub source_url:      Option<String>,
}

impl DriverTariffRecord {
  pub fn from_record(record: &Record) -> Self {
    Self {
      commission_rate: parse_decimal(field(record, "commission")),
      min_fare:        parse_decimal(field(record, "min_fare")),
      signup_bonus:    parse_decimal(field(record, "signup_bonus")),
      referral_bonus:  parse_decimal(field(record, "referral_bonus")),
      requirements:    parse_list(field(record, "requirements")),
      benefits:        parse_list(field(record, "benefits")),
      currency:        parse_text(field(record, "currency")),
      source_url:      parse_text(field(record, "source_url")),
    }
  }
}

impl From<DriverTariffRecord> for NewDriverTariff {
  fn from(r: DriverTariffRecord) -> Self {
    Self {
      commission_rate: r.commission_rate,
      min_fare:        r.min_fare,
      signup_bonus:    r.signup_bonus,
      referral_bonus:  r.referral_bonus,
      requirements:    r.requirements,
      benefits:        r.benefits,
      currency:        r.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
      source_url:      r.source_url,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiderTariffRecord {
  pub service_type: Option<String>,
  pub base_fare:    Option<Decimal>,
  pub per_km_rate:  Option<Decimal>,
  pub per_min_rate: Option<Decimal>,
  pub booking_fee:  Option<Decimal>,
  pub currency:     Option<String>,
  pub source_url:   Option<String>,
}

impl RiderTariffRecord {
  pub fn from_record(record: &Record) -> Self {
    Self {
      service_type: parse_text(field(record, "service_type")),
      base_fare:    parse_decimal(field(record, "base_fare")),
      per_km_rate:  parse_decimal(field(record, "per_km_rate")),
      per_min_rate: parse_decimal(field(record, "per_min_rate")),
      booking_fee:  parse_decimal(field(record, "booking_fee")),
      currency:     parse_text(field(record, "currency")),
      source_url:   parse_text(field(record, "source_url")),
    }
  }
}

impl From<RiderTariffRecord> for NewRiderTariff {
  fn from(r: RiderTariffRecord) -> Self {
    Self {
      service_type: r
        .service_type
        .unwrap_or_else(|| DEFAULT_SERVICE_TYPE.to_owned()),
      base_fare:    r.base_fare,
      per_km_rate:  r.per_km_rate,
      per_min_rate: r.per_min_rate,
      booking_fee:  r.booking_fee,
      currency:     r.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
      source_url:   r.source_url,
    }
  }
}

// ─── App stores ──────────────────────────────────────────────────────────────

/// One app-store listing: optional release facts plus embedded reviews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppStoreRecord {
  /// A release is recorded only when the version is present.
  pub app_version:   Option<String>,
  pub release_notes: Option<String>,
  pub release_date:  Option<NaiveDate>,
  pub rating:        Option<Decimal>,
  pub rating_count:  Option<i64>,
  pub reviews:       Vec<ReviewRecord>,
}

impl AppStoreRecord {
  pub fn from_record(record: &Record, formats: &DateFormats) -> Self {
    let reviews = match field(record, "reviews") {
      Value::Array(items) => items
        .iter()
        .filter_map(Value::as_object)
        .map(|r| ReviewRecord::from_record(r, formats))
        .collect(),
      _ => Vec::new(),
    };

    Self {
      app_version: parse_text(field(record, "app_version")),
      release_notes: parse_text(field(record, "release_notes")),
      release_date: parse_date(field(record, "release_date"), formats),
      rating: parse_decimal(field(record, "rating")),
      rating_count: parse_int(field(record, "rating_count")),
      reviews,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewRecord {
  /// Store-assigned id, from `review_id` or else `id`.
  pub source_id:   Option<String>,
  pub author:      Option<String>,
  pub rating:      u8,
  pub text:        Option<String>,
  pub review_date: Option<NaiveDate>,
  pub app_version: Option<String>,
}

impl ReviewRecord {
  pub fn from_record(record: &Record, formats: &DateFormats) -> Self {
    let rating = parse_int(field(record, "rating"))
      .filter(|&r| r != 0)
      .map_or(DEFAULT_RATING, |r| r.clamp(1, 5) as u8);

    Self {
      source_id: parse_text(field(record, "review_id"))
        .or_else(|| parse_text(field(record, "id"))),
      author: parse_text(field(record, "author")),
      rating,
      text: parse_text(field(record, "text")),
      review_date: parse_date(field(record, "date"), formats),
      app_version: parse_text(field(record, "app_version")),
    }
  }
}
