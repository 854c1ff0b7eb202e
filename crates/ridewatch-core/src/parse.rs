//! Field parsers for loosely-typed scraped values.
//!
//! Scrapers export whatever the page showed: `"25%"`, `"S/200.00"`,
//! `"4,5"`, `"15/01/2024"`, `"Seguro|SOAT"`. Every parser here accepts any
//! JSON value and returns `None` for input it cannot read. None of them fail,
//! so one malformed cell never aborts a batch.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A scraped record as delivered in a webhook `dataList`.
pub type Record = serde_json::Map<String, Value>;

static NULL: Value = Value::Null;

static SIGNED_DECIMAL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("static regex"));

/// Fetch `key` from `record`, treating a missing key as JSON `null`.
pub fn field<'a>(record: &'a Record, key: &str) -> &'a Value {
  record.get(key).unwrap_or(&NULL)
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

/// Numbers convert directly. Strings yield their first signed decimal after
/// `,` is normalised to `.`, so `"25,5%"` reads as `25.5`.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
  match value {
    Value::Number(n) => {
      let s = n.to_string();
      s.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&s))
        .ok()
    }
    Value::String(s) => {
      let normalised = s.replace(',', ".");
      let found = SIGNED_DECIMAL.find(&normalised)?;
      found.as_str().parse::<Decimal>().ok()
    }
    _ => None,
  }
}

// ─── Integer ─────────────────────────────────────────────────────────────────

/// Integers pass through; floats and numeric strings are truncated, so
/// `"4.5"` reads as `4`.
pub fn parse_int(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
    Value::String(s) => s.trim().parse::<f64>().ok().and_then(truncate),
    _ => None,
  }
}

fn truncate(f: f64) -> Option<i64> {
  f.is_finite().then(|| f.trunc() as i64)
}

// ─── Date ────────────────────────────────────────────────────────────────────

/// Ordered list of `chrono` format strings tried by [`parse_date`].
///
/// `%d/%m/%Y` and `%m/%d/%Y` overlap for days up to 12; whichever comes first
/// wins. Sources that export US-style dates should configure their own order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateFormats(pub Vec<String>);

impl Default for DateFormats {
  fn default() -> Self {
    Self(
      ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%dT%H:%M:%S"]
        .into_iter()
        .map(str::to_owned)
        .collect(),
    )
  }
}

/// Parse a date string against `formats`, first match wins. The input is cut
/// to 19 characters so ISO-8601 timestamps with offsets or fractions still
/// match `%Y-%m-%dT%H:%M:%S`.
pub fn parse_date(value: &Value, formats: &DateFormats) -> Option<NaiveDate> {
  let raw = value.as_str()?.trim();
  if raw.is_empty() {
    return None;
  }
  let head = match raw.char_indices().nth(19) {
    Some((idx, _)) => &raw[..idx],
    None => raw,
  };

  formats.0.iter().find_map(|fmt| {
    NaiveDate::parse_from_str(head, fmt).ok().or_else(|| {
      NaiveDateTime::parse_from_str(head, fmt)
        .ok()
        .map(|dt| dt.date())
    })
  })
}

// ─── List ────────────────────────────────────────────────────────────────────

/// Arrays pass through (scalars stringified); strings split on `|`. Empty
/// entries are dropped and an empty result is `None`.
pub fn parse_list(value: &Value) -> Option<Vec<String>> {
  let items: Vec<String> = match value {
    Value::Array(values) => values.iter().filter_map(scalar_text).collect(),
    Value::String(s) => s
      .split('|')
      .map(str::trim)
      .filter(|item| !item.is_empty())
      .map(str::to_owned)
      .collect(),
    _ => return None,
  };

  (!items.is_empty()).then_some(items)
}

// ─── Text ────────────────────────────────────────────────────────────────────

/// Non-empty trimmed strings, or the rendering of a number. Scrapers export
/// ids and version numbers as either.
pub fn parse_text(value: &Value) -> Option<String> { scalar_text(value) }

fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => {
      let trimmed = s.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}
