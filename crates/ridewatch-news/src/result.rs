//! Normalised search hit shared by all providers.

use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// One article returned by a search provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
  pub title:     String,
  pub url:       String,
  pub snippet:   String,
  pub source:    Option<String>,
  /// Publication date as the provider reported it.
  pub date:      Option<String>,
  pub score:     f64,
  /// Name of the provider that produced the hit.
  pub provider:  &'static str,
  /// Hex SHA-256 of the normalised URL.
  pub unique_id: String,
}

impl SearchResult {
  pub fn new(
    provider: &'static str,
    title: impl Into<String>,
    url: impl Into<String>,
    snippet: impl Into<String>,
  ) -> Self {
    let url = url.into();
    Self {
      title: title.into(),
      unique_id: url_fingerprint(&url),
      url,
      snippet: snippet.into(),
      source: None,
      date: None,
      score: 0.5,
      provider,
    }
  }

  pub fn with_source(mut self, source: Option<String>) -> Self {
    self.source = source.filter(|s| !s.is_empty());
    self
  }

  pub fn with_date(mut self, date: Option<String>) -> Self {
    self.date = date.filter(|d| !d.is_empty());
    self
  }

  pub fn with_score(mut self, score: f64) -> Self {
    self.score = score;
    self
  }

  /// The reported date, when it starts with an ISO `YYYY-MM-DD`.
  pub fn published_date(&self) -> Option<NaiveDate> {
    let date = self.date.as_deref()?;
    NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()
  }
}

/// Lowercase, trailing slashes stripped.
pub fn normalize_url(url: &str) -> String {
  url.trim().to_lowercase().trim_end_matches('/').to_owned()
}

pub fn url_fingerprint(url: &str) -> String {
  hex::encode(Sha256::digest(normalize_url(url).as_bytes()))
}

/// Host of `url` without a leading `www.`; empty when unparseable.
pub fn domain_of(url: &str) -> String {
  url::Url::parse(url)
    .ok()
    .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_owned()))
    .unwrap_or_default()
}

/// At most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((end, _)) => &s[..end],
    None => s,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fingerprint_ignores_case_and_trailing_slash() {
    let a = url_fingerprint("https://Example.pe/Noticia/");
    let b = url_fingerprint("https://example.pe/noticia");
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
    assert_ne!(a, url_fingerprint("https://example.pe/otra"));
  }

  #[test]
  fn domain_strips_www() {
    assert_eq!(domain_of("https://www.elperuano.pe/noticia/1"), "elperuano.pe");
    assert_eq!(domain_of("http://gestion.pe"), "gestion.pe");
    assert_eq!(domain_of("not a url"), "");
  }

  #[test]
  fn published_date_needs_iso_prefix() {
    let hit = SearchResult::new("test", "t", "https://a.pe", "")
      .with_date(Some("2024-11-05T10:00:00Z".into()));
    assert_eq!(hit.published_date(), NaiveDate::from_ymd_opt(2024, 11, 5));

    let hit = hit.with_date(Some("hace 2 días".into()));
    assert_eq!(hit.published_date(), None);
  }

  #[test]
  fn truncation_is_char_based() {
    assert_eq!(truncate_chars("áéíóú", 3), "áéí");
    assert_eq!(truncate_chars("abc", 10), "abc");
  }
}
