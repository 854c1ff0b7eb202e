//! `[search]` and `[news]` configuration sections.

use std::time::Duration;

use ridewatch_ai::config::DEFAULT_GEMINI_BASE_URL;
use serde::Deserialize;

use crate::enrich::PERU_NEWS_SOURCES;

/// API credentials and endpoints of the search providers.
///
/// A provider without a key is reported as unconfigured and skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub parallel_api_key:     Option<String>,
  pub parallel_base_url:    String,
  pub parallel_beta_header: String,
  pub tavily_api_key:       Option<String>,
  pub tavily_base_url:      String,
  pub perplexity_api_key:   Option<String>,
  pub perplexity_base_url:  String,
  pub serpapi_key:          Option<String>,
  pub serpapi_base_url:     String,
  pub google_api_key:       Option<String>,
  pub gemini_model:         String,
  pub gemini_base_url:      String,
  /// Per-provider bound, applied to the HTTP client and around each call.
  pub timeout_secs:         u64,
  /// Provider tried first when a query does not name one.
  pub preferred_provider:   Option<String>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      parallel_api_key:     None,
      parallel_base_url:    "https://api.parallel.ai/v1beta".to_owned(),
      parallel_beta_header: "search-extract-2025-10-10".to_owned(),
      tavily_api_key:       None,
      tavily_base_url:      "https://api.tavily.com".to_owned(),
      perplexity_api_key:   None,
      perplexity_base_url:  "https://api.perplexity.ai".to_owned(),
      serpapi_key:          None,
      serpapi_base_url:     "https://serpapi.com".to_owned(),
      google_api_key:       None,
      gemini_model:         "gemini-2.0-flash".to_owned(),
      gemini_base_url:      DEFAULT_GEMINI_BASE_URL.to_owned(),
      timeout_secs:         60,
      preferred_provider:   None,
    }
  }
}

impl SearchConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// Non-blank key, trimmed.
pub(crate) fn key(value: &Option<String>) -> Option<String> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .map(str::to_owned)
}

/// Query shaping for the news scraper.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
  /// Appended to every search to anchor it to the market.
  pub region_qualifier: String,
  pub max_results:      usize,
  /// Restrict searches to `sources` unless a query says otherwise.
  pub peru_sources:     bool,
  /// Outlets for the site filter; only the first five are used.
  pub sources:          Vec<String>,
}

impl Default for NewsConfig {
  fn default() -> Self {
    Self {
      region_qualifier: "ride-hailing taxi app Peru Lima".to_owned(),
      max_results:      10,
      peru_sources:     true,
      sources:          PERU_NEWS_SOURCES.iter().map(|s| (*s).to_owned()).collect(),
    }
  }
}
