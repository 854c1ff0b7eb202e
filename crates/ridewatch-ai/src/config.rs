//! `[ai]` configuration section.

use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_GEMINI_BASE_URL: &str =
  "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Settings for the classifier's text generator.
///
/// Without a `google_api_key` the classifier runs in rule mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
  pub google_api_key:   Option<String>,
  pub model:            String,
  pub base_url:         String,
  /// Upper bound for one classification call.
  pub timeout_secs:     u64,
  /// Language the release summary is written in.
  pub summary_language: String,
}

impl Default for AiConfig {
  fn default() -> Self {
    Self {
      google_api_key:   None,
      model:            DEFAULT_GEMINI_MODEL.to_owned(),
      base_url:         DEFAULT_GEMINI_BASE_URL.to_owned(),
      timeout_secs:     30,
      summary_language: "English".to_owned(),
    }
  }
}

impl AiConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// The API key, if one is set and non-blank.
  pub fn api_key(&self) -> Option<&str> {
    self
      .google_api_key
      .as_deref()
      .map(str::trim)
      .filter(|k| !k.is_empty())
  }
}
