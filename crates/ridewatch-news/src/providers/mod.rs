//! The five search backends, in priority order.
//!
//! Each adapter owns its wire format. The `parse_response` functions are pure
//! so the normalisation rules can be tested without a network.

mod gemini;
mod parallel;
mod perplexity;
mod serpapi;
mod tavily;

pub use gemini::GeminiSearch;
pub use parallel::ParallelSearch;
pub use perplexity::PerplexitySearch;
pub use serpapi::SerpApiSearch;
pub use tavily::TavilySearch;

use serde_json::Value;

use crate::{Error, Result};

/// Turn a non-2xx response into [`Error::Api`], otherwise decode the body.
pub(crate) async fn read_json(
  provider: &'static str,
  response: reqwest::Response,
) -> Result<Value> {
  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    return Err(Error::Api {
      provider,
      status: status.as_u16(),
      body: crate::result::truncate_chars(&body, 200).to_owned(),
    });
  }
  Ok(response.json().await?)
}

/// String field of a JSON object; empty when absent or not a string.
pub(crate) fn text<'a>(item: &'a Value, key: &str) -> &'a str {
  item.get(key).and_then(Value::as_str).unwrap_or_default()
}

pub(crate) fn opt_text(item: &Value, key: &str) -> Option<String> {
  item
    .get(key)
    .and_then(Value::as_str)
    .filter(|s| !s.is_empty())
    .map(str::to_owned)
}

/// Array field of a JSON object; empty when absent.
pub(crate) fn array<'a>(item: &'a Value, key: &str) -> &'a [Value] {
  item
    .get(key)
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or_default()
}

/// Score decaying by rank, never below zero.
pub(crate) fn ranked(start: f64, step: f64, rank: usize) -> f64 {
  (start - step * rank as f64).max(0.0)
}
