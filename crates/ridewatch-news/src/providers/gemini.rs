//! Gemini as a last-resort search backend.
//!
//! The model is asked for a JSON array of articles; hits without a URL are
//! dropped.

use std::sync::Arc;

use async_trait::async_trait;
use ridewatch_ai::{ResponseFormat, TextGenerator, strip_code_fence};
use serde_json::Value;
use tracing::info;

use super::{opt_text, text};
use crate::{Error, Result, SearchProvider, SearchResult};

const NAME: &str = "Gemini";
const TEMPERATURE: f32 = 0.2;

pub struct GeminiSearch {
  generator: Option<Arc<dyn TextGenerator>>,
}

impl GeminiSearch {
  pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self { Self { generator } }

  fn prompt(query: &str, max_results: usize) -> String {
    format!(
      r#"You are a news research assistant for the Peru market.

Search for recent news about: {query}

Return ONLY a JSON array, no markdown, with this structure:
[
  {{
    "title": "Article title",
    "url": "https://...",
    "snippet": "Brief description",
    "source": "Source name",
    "date": "YYYY-MM-DD"
  }}
]

Focus on Peru market, Spanish language sources. Return up to {max_results} results."#
    )
  }

  pub fn parse_response(data: &Value, max_results: usize) -> Vec<SearchResult> {
    data
      .as_array()
      .map(Vec::as_slice)
      .unwrap_or_default()
      .iter()
      .take(max_results)
      .filter(|item| !text(item, "url").is_empty())
      .map(|item| {
        SearchResult::new(NAME, text(item, "title"), text(item, "url"), text(item, "snippet"))
          .with_source(opt_text(item, "source"))
          .with_date(opt_text(item, "date"))
          .with_score(0.7)
      })
      .collect()
  }
}

#[async_trait]
impl SearchProvider for GeminiSearch {
  fn name(&self) -> &'static str { NAME }

  fn priority(&self) -> u8 { 4 }

  fn is_configured(&self) -> bool { self.generator.is_some() }

  async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let generator = self
      .generator
      .as_ref()
      .ok_or(Error::Shape("gemini search is not configured"))?;
    let raw = generator
      .generate(&Self::prompt(query, max_results), ResponseFormat::Json, TEMPERATURE)
      .await?;
    let data: Value = serde_json::from_str(strip_code_fence(&raw))?;

    let results = Self::parse_response(&data, max_results);
    info!(provider = NAME, count = results.len(), "search completed");
    Ok(results)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  struct Fixed(&'static str);

  #[async_trait]
  impl TextGenerator for Fixed {
    async fn generate(
      &self,
      _: &str,
      _: ResponseFormat,
      _: f32,
    ) -> ridewatch_ai::Result<String> {
      Ok(self.0.to_owned())
    }
  }

  #[test]
  fn drops_items_without_url() {
    let data = json!([
      { "title": "a", "url": "https://a.pe", "snippet": "s", "date": "2024-07-01" },
      { "title": "no url" }
    ]);
    let hits = GeminiSearch::parse_response(&data, 10);
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 0.7).abs() < 1e-9);
    assert_eq!(hits[0].published_date(), chrono::NaiveDate::from_ymd_opt(2024, 7, 1));
  }

  #[test]
  fn non_array_is_empty() {
    assert!(GeminiSearch::parse_response(&json!({ "title": "x" }), 10).is_empty());
  }

  #[tokio::test]
  async fn fenced_answer_is_parsed() {
    let provider = GeminiSearch::new(Some(Arc::new(Fixed(
      "```json\n[{\"title\":\"Yango llega a Arequipa\",\"url\":\"https://andina.pe/y\"}]\n```",
    ))));
    assert!(provider.is_configured());
    let hits = provider.search("Yango Peru", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].provider, "Gemini");
  }

  #[tokio::test]
  async fn garbage_answer_is_an_error() {
    let provider = GeminiSearch::new(Some(Arc::new(Fixed("sorry, no results"))));
    assert!(provider.search("x", 5).await.is_err());
    assert!(!GeminiSearch::new(None).is_configured());
  }
}
