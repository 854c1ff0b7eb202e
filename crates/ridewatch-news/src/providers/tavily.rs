//! Tavily search (`POST /search`).

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::{array, opt_text, read_json, text};
use crate::{Result, SearchProvider, SearchResult, result::domain_of};

const NAME: &str = "Tavily";

pub struct TavilySearch {
  api_key:  Option<String>,
  base_url: String,
  http:     reqwest::Client,
}

impl TavilySearch {
  pub fn new(api_key: Option<String>, base_url: impl Into<String>, http: reqwest::Client) -> Self {
    Self {
      api_key,
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      http,
    }
  }

  pub fn parse_response(data: &Value, max_results: usize) -> Vec<SearchResult> {
    array(data, "results")
      .iter()
      .take(max_results)
      .map(|item| {
        let url = text(item, "url");
        let source = opt_text(item, "domain").unwrap_or_else(|| domain_of(url));
        SearchResult::new(NAME, text(item, "title"), url, text(item, "content"))
          .with_source(Some(source))
          .with_date(opt_text(item, "published_date"))
          .with_score(item.get("score").and_then(Value::as_f64).unwrap_or(0.5))
      })
      .collect()
  }
}

#[async_trait]
impl SearchProvider for TavilySearch {
  fn name(&self) -> &'static str { NAME }

  fn priority(&self) -> u8 { 1 }

  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let body = json!({
      "api_key": self.api_key.as_deref().unwrap_or_default(),
      "query": query,
      "search_depth": "advanced",
      "max_results": max_results,
      "include_raw_content": false,
    });

    let response = self
      .http
      .post(format!("{}/search", self.base_url))
      .json(&body)
      .send()
      .await?;
    let data = read_json(NAME, response).await?;

    let results = Self::parse_response(&data, max_results);
    info!(provider = NAME, count = results.len(), "search completed");
    Ok(results)
  }
}
