//! Perplexity `sonar` chat completions, reading the cited sources.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::{array, opt_text, ranked, read_json, text};
use crate::{
  Result, SearchProvider, SearchResult,
  result::{domain_of, truncate_chars},
};

const NAME: &str = "Perplexity";
const MODEL: &str = "sonar";

pub struct PerplexitySearch {
  api_key:  Option<String>,
  base_url: String,
  http:     reqwest::Client,
}

impl PerplexitySearch {
  pub fn new(api_key: Option<String>, base_url: impl Into<String>, http: reqwest::Client) -> Self {
    Self {
      api_key,
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      http,
    }
  }

  /// Citations become results. A citation is either an object or a bare URL;
  /// the first one borrows the answer text when it has no snippet.
  pub fn parse_response(data: &Value, max_results: usize) -> Vec<SearchResult> {
    let answer = data
      .pointer("/choices/0/message/content")
      .and_then(Value::as_str)
      .unwrap_or_default();

    array(data, "citations")
      .iter()
      .take(max_results)
      .enumerate()
      .map(|(i, citation)| {
        let fallback_title = format!("Result {}", i + 1);
        let fallback_snippet = if i == 0 { truncate_chars(answer, 200) } else { "" };
        let hit = match citation {
          Value::String(url) => {
            SearchResult::new(NAME, fallback_title, url.as_str(), fallback_snippet)
              .with_source(Some(domain_of(url)))
          }
          obj => {
            let title = opt_text(obj, "title").unwrap_or(fallback_title);
            let snippet = opt_text(obj, "snippet")
              .unwrap_or_else(|| fallback_snippet.to_owned());
            SearchResult::new(NAME, title, text(obj, "url"), snippet)
              .with_source(opt_text(obj, "source"))
              .with_date(opt_text(obj, "date"))
          }
        };
        hit.with_score(ranked(1.0, 0.1, i))
      })
      .collect()
  }
}

#[async_trait]
impl SearchProvider for PerplexitySearch {
  fn name(&self) -> &'static str { NAME }

  fn priority(&self) -> u8 { 2 }

  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let body = json!({
      "model": MODEL,
      "messages": [
        {
          "role": "system",
          "content": "You are a news research assistant. Search for the latest news and return factual information with sources."
        },
        {
          "role": "user",
          "content": format!("Search for: {query}\n\nReturn news articles with URLs and dates.")
        }
      ],
      "max_tokens": 1500,
    });

    let response = self
      .http
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(self.api_key.as_deref().unwrap_or_default())
      .json(&body)
      .send()
      .await?;
    let data = read_json(NAME, response).await?;

    let results = Self::parse_response(&data, max_results);
    info!(provider = NAME, count = results.len(), "search completed");
    Ok(results)
  }
}
