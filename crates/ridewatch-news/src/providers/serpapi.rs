//! SerpApi Google News (`GET /search.json`).

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::{array, opt_text, ranked, read_json, text};
use crate::{Result, SearchProvider, SearchResult};

const NAME: &str = "SerpAPI";

pub struct SerpApiSearch {
  api_key:  Option<String>,
  base_url: String,
  http:     reqwest::Client,
}

impl SerpApiSearch {
  pub fn new(api_key: Option<String>, base_url: impl Into<String>, http: reqwest::Client) -> Self {
    Self {
      api_key,
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      http,
    }
  }

  /// `news_results`, or `organic_results` when there are no news hits.
  pub fn parse_response(data: &Value, max_results: usize) -> Vec<SearchResult> {
    let news = array(data, "news_results");
    let items = if news.is_empty() { array(data, "organic_results") } else { news };

    items
      .iter()
      .take(max_results)
      .enumerate()
      .map(|(i, item)| {
        // `source` is a plain string on organic hits, `{name, ...}` on news.
        let source = match item.get("source") {
          Some(Value::Object(obj)) => obj
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned),
          Some(Value::String(s)) => Some(s.clone()),
          _ => None,
        };
        SearchResult::new(NAME, text(item, "title"), text(item, "link"), text(item, "snippet"))
          .with_source(source)
          .with_date(opt_text(item, "date"))
          .with_score(ranked(0.8, 0.05, i))
      })
      .collect()
  }
}

#[async_trait]
impl SearchProvider for SerpApiSearch {
  fn name(&self) -> &'static str { NAME }

  fn priority(&self) -> u8 { 3 }

  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let num = max_results.to_string();
    let response = self
      .http
      .get(format!("{}/search.json", self.base_url))
      .query(&[
        ("api_key", self.api_key.as_deref().unwrap_or_default()),
        ("q", query),
        ("engine", "google"),
        ("gl", "pe"),
        ("hl", "es"),
        ("num", num.as_str()),
        ("tbm", "nws"),
      ])
      .send()
      .await?;
    let data = read_json(NAME, response).await?;

    let results = Self::parse_response(&data, max_results);
    info!(provider = NAME, count = results.len(), "search completed");
    Ok(results)
  }
}
