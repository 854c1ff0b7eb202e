//! Parallel AI search (`POST {base}/search`).

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::{array, opt_text, ranked, read_json, text};
use crate::{
  Result, SearchProvider, SearchResult,
  result::{domain_of, truncate_chars},
};

const NAME: &str = "Parallel AI";
const MAX_QUERIES: usize = 3;
const EXCERPT_CHARS: usize = 5000;
const SNIPPET_CHARS: usize = 500;

/// Brand names that earn an extra, brand-specific search query.
const BRANDS: &[&str] = &["uber", "indrive", "didi", "cabify", "yango", "rappi", "bolt"];

pub struct ParallelSearch {
  api_key:     Option<String>,
  base_url:    String,
  beta_header: String,
  http:        reqwest::Client,
}

impl ParallelSearch {
  pub fn new(
    api_key: Option<String>,
    base_url: impl Into<String>,
    beta_header: impl Into<String>,
    http: reqwest::Client,
  ) -> Self {
    Self {
      api_key,
      base_url: base_url.into().trim_end_matches('/').to_owned(),
      beta_header: beta_header.into(),
      http,
    }
  }

  /// The objective itself plus a brand-specific variant when one is named.
  pub fn search_queries(objective: &str) -> Vec<String> {
    let mut queries = vec![objective.to_owned()];
    let lower = objective.to_lowercase();
    if let Some(brand) = BRANDS.iter().find(|b| lower.contains(*b)) {
      queries.push(format!("{brand} Peru últimas noticias"));
    }
    queries.truncate(MAX_QUERIES);
    queries
  }

  pub fn parse_response(data: &Value, max_results: usize) -> Vec<SearchResult> {
    array(data, "results")
      .iter()
      .take(max_results)
      .enumerate()
      .map(|(i, item)| {
        let url = text(item, "url");
        let snippet = array(item, "excerpts")
          .first()
          .and_then(Value::as_str)
          .map(|e| truncate_chars(e, SNIPPET_CHARS))
          .unwrap_or_default();
        SearchResult::new(NAME, text(item, "title"), url, snippet)
          .with_source(Some(domain_of(url)))
          .with_date(opt_text(item, "publish_date"))
          .with_score(ranked(0.9, 0.05, i))
      })
      .collect()
  }
}

#[async_trait]
impl SearchProvider for ParallelSearch {
  fn name(&self) -> &'static str { NAME }

  fn priority(&self) -> u8 { 0 }

  fn is_configured(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let api_key = self.api_key.as_deref().unwrap_or_default();
    let body = json!({
      "objective": query,
      "search_queries": Self::search_queries(query),
      "max_results": max_results,
      "excerpts": { "max_chars_per_result": EXCERPT_CHARS },
    });

    let response = self
      .http
      .post(format!("{}/search", self.base_url))
      .header("x-api-key", api_key)
      .header("parallel-beta", &self.beta_header)
      .json(&body)
      .send()
      .await?;
    let data = read_json(NAME, response).await?;

    let results = Self::parse_response(&data, max_results);
    info!(
      provider = NAME,
      count = results.len(),
      search_id = text(&data, "search_id"),
      "search completed"
    );
    Ok(results)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn brand_variant_is_added_once() {
    let q = ParallelSearch::search_queries("Uber y DiDi suben tarifas");
    assert_eq!(q, vec![
      "Uber y DiDi suben tarifas".to_owned(),
      "uber Peru últimas noticias".to_owned(),
    ]);
    assert_eq!(ParallelSearch::search_queries("taxi Lima").len(), 1);
  }

  #[test]
  fn parses_results_with_rank_scores() {
    let data = json!({
      "search_id": "s-1",
      "results": [
        {
          "url": "https://www.elperuano.pe/noticia/1",
          "title": "ATU regula aplicativos",
          "publish_date": "2024-10-02",
          "excerpts": ["La ATU publicó...", "segundo"]
        },
        { "url": "https://gestion.pe/2", "title": "Otro", "excerpts": [] }
      ]
    });
    let hits = ParallelSearch::parse_response(&data, 10);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].source.as_deref(), Some("elperuano.pe"));
    assert_eq!(hits[0].snippet, "La ATU publicó...");
    assert_eq!(hits[0].date.as_deref(), Some("2024-10-02"));
    assert!((hits[0].score - 0.9).abs() < 1e-9);
    assert!((hits[1].score - 0.85).abs() < 1e-9);
    assert_eq!(hits[1].snippet, "");
    assert_eq!(hits[1].provider, "Parallel AI");
  }

  #[test]
  fn snippet_is_capped() {
    let long = "x".repeat(800);
    let data = json!({ "results": [{ "url": "https://a.pe", "excerpts": [long] }] });
    let hits = ParallelSearch::parse_response(&data, 1);
    assert_eq!(hits[0].snippet.chars().count(), SNIPPET_CHARS);
  }
}
