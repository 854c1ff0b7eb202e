//! [`MultiSearch`] — sequential fallthrough across search providers.

use std::{sync::Arc, time::Duration};

use ridewatch_ai::{GeminiClient, TextGenerator};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
  Result, SearchConfig, SearchProvider, SearchResult,
  config::key,
  providers::{GeminiSearch, ParallelSearch, PerplexitySearch, SerpApiSearch, TavilySearch},
};

/// Tries configured providers one at a time until one returns results.
pub struct MultiSearch {
  providers: Vec<Arc<dyn SearchProvider>>,
  timeout:   Duration,
  /// Tried first when a search names no provider.
  preferred: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
  pub name:       &'static str,
  pub priority:   u8,
  pub configured: bool,
}

/// Which providers exist and how many can actually be queried.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
  pub providers:       Vec<ProviderInfo>,
  pub available_count: usize,
}

impl MultiSearch {
  /// Providers are kept in ascending priority order.
  pub fn new(mut providers: Vec<Arc<dyn SearchProvider>>, timeout: Duration) -> Self {
    providers.sort_by_key(|p| p.priority());
    Self { providers, timeout, preferred: None }
  }

  pub fn with_preferred(mut self, preferred: Option<String>) -> Self {
    self.preferred = preferred;
    self
  }

  /// Build all five providers from configuration, sharing one HTTP client.
  pub fn from_config(config: &SearchConfig) -> Result<Self> {
    let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

    let gemini: Option<Arc<dyn TextGenerator>> = match key(&config.google_api_key) {
      Some(api_key) => Some(Arc::new(
        GeminiClient::new(api_key, &config.gemini_model, config.timeout())?
          .with_base_url(&config.gemini_base_url),
      )),
      None => None,
    };

    let providers: Vec<Arc<dyn SearchProvider>> = vec![
      Arc::new(ParallelSearch::new(
        key(&config.parallel_api_key),
        &config.parallel_base_url,
        &config.parallel_beta_header,
        http.clone(),
      )),
      Arc::new(TavilySearch::new(
        key(&config.tavily_api_key),
        &config.tavily_base_url,
        http.clone(),
      )),
      Arc::new(PerplexitySearch::new(
        key(&config.perplexity_api_key),
        &config.perplexity_base_url,
        http.clone(),
      )),
      Arc::new(SerpApiSearch::new(key(&config.serpapi_key), &config.serpapi_base_url, http)),
      Arc::new(GeminiSearch::new(gemini)),
    ];
    Ok(Self::new(providers, config.timeout()).with_preferred(key(&config.preferred_provider)))
  }

  /// Configured providers, `preferred` (or the default preference) first
  /// when it names one of them.
  fn ordered(&self, preferred: Option<&str>) -> Vec<&Arc<dyn SearchProvider>> {
    let mut available: Vec<_> =
      self.providers.iter().filter(|p| p.is_configured()).collect();
    if let Some(preferred) = preferred.or(self.preferred.as_deref()) {
      // Stable sort: the rest keep their priority order.
      available.sort_by_key(|p| !p.name().eq_ignore_ascii_case(preferred));
    }
    available
  }

  /// First non-empty result list, unmerged. Provider errors and timeouts are
  /// logged and count as "no results".
  pub async fn search(
    &self,
    query: &str,
    max_results: usize,
    preferred: Option<&str>,
  ) -> Vec<SearchResult> {
    let available = self.ordered(preferred);
    if available.is_empty() {
      warn!("no search providers configured");
      return Vec::new();
    }

    for provider in available {
      let name = provider.name();
      info!(provider = name, "trying search provider");
      match tokio::time::timeout(self.timeout, provider.search(query, max_results)).await {
        Ok(Ok(results)) if !results.is_empty() => {
          info!(provider = name, count = results.len(), "search succeeded");
          return results;
        }
        Ok(Ok(_)) => info!(provider = name, "provider returned no results"),
        Ok(Err(e)) => warn!(provider = name, error = %e, "provider failed"),
        Err(_) => warn!(provider = name, timeout = ?self.timeout, "provider timed out"),
      }
    }

    warn!("all search providers came back empty");
    Vec::new()
  }

  pub fn status(&self) -> ProviderStatus {
    let providers: Vec<ProviderInfo> = self
      .providers
      .iter()
      .map(|p| ProviderInfo {
        name:       p.name(),
        priority:   p.priority(),
        configured: p.is_configured(),
      })
      .collect();
    let available_count = providers.iter().filter(|p| p.configured).count();
    ProviderStatus { providers, available_count }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use async_trait::async_trait;

  use super::*;
  use crate::Error;

  enum Behaviour {
    Fail,
    Empty,
    Hits(usize),
    Stall,
  }

  struct Stub {
    name:       &'static str,
    priority:   u8,
    configured: bool,
    behaviour:  Behaviour,
    calls:      AtomicUsize,
  }

  impl Stub {
    fn new(name: &'static str, priority: u8, behaviour: Behaviour) -> Arc<Self> {
      Arc::new(Self {
        name,
        priority,
        configured: true,
        behaviour,
        calls: AtomicUsize::new(0),
      })
    }

    fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
  }

  #[async_trait]
  impl SearchProvider for Stub {
    fn name(&self) -> &'static str { self.name }

    fn priority(&self) -> u8 { self.priority }

    fn is_configured(&self) -> bool { self.configured }

    async fn search(&self, _: &str, max: usize) -> Result<Vec<SearchResult>> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match self.behaviour {
        Behaviour::Fail => Err(Error::Shape("stub failure")),
        Behaviour::Empty => Ok(Vec::new()),
        Behaviour::Hits(n) => Ok(
          (0..n.min(max))
            .map(|i| {
              SearchResult::new(self.name, format!("hit {i}"), format!("https://{}.pe/{i}", self.name), "")
            })
            .collect(),
        ),
        Behaviour::Stall => {
          tokio::time::sleep(Duration::from_secs(3600)).await;
          Ok(Vec::new())
        }
      }
    }
  }

  fn multi(stubs: &[Arc<Stub>]) -> MultiSearch {
    MultiSearch::new(
      stubs.iter().map(|s| s.clone() as Arc<dyn SearchProvider>).collect(),
      Duration::from_millis(100),
    )
  }

  #[tokio::test]
  async fn falls_through_to_first_non_empty_provider() {
    let a = Stub::new("a", 0, Behaviour::Fail);
    let b = Stub::new("b", 1, Behaviour::Empty);
    let c = Stub::new("c", 2, Behaviour::Hits(2));
    let d = Stub::new("d", 3, Behaviour::Hits(5));
    let search = multi(&[d.clone(), c.clone(), b.clone(), a.clone()]);

    let results = search.search("q", 10, None).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.provider == "c"));
    assert_eq!((a.calls(), b.calls(), c.calls(), d.calls()), (1, 1, 1, 0));
  }

  #[tokio::test]
  async fn preferred_provider_goes_first() {
    let a = Stub::new("Tavily", 1, Behaviour::Hits(1));
    let b = Stub::new("SerpAPI", 3, Behaviour::Hits(1));
    let search = multi(&[a.clone(), b.clone()]);

    let results = search.search("q", 10, Some("serpapi")).await;
    assert_eq!(results[0].provider, "SerpAPI");
    assert_eq!(a.calls(), 0);

    // A per-search choice beats the configured default.
    let search = multi(&[a.clone(), b.clone()]).with_preferred(Some("SerpAPI".into()));
    assert_eq!(search.search("q", 10, None).await[0].provider, "SerpAPI");
    assert_eq!(search.search("q", 10, Some("tavily")).await[0].provider, "Tavily");
  }

  #[tokio::test]
  async fn timeouts_and_unconfigured_are_skipped() {
    let slow = Stub::new("slow", 0, Behaviour::Stall);
    let off = Arc::new(Stub {
      name:       "off",
      priority:   1,
      configured: false,
      behaviour:  Behaviour::Hits(3),
      calls:      AtomicUsize::new(0),
    });
    let ok = Stub::new("ok", 2, Behaviour::Hits(1));
    let search = multi(&[slow, off.clone(), ok]);

    let results = search.search("q", 10, None).await;
    assert_eq!(results.len(), 1);
    assert_eq!(off.calls(), 0);
  }

  #[tokio::test]
  async fn all_empty_is_empty() {
    let search = multi(&[Stub::new("a", 0, Behaviour::Empty), Stub::new("b", 1, Behaviour::Fail)]);
    assert!(search.search("q", 10, None).await.is_empty());
    assert!(multi(&[]).search("q", 10, None).await.is_empty());
  }

  #[test]
  fn status_counts_configured_providers() {
    let search = MultiSearch::from_config(&SearchConfig {
      tavily_api_key: Some("tvly-key".into()),
      serpapi_key: Some("  ".into()),
      ..SearchConfig::default()
    })
    .unwrap();
    let status = search.status();
    assert_eq!(status.providers.len(), 5);
    assert_eq!(status.available_count, 1);
    let names: Vec<_> = status.providers.iter().map(|p| p.name).collect();
    assert_eq!(names, ["Parallel AI", "Tavily", "Perplexity", "SerpAPI", "Gemini"]);
    assert!(status.providers[1].configured);
  }

  // ─── Wire formats against a local server ─────────────────────────────────

  /// Serves canned answers in each provider's wire format.
  async fn stub_backends() -> String {
    use axum::{
      Json, Router,
      routing::{get, post},
    };
    use serde_json::{Value, json};

    let app = Router::new()
      .route(
        "/tavily/search",
        post(|Json(body): Json<Value>| async move {
          assert_eq!(body["api_key"], "tvly");
          assert_eq!(body["search_depth"], "advanced");
          Json(json!({ "results": [
            { "title": "Tavily hit", "url": "https://rpp.pe/t", "content": "c", "score": 0.9 }
          ] }))
        }),
      )
      .route(
        "/pplx/chat/completions",
        post(|| async {
          Json(json!({
            "choices": [{ "message": { "content": "Resumen" } }],
            "citations": ["https://andina.pe/p"]
          }))
        }),
      )
      .route(
        "/serp/search.json",
        get(|| async {
          Json(json!({ "news_results": [
            { "title": "Serp hit", "link": "https://gestion.pe/s", "source": { "name": "Gestión" } }
          ] }))
        }),
      )
      .route(
        "/gemini/models/{*call}",
        post(|| async {
          let articles = r#"[{"title":"Gemini hit","url":"https://elcomercio.pe/g"}]"#;
          Json(json!({ "candidates": [{ "content": { "parts": [{ "text": articles }] } }] }))
        }),
      );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  #[tokio::test]
  async fn configured_base_urls_reach_each_backend() {
    let base = stub_backends().await;
    let search = MultiSearch::from_config(&SearchConfig {
      tavily_api_key: Some("tvly".into()),
      tavily_base_url: format!("{base}/tavily/"),
      perplexity_api_key: Some("pplx".into()),
      perplexity_base_url: format!("{base}/pplx"),
      serpapi_key: Some("serp".into()),
      serpapi_base_url: format!("{base}/serp"),
      google_api_key: Some("g".into()),
      gemini_base_url: format!("{base}/gemini"),
      timeout_secs: 5,
      ..SearchConfig::default()
    })
    .unwrap();
    assert_eq!(search.status().available_count, 4);

    let cases = [
      ("Tavily", "https://rpp.pe/t", "rpp.pe"),
      ("Perplexity", "https://andina.pe/p", "andina.pe"),
      ("SerpAPI", "https://gestion.pe/s", "Gestión"),
      ("Gemini", "https://elcomercio.pe/g", ""),
    ];
    for (provider, url, source) in cases {
      let hits = search.search("yango lima", 5, Some(provider)).await;
      assert_eq!(hits.len(), 1, "{provider}");
      assert_eq!(hits[0].provider, provider);
      assert_eq!(hits[0].url, url);
      assert_eq!(hits[0].source.as_deref().unwrap_or_default(), source);
    }
  }
}
