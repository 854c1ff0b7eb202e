//! Wiring for the ridewatch server binary: configuration, state, router.

pub mod error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use ridewatch_ai::{AiConfig, build_classifier};
use ridewatch_api::{ApiState, WebhookAuth, api_router};
use ridewatch_core::{model::NewCompetitor, store::IntelStore};
use ridewatch_ingest::{IngestConfig, WebhookProcessor};
use ridewatch_news::{MultiSearch, NewsConfig, NewsScraper, SearchConfig};
use ridewatch_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{Error, Result};

pub const ENV_PREFIX: &str = "RIDEWATCH";

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "0.0.0.0".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("ridewatch.db") }

/// Runtime server configuration, deserialised from `config.toml` and
/// `RIDEWATCH_*` environment variables (`__` separates nested keys).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// argon2 PHC string of the secret scrapers send in `X-Webhook-Secret`.
  pub webhook_secret_hash: String,
  /// Competitors created at startup when their slug is not yet stored.
  #[serde(default)]
  pub seed_competitors:    Vec<NewCompetitor>,
  #[serde(default)]
  pub ai:                  AiConfig,
  #[serde(default)]
  pub search:              SearchConfig,
  #[serde(default)]
  pub news:                NewsConfig,
  #[serde(default)]
  pub ingest:              IngestConfig,
}

impl ServerConfig {
  /// Read `path` (optional) overlaid with the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(Config::builder().add_source(File::from(path).required(false)))
  }

  pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
      .build()?
      .try_deserialize()
  }

  pub fn webhook_auth(&self) -> Result<WebhookAuth> {
    argon2::PasswordHash::new(&self.webhook_secret_hash)
      .map_err(|_| Error::InvalidSecretHash)?;
    Ok(WebhookAuth { secret_hash: self.webhook_secret_hash.clone() })
  }

  /// Search settings; the Gemini search backend reuses the AI key when it
  /// has none of its own.
  fn search_config(&self) -> SearchConfig {
    let mut search = self.search.clone();
    if search.google_api_key.is_none() {
      search.google_api_key = self.ai.google_api_key.clone();
    }
    search
  }
}

// ─── State ────────────────────────────────────────────────────────────────────

/// Create any configured competitor that is not stored yet.
pub async fn seed_competitors(store: &SqliteStore, seeds: &[NewCompetitor]) -> Result<()> {
  for seed in seeds {
    let competitor = store.ensure_competitor(seed.clone()).await?;
    info!(slug = %competitor.slug, "competitor ready");
  }
  Ok(())
}

/// Build the services the API needs on top of `store`.
pub fn build_state<S>(config: &ServerConfig, store: Arc<S>) -> Result<ApiState<S>>
where
  S: IntelStore,
{
  let classifier = build_classifier(&config.ai);
  let search = MultiSearch::from_config(&config.search_config())?;
  let status = search.status();
  info!(
    available = status.available_count,
    total = status.providers.len(),
    "search providers configured"
  );

  Ok(ApiState {
    store:     store.clone(),
    processor: Arc::new(WebhookProcessor::new(
      store.clone(),
      classifier,
      config.ingest.clone(),
    )),
    news:      Arc::new(NewsScraper::new(store, Arc::new(search), config.news.clone())),
    auth:      Arc::new(config.webhook_auth()?),
  })
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S>(state: ApiState<S>) -> Router
where
  S: IntelStore + 'static,
{
  api_router(state).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use config::FileFormat;
  use tower::ServiceExt as _;

  use super::*;

  // Well-formed PHC string; only parsed, never verified here.
  const HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHRzYWx0$PLKs+Mi0Iy9k3HHFhN5YsZf39DzvhkH2ldJNy7dE6Eg";

  fn parse(toml: &str) -> ServerConfig {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn minimal_config_uses_defaults() {
    let config = parse(&format!("webhook_secret_hash = '{HASH}'"));
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8000);
    assert_eq!(config.store_path, PathBuf::from("ridewatch.db"));
    assert!(config.seed_competitors.is_empty());
    assert_eq!(config.news.max_results, 10);
    assert!(config.news.peru_sources);
    assert_eq!(config.ingest.date_formats.0[0], "%Y-%m-%d");
  }

  #[test]
  fn nested_sections_are_read() {
    let config = parse(&format!(
      r#"
      webhook_secret_hash = '{HASH}'
      port = 9000
      seed_competitors = [{{ slug = "indriver", name = "inDrive" }}]

      [ai]
      google_api_key = "g-key"

      [search]
      tavily_api_key = "tvly"
      preferred_provider = "Tavily"
      serpapi_base_url = "http://127.0.0.1:9100/serp"

      [news]
      region_qualifier = "Lima"
      peru_sources = false
      sources = ["rpp.pe", "gestion.pe"]

      [ingest]
      date_formats = ["%m/%d/%Y"]
      "#
    ));
    assert_eq!(config.port, 9000);
    assert_eq!(config.seed_competitors[0].slug, "indriver");
    assert_eq!(config.search.preferred_provider.as_deref(), Some("Tavily"));
    assert_eq!(config.search.serpapi_base_url, "http://127.0.0.1:9100/serp");
    assert_eq!(config.search.tavily_base_url, "https://api.tavily.com");
    assert_eq!(config.news.region_qualifier, "Lima");
    assert!(!config.news.peru_sources);
    assert_eq!(config.news.sources, vec!["rpp.pe".to_owned(), "gestion.pe".to_owned()]);
    assert_eq!(config.ingest.date_formats.0, vec!["%m/%d/%Y".to_owned()]);
    // Gemini search inherits the AI key.
    assert_eq!(config.search_config().google_api_key.as_deref(), Some("g-key"));
  }

  #[test]
  fn plaintext_secret_is_rejected() {
    let config = parse("webhook_secret_hash = 'change-me'");
    assert!(matches!(config.webhook_auth(), Err(Error::InvalidSecretHash)));
  }

  #[tokio::test]
  async fn wired_router_serves_health_and_seeds() {
    let config = parse(&format!(
      "webhook_secret_hash = '{HASH}'\nseed_competitors = [{{ slug = 'uber', name = 'Uber' }}]"
    ));
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    seed_competitors(&store, &config.seed_competitors).await.unwrap();
    seed_competitors(&store, &config.seed_competitors).await.unwrap();
    assert_eq!(store.list_competitors().await.unwrap().len(), 1);

    let app = router(build_state(&config, store).unwrap());
    let response = app
      .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
  }
}
