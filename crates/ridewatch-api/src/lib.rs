//! JSON HTTP API for ridewatch.
//!
//! Exposes an axum [`Router`] backed by any [`IntelStore`]: the scraper
//! webhook receiver, news search, and collection diagnostics. TLS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = ridewatch_api::api_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod auth;
pub mod collection;
pub mod competitors;
pub mod error;
pub mod news;
pub mod webhooks;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use ridewatch_core::store::IntelStore;
use ridewatch_ingest::WebhookProcessor;
use ridewatch_news::NewsScraper;
use serde::Deserialize;
use serde_json::{Value, json};

pub use auth::WebhookAuth;
pub use error::ApiError;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub processor: Arc<WebhookProcessor<S>>,
  pub news:      Arc<NewsScraper<S>>,
  pub auth:      Arc<WebhookAuth>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      processor: self.processor.clone(),
      news:      self.news.clone(),
      auth:      self.auth.clone(),
    }
  }
}

/// `?limit=` for list endpoints; defaults to 50, capped at 500.
#[derive(Debug, Deserialize, Default)]
pub struct LimitParams {
  pub limit: Option<usize>,
}

impl LimitParams {
  pub fn get(&self) -> usize { self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: IntelStore + 'static,
{
  Router::new()
    // Ingestion
    .route("/webhooks/octoparse", post(webhooks::octoparse::<S>))
    // News
    .route("/news", get(news::list::<S>))
    .route("/news/search", post(news::search::<S>))
    .route("/news/scan", post(news::scan::<S>))
    .route("/news/providers", get(news::providers::<S>))
    .route("/news/competitors/{slug}", post(news::competitor::<S>))
    // Diagnostics
    .route("/competitors", get(competitors::list::<S>))
    .route("/competitors/{slug}/releases", get(competitors::releases::<S>))
    .route("/competitors/{slug}/reviews", get(competitors::reviews::<S>))
    .route("/collection/logs", get(collection::logs::<S>))
    .route("/collection/status", get(collection::status::<S>))
    .route("/health", get(health))
    .with_state(state)
}

/// `GET /health`
async fn health() -> Json<Value> {
  Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}
