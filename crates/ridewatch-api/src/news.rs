//! Handlers for `/news` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/news` | Optional `?limit=` |
//! | `POST` | `/news/search` | Body: `{"query":"…","competitors":[…],"language":"es","provider":"Tavily"}` |
//! | `POST` | `/news/scan` | Runs every market query |
//! | `GET`  | `/news/providers` | Which search providers are configured |
//! | `POST` | `/news/competitors/:slug` | Optional `?category=` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use ridewatch_core::{model::NewsItem, store::IntelStore};
use ridewatch_news::{MarketScan, NewsQuery, ProviderStatus};
use serde::{Deserialize, Serialize};

use crate::{ApiState, LimitParams, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SearchResponse {
  pub query:   String,
  /// Only the items this search stored for the first time.
  pub results: Vec<NewsItem>,
  pub count:   usize,
}

impl SearchResponse {
  fn new(query: String, results: Vec<NewsItem>) -> Self {
    Self { query, count: results.len(), results }
  }
}

// ─── Search ───────────────────────────────────────────────────────────────────

/// `POST /news/search`
pub async fn search<S>(
  State(state): State<ApiState<S>>,
  Json(query): Json<NewsQuery>,
) -> Result<Json<SearchResponse>, ApiError>
where
  S: IntelStore + 'static,
{
  if query.query.trim().is_empty() {
    return Err(ApiError::BadRequest("query must not be empty".into()));
  }
  let results = state.news.search(&query).await.map_err(ApiError::store)?;
  Ok(Json(SearchResponse::new(query.query, results)))
}

#[derive(Debug, Deserialize)]
pub struct CompetitorParams {
  pub category: Option<String>,
}

/// `POST /news/competitors/:slug[?category=<slug>]`
pub async fn competitor<S>(
  State(state): State<ApiState<S>>,
  Path(slug): Path<String>,
  Query(params): Query<CompetitorParams>,
) -> Result<Json<SearchResponse>, ApiError>
where
  S: IntelStore + 'static,
{
  let results = state
    .news
    .search_competitor_news(&slug, params.category.as_deref())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(SearchResponse::new(slug, results)))
}

/// `POST /news/scan`
pub async fn scan<S>(State(state): State<ApiState<S>>) -> Json<MarketScan>
where
  S: IntelStore + 'static,
{
  Json(state.news.run_market_scan().await)
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /news[?limit=<n>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<NewsItem>>, ApiError>
where
  S: IntelStore + 'static,
{
  let items = state
    .store
    .list_news_items(params.get())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(items))
}

/// `GET /news/providers`
pub async fn providers<S>(State(state): State<ApiState<S>>) -> Json<ProviderStatus>
where
  S: IntelStore + 'static,
{
  Json(state.news.providers().status())
}
