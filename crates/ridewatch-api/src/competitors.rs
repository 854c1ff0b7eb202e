//! Handlers for `/competitors` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/competitors` | |
//! | `GET`  | `/competitors/{slug}/releases` | Optional `?limit=` |
//! | `GET`  | `/competitors/{slug}/reviews` | Optional `?limit=` |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use ridewatch_core::{
  model::{Competitor, Release, Review},
  store::IntelStore,
};

use crate::{ApiState, LimitParams, error::ApiError};

/// `GET /competitors`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<Vec<Competitor>>, ApiError>
where
  S: IntelStore + 'static,
{
  let competitors = state
    .store
    .list_competitors()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(competitors))
}

async fn find<S>(state: &ApiState<S>, slug: &str) -> Result<Competitor, ApiError>
where
  S: IntelStore + 'static,
{
  state
    .store
    .find_competitor_by_slug(slug)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("competitor {slug} not found")))
}

/// `GET /competitors/{slug}/releases[?limit=<n>]`
pub async fn releases<S>(
  State(state): State<ApiState<S>>,
  Path(slug): Path<String>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Release>>, ApiError>
where
  S: IntelStore + 'static,
{
  let competitor = find(&state, &slug).await?;
  let releases = state
    .store
    .list_releases(competitor.competitor_id, params.get())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(releases))
}

/// `GET /competitors/{slug}/reviews[?limit=<n>]`
pub async fn reviews<S>(
  State(state): State<ApiState<S>>,
  Path(slug): Path<String>,
  Query(params): Query<LimitParams>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: IntelStore + 'static,
{
  let competitor = find(&state, &slug).await?;
  let reviews = state
    .store
    .list_reviews(competitor.competitor_id, params.get())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reviews))
}
