//! Handler for `POST /webhooks/octoparse`.
//!
//! Requires the `X-Webhook-Secret` header. Processing problems never surface
//! as HTTP errors: the sender gets `200` with the collection status, so it
//! does not retry a batch that was already half-written.

use axum::{Json, extract::State};
use ridewatch_core::{model::CollectionStatus, store::IntelStore};
use ridewatch_ingest::WebhookPayload;
use serde::Serialize;
use serde_json::Value;

use crate::{ApiState, auth::WebhookAuthorized, error::ApiError};

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
  pub status:    CollectionStatus,
  pub processed: u32,
  pub task_name: String,
}

/// `POST /webhooks/octoparse` — body: `{"taskId":…,"taskName":…,"dataList":[…]}`
pub async fn octoparse<S>(
  State(state): State<ApiState<S>>,
  _: WebhookAuthorized,
  Json(body): Json<Value>,
) -> Result<Json<WebhookResponse>, ApiError>
where
  S: IntelStore + 'static,
{
  let payload: WebhookPayload = serde_json::from_value(body)
    .map_err(|e| ApiError::BadRequest(format!("invalid webhook payload: {e}")))?;

  let task_name = payload.task_name.clone();
  let outcome = state.processor.process(payload).await;
  Ok(Json(WebhookResponse {
    status: outcome.status,
    processed: outcome.processed,
    task_name,
  }))
}
