//! Error type for `ridewatch-news`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{provider} api error ({status}): {body}")]
  Api {
    provider: &'static str,
    status:   u16,
    body:     String,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unexpected response shape: {0}")]
  Shape(&'static str),

  #[error("text generation error: {0}")]
  Generate(#[from] ridewatch_ai::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
