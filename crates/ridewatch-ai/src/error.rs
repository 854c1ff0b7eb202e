//! Error type for `ridewatch-ai`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("api error ({status}): {body}")]
  Api { status: u16, body: String },

  #[error("response contained no text")]
  EmptyResponse,

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("request timed out after {0}s")]
  Timeout(u64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
