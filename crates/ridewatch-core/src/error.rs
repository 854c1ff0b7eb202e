//! Error types for `ridewatch-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A stored discriminant string did not match any enum variant.
  #[error("unknown {kind} value: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
