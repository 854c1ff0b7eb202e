//! Startup errors for the server.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("webhook_secret_hash is not an argon2 PHC string")]
  InvalidSecretHash,

  #[error("store error: {0}")]
  Store(#[from] ridewatch_store_sqlite::Error),

  #[error("search setup failed: {0}")]
  Search(#[from] ridewatch_news::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
