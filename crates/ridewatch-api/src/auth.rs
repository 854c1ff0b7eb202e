//! `X-Webhook-Secret` extractor and standalone verifier.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use ridewatch_core::store::IntelStore;

use crate::{ApiState, error::ApiError};

pub const SECRET_HEADER: &str = "x-webhook-secret";

/// The shared secret scrapers must present, stored as a hash.
#[derive(Clone)]
pub struct WebhookAuth {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub secret_hash: String,
}

/// Zero-size marker: present in the handler means the sender knew the secret.
pub struct WebhookAuthorized;

/// Check the secret header against the configured hash.
pub fn verify_secret(headers: &HeaderMap, auth: &WebhookAuth) -> Result<(), ApiError> {
  let secret = headers
    .get(SECRET_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&auth.secret_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(secret.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)
}

impl<S> FromRequestParts<ApiState<S>> for WebhookAuthorized
where
  S: IntelStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_secret(&parts.headers, &state.auth)?;
    Ok(WebhookAuthorized)
  }
}

#[cfg(test)]
mod tests {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  use super::*;

  fn auth(secret: &str) -> WebhookAuth {
    let salt = SaltString::generate(&mut OsRng);
    let secret_hash = Argon2::default()
      .hash_password(secret.as_bytes(), &salt)
      .unwrap()
      .to_string();
    WebhookAuth { secret_hash }
  }

  fn headers(secret: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(SECRET_HEADER, HeaderValue::from_str(secret).unwrap());
    headers
  }

  #[test]
  fn correct_secret() {
    assert!(verify_secret(&headers("s3cret"), &auth("s3cret")).is_ok());
  }

  #[test]
  fn wrong_secret() {
    assert!(matches!(
      verify_secret(&headers("guess"), &auth("s3cret")),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    assert!(matches!(
      verify_secret(&HeaderMap::new(), &auth("s3cret")),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn malformed_hash_rejects_everything() {
    let auth = WebhookAuth { secret_hash: "plaintext".into() };
    assert!(verify_secret(&headers("plaintext"), &auth).is_err());
  }
}
