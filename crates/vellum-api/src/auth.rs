//! Optional HTTP Basic authentication.
//!
//! When the server is configured with credentials every route requires them;
//! otherwise [`Authenticated`] extracts unconditionally.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::OsRng;

use crate::{AppState, error::ApiError};

/// The single account allowed to use the API.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by [`hash_password`].
  pub password_hash: String,
}

impl AuthConfig {
  fn accepts(&self, username: &str, password: &str) -> bool {
    username == self.username
      && PasswordHash::new(&self.password_hash).is_ok_and(|hash| {
        Argon2::default()
          .verify_password(password.as_bytes(), &hash)
          .is_ok()
      })
  }
}

/// Hash `password` into the PHC string stored as `auth_password_hash`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// `(username, password)` from an `Authorization: Basic …` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = String::from_utf8(B64.decode(encoded).ok()?).ok()?;
  let (username, password) = decoded.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

/// Marker extractor: present in a handler means the caller may proceed.
pub struct Authenticated;

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Some(auth) = state.auth.as_deref() else {
      return Ok(Authenticated);
    };
    match basic_credentials(&parts.headers) {
      Some((user, pass)) if auth.accepts(&user, &pass) => Ok(Authenticated),
      Some((user, _)) => {
        tracing::warn!(user = %user, "rejected credentials");
        Err(ApiError::Unauthorized)
      }
      None => Err(ApiError::Unauthorized),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{body::Body, http::Request};

  use super::*;
  use crate::ServerConfig;

  fn make_state(password: Option<&str>) -> AppState<()> {
    let config = ServerConfig {
      auth_username: password.map(|_| "user".to_string()),
      auth_password_hash: password.map(|p| hash_password(p).unwrap()),
      ..ServerConfig::default()
    };
    AppState::new(Arc::new(()), config)
  }

  async fn extract(
    authorization: Option<&str>,
    state: &AppState<()>,
  ) -> Result<Authenticated, ApiError> {
    let mut builder = Request::builder();
    if let Some(value) = authorization {
      builder = builder.header(header::AUTHORIZATION, value);
    }
    let (mut parts, _) = builder.body(Body::empty()).unwrap().into_parts();
    Authenticated::from_request_parts(&mut parts, state).await
  }

  fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  #[test]
  fn credentials_are_decoded() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, basic("ops", "a:b").parse().unwrap());
    assert_eq!(
      basic_credentials(&headers),
      Some(("ops".to_string(), "a:b".to_string()))
    );

    headers.insert(header::AUTHORIZATION, "Bearer xyz".parse().unwrap());
    assert_eq!(basic_credentials(&headers), None);
  }

  #[tokio::test]
  async fn correct_credentials() {
    let state = make_state(Some("secret"));
    assert!(extract(Some(&basic("user", "secret")), &state).await.is_ok());
  }

  #[tokio::test]
  async fn wrong_password_or_user() {
    let state = make_state(Some("secret"));
    for value in [basic("user", "wrong"), basic("someone", "secret")] {
      assert!(matches!(
        extract(Some(&value), &state).await,
        Err(ApiError::Unauthorized)
      ));
    }
  }

  #[tokio::test]
  async fn missing_or_garbled_header() {
    let state = make_state(Some("secret"));
    for value in [None, Some("Basic !!!not-base64!!!")] {
      assert!(matches!(extract(value, &state).await, Err(ApiError::Unauthorized)));
    }
  }

  #[tokio::test]
  async fn open_server_needs_no_header() {
    let state = make_state(None);
    assert!(extract(None, &state).await.is_ok());
  }
}
