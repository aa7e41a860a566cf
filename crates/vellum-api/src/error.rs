//! API error type and [`axum::response::IntoResponse`] implementation.

use std::error::Error as _;

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use vellum_core::ErrorKind;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error(transparent)]
  Core(#[from] vellum_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let err = match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"vellum\""),
        );
        return res;
      }
      ApiError::Core(err) => err,
    };

    let status = match err.kind() {
      ErrorKind::EmptyArgument | ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::AlreadyExists => StatusCode::CONFLICT,
      ErrorKind::Internal => {
        // Storage details stay in the log; the caller only gets a token to
        // quote back.
        let token = Uuid::new_v4();
        tracing::error!(%token, error = %chain(&err), "request failed");
        return (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": err.to_string(), "token": token })),
        )
          .into_response();
      }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
  }
}

/// Render an error and all of its sources as `outer: inner: ...`.
fn chain(err: &vellum_core::Error) -> String {
  let mut out = err.to_string();
  let mut source = err.source();
  while let Some(e) = source {
    out.push_str(": ");
    out.push_str(&e.to_string());
    source = e.source();
  }
  out
}
