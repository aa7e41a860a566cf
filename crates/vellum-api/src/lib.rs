//! JSON REST API for Vellum.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`RecordStore`] and [`IndexRegistry`], plus the [`ServerConfig`] the
//! `vellum-server` binary loads.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` `POST` | `/indices` | list / create |
//! | `GET` `PUT` `DELETE` | `/indices/{index}` | |
//! | `GET` `POST` `DELETE` | `/indices/{index}/records` | find / push / clear |
//! | `GET` | `/indices/{index}/records/{id}` | |
//! | `GET` | `/indices/{index}/records/{id}/history` | newest first |

pub mod auth;
pub mod error;
pub mod indices;
pub mod records;
pub mod settings;

pub use error::ApiError;
pub use settings::ServerConfig;

use std::{sync::Arc, time::Duration};

use axum::{Router, http::StatusCode, routing::get};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use vellum_core::{index::IndexRegistry, store::RecordStore};

use auth::AuthConfig;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Option<Arc<AuthConfig>>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, config: ServerConfig) -> Self {
    Self {
      store,
      auth: config.auth().map(Arc::new),
      config: Arc::new(config),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`, wrapped in request tracing and the
/// configured request timeout.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + IndexRegistry + Clone + 'static,
{
  let timeout = Duration::from_secs(state.config.request_timeout_secs);

  Router::new()
    // Indices
    .route("/indices", get(indices::list::<S>).post(indices::create::<S>))
    .route(
      "/indices/{index}",
      get(indices::get_one::<S>)
        .put(indices::update::<S>)
        .delete(indices::delete::<S>),
    )
    // Records
    .route(
      "/indices/{index}/records",
      get(records::find::<S>)
        .post(records::push::<S>)
        .delete(records::clear::<S>),
    )
    .route("/indices/{index}/records/{id}", get(records::get_one::<S>))
    .route("/indices/{index}/records/{id}/history", get(records::history::<S>))
    .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use vellum_store_sqlite::SqliteStore;

  use super::*;

  async fn make_state(password: Option<&str>) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let hash = password.map(|p| auth::hash_password(p).unwrap());

    AppState::new(Arc::new(store), ServerConfig {
      auth_username: hash.as_ref().map(|_| "user".to_string()),
      auth_password_hash: hash,
      ..ServerConfig::default()
    })
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn send(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    headers: Vec<(header::HeaderName, &str)>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();

    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn call(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    send(state, method, uri, vec![], body).await
  }

  fn record_ids(page: &Value) -> Vec<&str> {
    page["items"]
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["record_id"].as_str().unwrap())
      .collect()
  }

  // ── Indices ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn index_lifecycle() {
    let state = make_state(None).await;

    let (status, body) = call(
      &state,
      "POST",
      "/indices",
      Some(json!({ "name": "people", "title": "People" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "people");

    let (status, _) =
      call(&state, "POST", "/indices", Some(json!({ "name": "people" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
      call(&state, "POST", "/indices", Some(json!({ "name": "Bad Name" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&state, "GET", "/indices", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(
      &state,
      "PUT",
      "/indices/people",
      Some(json!({ "title": "Humans" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Humans");

    let (status, _) = call(&state, "DELETE", "/indices/people", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(&state, "GET", "/indices/people", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "index not found: people");
  }

  // ── Records ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn push_get_and_history() {
    let state = make_state(None).await;
    call(&state, "POST", "/indices", Some(json!({ "name": "people" }))).await;

    let push = json!({ "records": [{ "id": "ada", "data": { "name": "Ada" } }] });
    let (status, body) =
      call(&state, "POST", "/indices/people/records", Some(push.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pushed"][0]["changed"], true);
    let revision = body["pushed"][0]["revision"].clone();

    let (_, body) = call(&state, "POST", "/indices/people/records", Some(push)).await;
    assert_eq!(body["pushed"][0]["changed"], false);
    assert_eq!(body["pushed"][0]["revision"], revision);

    let (status, body) = call(&state, "GET", "/indices/people/records/ada", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "name": "Ada" }));
    assert_eq!(body["revision"], revision);
    assert_eq!(body["checksum"].as_str().unwrap().len(), 64);

    let (status, body) =
      call(&state, "GET", "/indices/people/records/ada/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["next_cursor"], 0);

    let (status, _) = call(&state, "GET", "/indices/people/records/bob", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn push_rejections() {
    let state = make_state(None).await;
    call(
      &state,
      "POST",
      "/indices",
      Some(json!({
        "name": "people",
        "schema": { "type": "object", "required": ["name"] }
      })),
    )
    .await;

    let (status, _) = call(
      &state,
      "POST",
      "/indices/nowhere/records",
      Some(json!({ "records": [{ "id": "a", "data": {} }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
      &state,
      "POST",
      "/indices/people/records",
      Some(json!({ "records": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "updates must not be empty");

    let (status, _) = call(
      &state,
      "POST",
      "/indices/people/records",
      Some(json!({ "records": [{ "id": "a", "data": { "age": 1 } }] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn find_filters_and_pages() {
    let state = make_state(None).await;
    call(&state, "POST", "/indices", Some(json!({ "name": "produce" }))).await;
    call(
      &state,
      "POST",
      "/indices/produce/records",
      Some(json!({ "records": [
        { "id": "apple", "data": { "kind": "fruit", "price": 2 } },
        { "id": "kiwi",  "data": { "kind": "fruit", "price": 4 } },
        { "id": "leek",  "data": { "kind": "veg",   "price": 1 } },
      ] })),
    )
    .await;

    let (status, body) = call(
      &state,
      "GET",
      "/indices/produce/records?filter=kind%3Dfruit%20%26%26%20price%3C3",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record_ids(&body), ["apple"]);

    let mut seen = Vec::new();
    let mut cursor = 0;
    loop {
      let (_, body) = call(
        &state,
        "GET",
        &format!("/indices/produce/records?limit=1&cursor={cursor}"),
        None,
      )
      .await;
      seen.extend(record_ids(&body).into_iter().map(str::to_owned));
      cursor = body["next_cursor"].as_i64().unwrap();
      if cursor == 0 {
        break;
      }
    }
    assert_eq!(seen, ["apple", "kiwi", "leek"]);

    let (status, body) = call(
      &state,
      "GET",
      "/indices/produce/records?filter=foo%20bar",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
      body["error"],
      "invalid filter: operator expected at position 4: foo ..."
    );
  }

  #[tokio::test]
  async fn clear_empties_the_index() {
    let state = make_state(None).await;
    call(&state, "POST", "/indices", Some(json!({ "name": "people" }))).await;
    call(
      &state,
      "POST",
      "/indices/people/records",
      Some(json!({ "records": [{ "id": "ada", "data": {} }] })),
    )
    .await;

    let (status, _) = call(&state, "DELETE", "/indices/people/records", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = call(&state, "GET", "/indices/people/records", None).await;
    assert!(record_ids(&body).is_empty());

    let (status, _) = call(&state, "DELETE", "/indices/ghost/records", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  // ── Auth ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn credentials_are_enforced_when_configured() {
    let state = make_state(Some("secret")).await;

    let (status, _) = call(&state, "GET", "/indices", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = auth_header("user", "nope");
    let (status, _) = send(
      &state,
      "GET",
      "/indices",
      vec![(header::AUTHORIZATION, wrong.as_str())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let right = auth_header("user", "secret");
    let (status, _) = send(
      &state,
      "GET",
      "/indices",
      vec![(header::AUTHORIZATION, right.as_str())],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }
}
