//! Handlers for `/indices` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/indices` | Sorted by name |
//! | `POST`   | `/indices` | Body: `{"name":"people","title":…,"schema":…}` |
//! | `GET`    | `/indices/{index}` | 404 if not found |
//! | `PUT`    | `/indices/{index}` | Body: `{"title":…,"schema":…}`, replaces both |
//! | `DELETE` | `/indices/{index}` | Drops the index and all its records |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use vellum_core::index::{Index, IndexRegistry, IndexUpdate, NewIndex};

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /indices`
pub async fn list<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Index>>, ApiError>
where
  S: IndexRegistry,
{
  Ok(Json(state.store.list_indices().await?))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /indices`
pub async fn create<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Json(body): Json<NewIndex>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IndexRegistry,
{
  let index = state.store.create_index(body).await?;
  Ok((StatusCode::CREATED, Json(index)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /indices/{index}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<Json<Index>, ApiError>
where
  S: IndexRegistry,
{
  Ok(Json(state.store.get_index(&name).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /indices/{index}`
pub async fn update<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
  Json(body): Json<IndexUpdate>,
) -> Result<Json<Index>, ApiError>
where
  S: IndexRegistry,
{
  Ok(Json(state.store.update_index(&name, body).await?))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /indices/{index}`
pub async fn delete<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(name): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: IndexRegistry,
{
  state.store.delete_index(&name).await?;
  Ok(StatusCode::NO_CONTENT)
}
