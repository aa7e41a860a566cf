//! Handlers for `/indices/{index}/records` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/records` | Body: `{"records":[{"id":"a","data":{…}}]}`, all or nothing |
//! | `GET`    | `/records` | `?filter=&since=&not_touched_since=&cursor=&limit=` |
//! | `DELETE` | `/records` | Clears heads and history; the index stays |
//! | `GET`    | `/records/{id}` | Current head |
//! | `GET`    | `/records/{id}/history` | `?since=&cursor=&limit=`, newest first |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use vellum_core::{
  index::IndexRegistry,
  record::{LogEntry, Page, Pushed, Record, RecordUpdate, Revision},
  store::{FindQuery, HistoryQuery, RecordStore},
};

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Push ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PushBody {
  pub records: Vec<PushRecord>,
}

/// `data` is kept as raw JSON so the stored bytes are exactly what the client
/// sent.
#[derive(Debug, Deserialize)]
pub struct PushRecord {
  pub id:   String,
  pub data: Box<RawValue>,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
  pub pushed: Vec<Pushed>,
}

/// `POST /indices/{index}/records`
pub async fn push<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(index): Path<String>,
  Json(body): Json<PushBody>,
) -> Result<Json<PushResponse>, ApiError>
where
  S: RecordStore + IndexRegistry,
{
  let index_id = state.store.get_index(&index).await?.id;
  let updates = body
    .records
    .into_iter()
    .map(|r| RecordUpdate::new(index_id, r.id, r.data.get()))
    .collect();

  let pushed = state.store.push(updates).await?;
  Ok(Json(PushResponse { pushed }))
}

// ─── Find ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct FindParams {
  pub filter:            Option<String>,
  pub since:             Option<DateTime<Utc>>,
  pub not_touched_since: Option<DateTime<Utc>>,
  pub cursor:            Option<i64>,
  pub limit:             Option<usize>,
}

impl From<FindParams> for FindQuery {
  fn from(p: FindParams) -> Self {
    FindQuery {
      filter:            p.filter,
      since:             p.since,
      cursor:            p.cursor.map(Revision).unwrap_or_default(),
      limit:             p.limit.unwrap_or_default(),
      not_touched_since: p.not_touched_since,
    }
  }
}

/// `GET /indices/{index}/records`
pub async fn find<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(index): Path<String>,
  Query(params): Query<FindParams>,
) -> Result<Json<Page<Record>>, ApiError>
where
  S: RecordStore,
{
  let query = FindQuery::from(params);
  Ok(Json(state.store.find(&index, &query).await?))
}

// ─── Clear ───────────────────────────────────────────────────────────────────

/// `DELETE /indices/{index}/records`
pub async fn clear<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path(index): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  state.store.clear(&index).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /indices/{index}/records/{id}`
pub async fn get_one<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path((index, id)): Path<(String, String)>,
) -> Result<Json<Record>, ApiError>
where
  S: RecordStore,
{
  Ok(Json(state.store.get(&index, &id).await?))
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
  pub since:  Option<DateTime<Utc>>,
  pub cursor: Option<i64>,
  pub limit:  Option<usize>,
}

impl From<HistoryParams> for HistoryQuery {
  fn from(p: HistoryParams) -> Self {
    HistoryQuery {
      since:  p.since,
      cursor: p.cursor.map(Revision).unwrap_or_default(),
      limit:  p.limit.unwrap_or_default(),
    }
  }
}

/// `GET /indices/{index}/records/{id}/history`
pub async fn history<S>(
  _: Authenticated,
  State(state): State<AppState<S>>,
  Path((index, id)): Path<(String, String)>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Page<LogEntry>>, ApiError>
where
  S: RecordStore,
{
  let query = HistoryQuery::from(params);
  Ok(Json(state.store.history(&index, &id, &query).await?))
}
