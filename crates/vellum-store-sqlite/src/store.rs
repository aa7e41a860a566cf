//! The SQLite implementation of [`RecordStore`] for [`SqliteStore`].
//!
//! Every public operation runs as one closure on the connection thread and
//! opens exactly one transaction. `rusqlite::Transaction` rolls back when
//! dropped, so any `?` inside a closure abandons the whole operation.

use std::{
  collections::{HashMap, hash_map::Entry},
  fmt::Write as _,
  path::Path,
  sync::Arc,
};

use chrono::Utc;
use rusqlite::{
  Connection, OptionalExtension as _, TransactionBehavior, params, params_from_iter,
  types::Value as SqlValue,
};
use serde_json::Value;
use vellum_core::{
  Error as CoreError,
  index::IndexId,
  record::{Checksum, LogEntry, Page, Pushed, Record, RecordUpdate, Revision},
  store::{FindQuery, HistoryQuery, RecordStore, effective_limit},
  validate::{
    DefaultRecordIdValidator, JsonSchemaValidator, RecordIdValidator,
    SchemaValidator,
  },
};

use crate::{
  Result,
  encode::{
    LOG_COLUMNS, RECORD_COLUMNS, RawLogEntry, RawRecord, decode_schema, encode_dt,
    encode_param,
  },
  schema::SCHEMA,
};

// ─── Validators ──────────────────────────────────────────────────────────────

/// The validation capabilities a store applies to incoming writes.
#[derive(Clone)]
pub struct Validators {
  pub record_id: Arc<dyn RecordIdValidator>,
  pub schema:    Arc<dyn SchemaValidator>,
}

impl Default for Validators {
  fn default() -> Self {
    Self {
      record_id: Arc::new(DefaultRecordIdValidator),
      schema:    Arc::new(JsonSchemaValidator),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vellum record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:       tokio_rusqlite::Connection,
  pub(crate) validators: Validators,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, validators: Validators::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, validators: Validators::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the validation capabilities.
  pub fn with_validators(mut self, validators: Validators) -> Self {
    self.validators = validators;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn push_batch(&self, updates: Vec<RecordUpdate>) -> Result<Vec<Pushed>> {
    if updates.is_empty() {
      return Err(CoreError::EmptyArgument { subject: "updates" }.into());
    }
    if let Some(u) = updates.iter().find(|u| u.index_id.is_unresolved()) {
      return Err(
        CoreError::invalid(
          "index id",
          format!("record {:?} has no resolved index", u.record_id),
        )
        .into(),
      );
    }

    let validators = self.validators.clone();
    let batch = updates.len();

    let pushed = self
      .conn
      .call(move |conn| Ok(apply_batch(conn, updates, &validators)))
      .await??;

    let appended = pushed.iter().filter(|p| p.changed).count();
    tracing::debug!(batch, appended, touched = batch - appended, "push committed");
    Ok(pushed)
  }

  async fn get_head(&self, index: &str, record_id: &str) -> Result<Record> {
    let index = index.to_owned();
    let record_id = record_id.to_owned();

    let raw = self
      .conn
      .call(move |conn| Ok(read_head(conn, &index, &record_id)))
      .await??;

    raw.into_record()
  }

  async fn find_heads(&self, index: &str, query: &FindQuery) -> Result<Page<Record>> {
    let index = index.to_owned();
    let query = query.clone();
    let limit = effective_limit(query.limit);

    let raws = self
      .conn
      .call(move |conn| Ok(scan_heads(conn, &index, &query, limit)))
      .await??;

    let records = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Vec<_>>>()?;
    Ok(paginate(records, limit, |r| r.revision))
  }

  async fn log_entries(
    &self,
    index: &str,
    record_id: &str,
    query: &HistoryQuery,
  ) -> Result<Page<LogEntry>> {
    let index = index.to_owned();
    let record_id = record_id.to_owned();
    let query = query.clone();
    let limit = effective_limit(query.limit);

    let raws = self
      .conn
      .call(move |conn| Ok(scan_log(conn, &index, &record_id, &query, limit)))
      .await??;

    let entries = raws
      .into_iter()
      .map(RawLogEntry::into_entry)
      .collect::<Result<Vec<_>>>()?;
    Ok(paginate(entries, limit, |e| e.revision))
  }

  async fn clear_index(&self, index: &str) -> Result<()> {
    let name = index.to_owned();

    let removed = self
      .conn
      .call(move |conn| Ok(clear_contents(conn, &name)))
      .await??;

    if let Some((heads, entries)) = removed {
      tracing::info!(index, heads, entries, "index cleared");
    }
    Ok(())
  }
}

// ─── Transaction bodies ──────────────────────────────────────────────────────

/// Apply a validated-shape batch inside one IMMEDIATE transaction. Taking the
/// write lock up front makes the checksum lookup and the write that depends
/// on it atomic with respect to other writers. The batch timestamp is read
/// under that lock, so timestamps follow revision order across batches.
fn apply_batch(
  conn: &mut Connection,
  updates: Vec<RecordUpdate>,
  validators: &Validators,
) -> Result<Vec<Pushed>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let now = encode_dt(Utc::now());
  let mut schemas: HashMap<IndexId, Option<Value>> = HashMap::new();
  let mut pushed = Vec::with_capacity(updates.len());

  {
    let mut schema_stmt = tx.prepare_cached("SELECT schema FROM indices WHERE id = ?1")?;
    let mut head_stmt = tx.prepare_cached(
      "SELECT log_id FROM records
       WHERE record_id = ?1 AND index_id = ?2 AND checksum = ?3",
    )?;
    let mut touch_stmt = tx.prepare_cached(
      "UPDATE records SET touched_at = ?3 WHERE record_id = ?1 AND index_id = ?2",
    )?;
    let mut append_stmt = tx.prepare_cached(
      "INSERT INTO record_log (index_id, record_id, data, created_at)
       VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut upsert_stmt = tx.prepare_cached(
      "INSERT INTO records
         (record_id, index_id, log_id, checksum, created_at, updated_at, touched_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5)
       ON CONFLICT (record_id, index_id) DO UPDATE SET
         log_id     = excluded.log_id,
         checksum   = excluded.checksum,
         updated_at = excluded.updated_at,
         touched_at = excluded.touched_at",
    )?;

    for update in updates {
      let RecordUpdate { record_id, index_id, data } = update;

      if record_id.is_empty() {
        return Err(CoreError::EmptyArgument { subject: "record id" }.into());
      }
      validators
        .record_id
        .validate(&record_id)
        .map_err(|reason| CoreError::invalid("record id", format!("{record_id:?}: {reason}")))?;

      let schema = match schemas.entry(index_id) {
        Entry::Occupied(e) => e.into_mut(),
        Entry::Vacant(e) => {
          let raw: Option<String> = schema_stmt
            .query_row(params![index_id.0], |r| r.get(0))
            .optional()?
            .ok_or_else(|| CoreError::not_found("index", index_id))?;
          e.insert(raw.as_deref().map(decode_schema).transpose()?)
        }
      };

      if data.trim().is_empty() {
        return Err(CoreError::EmptyArgument { subject: "data" }.into());
      }
      let document: Value = serde_json::from_str(&data).map_err(|e| {
        CoreError::invalid("data", format!("record {record_id:?}: {e}"))
      })?;
      if let Some(schema) = schema.as_ref() {
        validators.schema.validate(schema, &document).map_err(|reason| {
          CoreError::invalid("data", format!("record {record_id:?}: {reason}"))
        })?;
      }

      let checksum = Checksum::compute(data.as_bytes(), index_id, &record_id);
      let sum = &checksum.as_bytes()[..];

      let unchanged: Option<i64> = head_stmt
        .query_row(params![record_id, index_id.0, sum], |r| r.get(0))
        .optional()?;

      let (revision, changed) = match unchanged {
        Some(log_id) => {
          touch_stmt.execute(params![record_id, index_id.0, now])?;
          (Revision(log_id), false)
        }
        None => {
          let log_id = append_stmt.insert(params![index_id.0, record_id, data, now])?;
          upsert_stmt.execute(params![record_id, index_id.0, log_id, sum, now])?;
          (Revision(log_id), true)
        }
      };

      pushed.push(Pushed { record_id, revision, changed });
    }
  }

  tx.commit()?;
  Ok(pushed)
}

fn read_head(conn: &mut Connection, index: &str, record_id: &str) -> Result<RawRecord> {
  let tx = conn.transaction()?;
  let index_id = resolve_index(&tx, index)?;
  let raw = tx
    .query_row(
      &format!(
        "SELECT {RECORD_COLUMNS}
         FROM records r JOIN record_log l ON l.id = r.log_id
         WHERE r.index_id = ?1 AND r.record_id = ?2"
      ),
      params![index_id.0, record_id],
      RawRecord::from_row,
    )
    .optional()?
    .ok_or_else(|| CoreError::not_found("record", record_id))?;
  tx.commit()?;
  Ok(raw)
}

fn scan_heads(
  conn: &mut Connection,
  index: &str,
  query: &FindQuery,
  limit: usize,
) -> Result<Vec<RawRecord>> {
  let tx = conn.transaction()?;
  let index_id = resolve_index(&tx, index)?;

  let mut sql = format!(
    "SELECT {RECORD_COLUMNS}
     FROM records r JOIN record_log l ON l.id = r.log_id
     WHERE r.index_id = ?1 AND r.log_id > ?2"
  );
  let mut args: Vec<SqlValue> =
    vec![SqlValue::Integer(index_id.0), SqlValue::Integer(query.cursor.0)];

  if let Some(since) = query.since {
    args.push(SqlValue::Text(encode_dt(since)));
    let _ = write!(sql, " AND r.updated_at >= ?{}", args.len());
  }
  if let Some(cutoff) = query.not_touched_since {
    args.push(SqlValue::Text(encode_dt(cutoff)));
    let _ = write!(sql, " AND r.touched_at < ?{}", args.len());
  }
  if let Some(filter) = query.filter.as_deref().filter(|f| !f.trim().is_empty()) {
    let predicate = vellum_query::compile(filter, "l.data", args.len() + 1)
      .map_err(|e| CoreError::invalid("filter", e.to_string()))?;
    // Parenthesised so a trailing `OR` cannot escape the fixed constraints.
    let _ = write!(sql, " AND ({})", predicate.sql);
    args.extend(predicate.params.into_iter().map(encode_param));
  }
  args.push(SqlValue::Integer(limit as i64 + 1));
  let _ = write!(sql, " ORDER BY r.log_id ASC LIMIT ?{}", args.len());

  let raws = {
    let mut stmt = tx.prepare(&sql)?;
    stmt
      .query_map(params_from_iter(args.iter()), RawRecord::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  tx.commit()?;
  Ok(raws)
}

fn scan_log(
  conn: &mut Connection,
  index: &str,
  record_id: &str,
  query: &HistoryQuery,
  limit: usize,
) -> Result<Vec<RawLogEntry>> {
  let tx = conn.transaction()?;
  let index_id = resolve_index(&tx, index)?;

  let mut sql = format!(
    "SELECT {LOG_COLUMNS} FROM record_log WHERE index_id = ?1 AND record_id = ?2"
  );
  let mut args: Vec<SqlValue> =
    vec![SqlValue::Integer(index_id.0), SqlValue::Text(record_id.to_owned())];

  if !query.cursor.is_zero() {
    args.push(SqlValue::Integer(query.cursor.0));
    let _ = write!(sql, " AND id < ?{}", args.len());
  }
  if let Some(since) = query.since {
    args.push(SqlValue::Text(encode_dt(since)));
    let _ = write!(sql, " AND created_at >= ?{}", args.len());
  }
  args.push(SqlValue::Integer(limit as i64 + 1));
  let _ = write!(sql, " ORDER BY id DESC LIMIT ?{}", args.len());

  let raws = {
    let mut stmt = tx.prepare(&sql)?;
    stmt
      .query_map(params_from_iter(args.iter()), RawLogEntry::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  tx.commit()?;
  Ok(raws)
}

/// Returns `None` when the index does not exist, else the removed
/// `(heads, log entries)` counts.
fn clear_contents(conn: &mut Connection, name: &str) -> Result<Option<(usize, usize)>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let Some(index_id) = lookup_index(&tx, name)? else {
    return Ok(None);
  };
  let counts = delete_index_contents(&tx, index_id)?;
  tx.commit()?;
  Ok(Some(counts))
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

pub(crate) fn lookup_index(conn: &Connection, name: &str) -> Result<Option<IndexId>> {
  Ok(
    conn
      .query_row("SELECT id FROM indices WHERE name = ?1", params![name], |r| {
        r.get(0).map(IndexId)
      })
      .optional()?,
  )
}

pub(crate) fn resolve_index(conn: &Connection, name: &str) -> Result<IndexId> {
  lookup_index(conn, name)?.ok_or_else(|| CoreError::not_found("index", name).into())
}

/// Delete every head, then every log entry, of `index_id`. Returns both
/// counts.
pub(crate) fn delete_index_contents(
  conn: &Connection,
  index_id: IndexId,
) -> Result<(usize, usize)> {
  let heads = conn.execute("DELETE FROM records WHERE index_id = ?1", params![index_id.0])?;
  let entries =
    conn.execute("DELETE FROM record_log WHERE index_id = ?1", params![index_id.0])?;
  Ok((heads, entries))
}

/// Trim a `limit + 1` fetch to `limit` rows. When the extra row was present,
/// the last kept row's revision is where the next page starts.
fn paginate<T>(mut items: Vec<T>, limit: usize, revision: impl Fn(&T) -> Revision) -> Page<T> {
  let next_cursor = if items.len() > limit {
    items.truncate(limit);
    items.last().map(revision).unwrap_or_default()
  } else {
    Revision::ZERO
  };
  Page { items, next_cursor }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  async fn push(&self, updates: Vec<RecordUpdate>) -> vellum_core::Result<Vec<Pushed>> {
    self.push_batch(updates).await.map_err(|e| e.into_core("push"))
  }

  async fn get(&self, index: &str, record_id: &str) -> vellum_core::Result<Record> {
    self
      .get_head(index, record_id)
      .await
      .map_err(|e| e.into_core("get"))
  }

  async fn find(&self, index: &str, query: &FindQuery) -> vellum_core::Result<Page<Record>> {
    self
      .find_heads(index, query)
      .await
      .map_err(|e| e.into_core("find"))
  }

  async fn history(
    &self,
    index: &str,
    record_id: &str,
    query: &HistoryQuery,
  ) -> vellum_core::Result<Page<LogEntry>> {
    self
      .log_entries(index, record_id, query)
      .await
      .map_err(|e| e.into_core("history"))
  }

  async fn clear(&self, index: &str) -> vellum_core::Result<()> {
    self.clear_index(index).await.map_err(|e| e.into_core("clear"))
  }
}
