//! [`IndexRegistry`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, params};
use serde_json::Value;
use vellum_core::{
  Error as CoreError,
  index::{Index, IndexRegistry, IndexUpdate, NewIndex, validate_index_name},
};

use crate::{
  Result, SqliteStore,
  encode::{INDEX_COLUMNS, RawIndex, encode_dt, encode_schema},
  store::{delete_index_contents, resolve_index},
};

impl SqliteStore {
  /// Reject schemas that do not compile, then serialise for storage.
  fn prepare_schema(&self, schema: Option<&Value>) -> Result<Option<String>> {
    let Some(schema) = schema else { return Ok(None) };
    self
      .validators
      .schema
      .check_schema(schema)
      .map_err(|reason| CoreError::invalid("schema", reason))?;
    Ok(Some(encode_schema(schema)?))
  }

  async fn insert_index(&self, input: NewIndex) -> Result<Index> {
    validate_index_name(&input.name)?;
    let schema = self.prepare_schema(input.schema.as_ref())?;
    let now = encode_dt(Utc::now());
    let NewIndex { name, title, .. } = input;

    let raw = self
      .conn
      .call(move |conn| Ok(insert_row(conn, name, title, schema, &now)))
      .await??;

    tracing::info!(index = %raw.name, id = raw.id, "index created");
    raw.into_index()
  }

  async fn fetch_index(&self, name: &str) -> Result<Index> {
    let name = name.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(require_index(conn, &name)))
      .await??;
    raw.into_index()
  }

  async fn fetch_all(&self) -> Result<Vec<Index>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {INDEX_COLUMNS} FROM indices ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawIndex::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIndex::into_index).collect()
  }

  async fn replace_index(&self, name: &str, update: IndexUpdate) -> Result<Index> {
    let schema = self.prepare_schema(update.schema.as_ref())?;
    let now = encode_dt(Utc::now());
    let name = name.to_owned();
    let title = update.title;

    let raw = self
      .conn
      .call(move |conn| Ok(update_row(conn, &name, title, schema, &now)))
      .await??;

    raw.into_index()
  }

  async fn remove_index(&self, name: &str) -> Result<()> {
    let owned = name.to_owned();

    let (heads, entries) = self
      .conn
      .call(move |conn| Ok(delete_row(conn, &owned)))
      .await??;

    tracing::info!(index = name, heads, entries, "index deleted");
    Ok(())
  }
}

fn insert_row(
  conn: &mut Connection,
  name: String,
  title: Option<String>,
  schema: Option<String>,
  now: &str,
) -> Result<RawIndex> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  if read_index(&tx, &name)?.is_some() {
    return Err(CoreError::AlreadyExists { subject: "index", key: name }.into());
  }
  tx.execute(
    "INSERT INTO indices (name, title, schema, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?4)",
    params![name, title, schema, now],
  )?;
  let raw = require_index(&tx, &name)?;
  tx.commit()?;
  Ok(raw)
}

fn update_row(
  conn: &mut Connection,
  name: &str,
  title: Option<String>,
  schema: Option<String>,
  now: &str,
) -> Result<RawIndex> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let changed = tx.execute(
    "UPDATE indices SET title = ?2, schema = ?3, updated_at = ?4 WHERE name = ?1",
    params![name, title, schema, now],
  )?;
  if changed == 0 {
    return Err(CoreError::not_found("index", name).into());
  }
  let raw = require_index(&tx, name)?;
  tx.commit()?;
  Ok(raw)
}

/// Clear the index's contents and drop the index row itself.
fn delete_row(conn: &mut Connection, name: &str) -> Result<(usize, usize)> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let index_id = resolve_index(&tx, name)?;
  let counts = delete_index_contents(&tx, index_id)?;
  tx.execute("DELETE FROM indices WHERE id = ?1", params![index_id.0])?;
  tx.commit()?;
  Ok(counts)
}

fn read_index(conn: &Connection, name: &str) -> Result<Option<RawIndex>> {
  Ok(
    conn
      .query_row(
        &format!("SELECT {INDEX_COLUMNS} FROM indices WHERE name = ?1"),
        params![name],
        RawIndex::from_row,
      )
      .optional()?,
  )
}

fn require_index(conn: &Connection, name: &str) -> Result<RawIndex> {
  read_index(conn, name)?.ok_or_else(|| CoreError::not_found("index", name).into())
}

// ─── IndexRegistry impl ──────────────────────────────────────────────────────

impl IndexRegistry for SqliteStore {
  async fn create_index(&self, input: NewIndex) -> vellum_core::Result<Index> {
    self
      .insert_index(input)
      .await
      .map_err(|e| e.into_core("create index"))
  }

  async fn get_index(&self, name: &str) -> vellum_core::Result<Index> {
    self.fetch_index(name).await.map_err(|e| e.into_core("get index"))
  }

  async fn list_indices(&self) -> vellum_core::Result<Vec<Index>> {
    self.fetch_all().await.map_err(|e| e.into_core("list indices"))
  }

  async fn update_index(
    &self,
    name: &str,
    update: IndexUpdate,
  ) -> vellum_core::Result<Index> {
    self
      .replace_index(name, update)
      .await
      .map_err(|e| e.into_core("update index"))
  }

  async fn delete_index(&self, name: &str) -> vellum_core::Result<()> {
    self
      .remove_index(name)
      .await
      .map_err(|e| e.into_core("delete index"))
  }
}
