//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings with a fixed microsecond
//! precision and a `Z` suffix, so string comparison in SQL agrees with
//! chronological order. JSON documents are stored as text.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Row, types::Value as SqlValue};
use serde_json::{Value, value::RawValue};
use vellum_core::{
  index::{Index, IndexId},
  record::{Checksum, LogEntry, Record, Revision},
};
use vellum_query::Param;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON ────────────────────────────────────────────────────────────────────

pub fn encode_schema(schema: &Value) -> Result<String> {
  Ok(serde_json::to_string(schema)?)
}

pub fn decode_schema(s: &str) -> Result<Value> { Ok(serde_json::from_str(s)?) }

pub fn decode_payload(s: String) -> Result<Box<RawValue>> {
  Ok(RawValue::from_string(s)?)
}

// ─── Filter parameters ───────────────────────────────────────────────────────

pub fn encode_param(param: Param) -> SqlValue {
  match param {
    Param::Text(s) => SqlValue::Text(s),
    Param::Integer(i) => SqlValue::Integer(i),
    Param::Real(f) => SqlValue::Real(f),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "r.record_id, r.index_id, r.log_id, r.checksum, \
                                  l.data, r.created_at, r.updated_at, r.touched_at";

/// Raw values read from a `records` row joined with its `record_log` entry.
pub struct RawRecord {
  pub record_id:  String,
  pub index_id:   i64,
  pub log_id:     i64,
  pub checksum:   Vec<u8>,
  pub data:       String,
  pub created_at: String,
  pub updated_at: String,
  pub touched_at: String,
}

impl RawRecord {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:  row.get(0)?,
      index_id:   row.get(1)?,
      log_id:     row.get(2)?,
      checksum:   row.get(3)?,
      data:       row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
      touched_at: row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    let checksum = Checksum::try_from(self.checksum.as_slice())
      .map_err(|_| Error::Checksum(self.record_id.clone()))?;

    Ok(Record {
      index_id: IndexId(self.index_id),
      revision: Revision(self.log_id),
      checksum,
      data: decode_payload(self.data)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      touched_at: decode_dt(&self.touched_at)?,
      record_id: self.record_id,
    })
  }
}

/// Column list matching [`RawLogEntry::from_row`].
pub const LOG_COLUMNS: &str = "id, index_id, record_id, data, created_at";

/// Raw values read from a `record_log` row.
pub struct RawLogEntry {
  pub id:         i64,
  pub index_id:   i64,
  pub record_id:  String,
  pub data:       String,
  pub created_at: String,
}

impl RawLogEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      index_id:   row.get(1)?,
      record_id:  row.get(2)?,
      data:       row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<LogEntry> {
    Ok(LogEntry {
      revision:   Revision(self.id),
      index_id:   IndexId(self.index_id),
      record_id:  self.record_id,
      data:       decode_payload(self.data)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawIndex::from_row`].
pub const INDEX_COLUMNS: &str = "id, name, title, schema, created_at, updated_at";

/// Raw values read from an `indices` row.
pub struct RawIndex {
  pub id:         i64,
  pub name:       String,
  pub title:      Option<String>,
  pub schema:     Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawIndex {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      title:      row.get(2)?,
      schema:     row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_index(self) -> Result<Index> {
    Ok(Index {
      id:         IndexId(self.id),
      name:       self.name,
      title:      self.title,
      schema:     self.schema.as_deref().map(decode_schema).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexicographically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    let c = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb && eb < ec);
    assert_eq!(ea, "2024-01-01T09:00:00.000000Z");
  }

  #[test]
  fn timestamps_round_trip_at_microsecond_precision() {
    let dt = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
    let back = decode_dt(&encode_dt(dt)).unwrap();
    assert_eq!(back.timestamp_micros(), dt.timestamp_micros());
  }
}
