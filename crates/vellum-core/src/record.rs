//! Record types: heads, log entries, and the values that flow through a push.
//!
//! A record's history is an append-only list of [`LogEntry`] values. The
//! [`Record`] head points at the newest one and carries the bookkeeping
//! timestamps used for change detection and full-resync reconciliation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};

use crate::index::IndexId;

// ─── Revision ────────────────────────────────────────────────────────────────

/// A globally monotonic log-entry id. Doubles as a pagination cursor; zero
/// means "no cursor" going in and "no more pages" coming out.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Revision(pub i64);

impl Revision {
  pub const ZERO: Revision = Revision(0);

  pub fn is_zero(self) -> bool { self.0 == 0 }
}

impl fmt::Display for Revision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Checksum ────────────────────────────────────────────────────────────────

/// SHA-256 content hash over `(data, index_id, record_id)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 32]);

impl Checksum {
  pub fn compute(data: &[u8], index_id: IndexId, record_id: &str) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.update(index_id.0.to_be_bytes());
    hasher.update(record_id.as_bytes());
    Self(hasher.finalize().into())
  }

  pub fn from_bytes(bytes: [u8; 32]) -> Self { Self(bytes) }

  pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
}

impl TryFrom<&[u8]> for Checksum {
  type Error = std::array::TryFromSliceError;

  fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
    Ok(Self(bytes.try_into()?))
  }
}

impl fmt::Display for Checksum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&hex::encode(self.0))
  }
}

impl fmt::Debug for Checksum {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Checksum({self})")
  }
}

impl Serialize for Checksum {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(self)
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// One element of a push batch. `data` is the raw JSON payload; its exact
/// bytes are what gets hashed and stored.
#[derive(Debug, Clone)]
pub struct RecordUpdate {
  pub record_id: String,
  pub index_id:  IndexId,
  pub data:      String,
}

impl RecordUpdate {
  pub fn new(
    index_id: IndexId,
    record_id: impl Into<String>,
    data: impl Into<String>,
  ) -> Self {
    Self { record_id: record_id.into(), index_id, data: data.into() }
  }
}

/// Outcome of a single update within a push batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pushed {
  pub record_id: String,
  /// The head revision after the push.
  pub revision:  Revision,
  /// `false` when the payload was identical and only `touched_at` moved.
  pub changed:   bool,
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// The current state of a record.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
  pub record_id:  String,
  pub index_id:   IndexId,
  pub revision:   Revision,
  pub checksum:   Checksum,
  pub data:       Box<RawValue>,
  pub created_at: DateTime<Utc>,
  /// Advances only when the payload changes.
  pub updated_at: DateTime<Utc>,
  /// Advances on every push of this key, changed or not.
  pub touched_at: DateTime<Utc>,
}

/// One immutable version of a record's payload.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
  pub revision:   Revision,
  pub index_id:   IndexId,
  pub record_id:  String,
  pub data:       Box<RawValue>,
  pub created_at: DateTime<Utc>,
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub items:       Vec<T>,
  /// Pass back as `cursor` to continue; [`Revision::ZERO`] when exhausted.
  pub next_cursor: Revision,
}
