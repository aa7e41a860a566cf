//! The `RecordStore` trait and its query types.
//!
//! The trait is implemented by storage backends (e.g. `vellum-store-sqlite`).
//! Transports depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  Result,
  record::{LogEntry, Page, Pushed, Record, RecordUpdate, Revision},
};

/// Upper bound on page size; a `limit` of zero also resolves to this.
pub const MAX_PAGE_SIZE: usize = 500;

/// Clamp a caller-supplied page size into `1..=MAX_PAGE_SIZE`.
pub fn effective_limit(limit: usize) -> usize {
  if limit == 0 || limit > MAX_PAGE_SIZE { MAX_PAGE_SIZE } else { limit }
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`RecordStore::find`].
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
  /// Filter expression, e.g. `status=active && owner.id=42`.
  pub filter:            Option<String>,
  /// Only heads with `updated_at >= since`.
  pub since:             Option<DateTime<Utc>>,
  /// Exclusive lower bound on revision.
  pub cursor:            Revision,
  pub limit:             usize,
  /// Only heads with `touched_at < not_touched_since`: keys a full
  /// resync started at that instant has not re-pushed.
  pub not_touched_since: Option<DateTime<Utc>>,
}

/// Parameters for [`RecordStore::history`].
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
  /// Only entries with `created_at >= since`.
  pub since:  Option<DateTime<Utc>>,
  /// Exclusive upper bound on revision; zero starts from the newest entry.
  pub cursor: Revision,
  pub limit:  usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a versioned record store backend.
///
/// Every content-changing write appends to a log that is never rewritten.
/// Each method runs as a single storage transaction.
pub trait RecordStore: Send + Sync {
  /// Apply a batch of updates atomically, in order.
  ///
  /// Identical payloads only refresh `touched_at`; anything else appends a
  /// new log entry and moves the head. Any invalid update aborts the whole
  /// batch before it is committed.
  fn push(
    &self,
    updates: Vec<RecordUpdate>,
  ) -> impl Future<Output = Result<Vec<Pushed>>> + Send + '_;

  /// Current state of a record.
  fn get<'a>(
    &'a self,
    index: &'a str,
    record_id: &'a str,
  ) -> impl Future<Output = Result<Record>> + Send + 'a;

  /// Scan current heads in ascending revision order.
  fn find<'a>(
    &'a self,
    index: &'a str,
    query: &'a FindQuery,
  ) -> impl Future<Output = Result<Page<Record>>> + Send + 'a;

  /// Walk one record's log from newest to oldest.
  fn history<'a>(
    &'a self,
    index: &'a str,
    record_id: &'a str,
    query: &'a HistoryQuery,
  ) -> impl Future<Output = Result<Page<LogEntry>>> + Send + 'a;

  /// Drop every head and log entry of `index`. Succeeds for unknown indices.
  fn clear<'a>(
    &'a self,
    index: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
