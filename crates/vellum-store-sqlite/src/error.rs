//! Error type for `vellum-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vellum_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored checksum was not exactly 32 bytes.
  #[error("malformed checksum for record {0:?}")]
  Checksum(String),
}

impl Error {
  /// Convert into the caller-facing error. Validation and lookup failures
  /// pass through; anything else becomes an opaque internal error tagged
  /// with `op`.
  pub fn into_core(self, op: &'static str) -> vellum_core::Error {
    match self {
      Self::Core(e) => e,
      other => vellum_core::Error::Internal { op, source: Box::new(other) },
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
