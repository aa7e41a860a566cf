//! Error taxonomy shared by every Vellum backend and transport.
//!
//! Backends convert their own storage errors into [`Error::Internal`] at the
//! trait boundary, tagging them with the operation that failed. Transports
//! switch on [`Error::kind`] to pick a status code.

use thiserror::Error;

/// Coarse classification of an [`Error`], used by transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  EmptyArgument,
  InvalidArgument,
  NotFound,
  AlreadyExists,
  Internal,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{subject} must not be empty")]
  EmptyArgument { subject: &'static str },

  #[error("invalid {subject}: {reason}")]
  InvalidArgument { subject: &'static str, reason: String },

  #[error("{subject} not found: {key}")]
  NotFound { subject: &'static str, key: String },

  #[error("{subject} already exists: {key}")]
  AlreadyExists { subject: &'static str, key: String },

  /// A storage-layer failure. The message deliberately omits the source;
  /// walk [`std::error::Error::source`] to log it.
  #[error("internal error during {op}")]
  Internal {
    op:     &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  pub fn invalid(subject: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidArgument { subject, reason: reason.into() }
  }

  pub fn not_found(subject: &'static str, key: impl ToString) -> Self {
    Self::NotFound { subject, key: key.to_string() }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::EmptyArgument { .. } => ErrorKind::EmptyArgument,
      Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
      Self::NotFound { .. } => ErrorKind::NotFound,
      Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
      Self::Internal { .. } => ErrorKind::Internal,
    }
  }

  /// `true` for both empty and malformed input; both are the caller's fault.
  pub fn is_invalid_argument(&self) -> bool {
    matches!(self.kind(), ErrorKind::EmptyArgument | ErrorKind::InvalidArgument)
  }

  pub fn is_not_found(&self) -> bool { self.kind() == ErrorKind::NotFound }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn internal_message_hides_source() {
    let err = Error::Internal {
      op:     "push",
      source: "disk I/O error at /var/lib/vellum.db".into(),
    };
    assert_eq!(err.to_string(), "internal error during push");
    assert!(std::error::Error::source(&err).is_some());
  }

  #[test]
  fn empty_argument_counts_as_invalid() {
    let err = Error::EmptyArgument { subject: "updates" };
    assert_eq!(err.kind(), ErrorKind::EmptyArgument);
    assert!(err.is_invalid_argument());
    assert_eq!(err.to_string(), "updates must not be empty");
  }
}
