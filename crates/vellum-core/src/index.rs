//! Indices, the named and optionally schema-constrained namespaces that
//! records live in, and the [`IndexRegistry`] trait that manages them.

use std::{fmt, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Numeric identity of an index. Zero is never assigned and marks an
/// unresolved index.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct IndexId(pub i64);

impl IndexId {
  pub fn is_unresolved(self) -> bool { self.0 == 0 }
}

impl fmt::Display for IndexId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
  pub id:         IndexId,
  pub name:       String,
  pub title:      Option<String>,
  /// JSON-Schema every pushed payload must satisfy; `None` accepts any JSON.
  pub schema:     Option<Value>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input for [`IndexRegistry::create_index`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewIndex {
  pub name:   String,
  pub title:  Option<String>,
  pub schema: Option<Value>,
}

/// Replacement title and schema for [`IndexRegistry::update_index`]. Both
/// fields overwrite; `None` clears.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexUpdate {
  pub title:  Option<String>,
  pub schema: Option<Value>,
}

/// Index names: 1–64 characters of `[a-z0-9_-]`, starting alphanumeric.
pub fn validate_index_name(name: &str) -> Result<()> {
  if name.is_empty() {
    return Err(Error::EmptyArgument { subject: "index name" });
  }
  if name.len() > 64 {
    return Err(Error::invalid("index name", "longer than 64 characters"));
  }
  let mut chars = name.chars();
  if !chars
    .next()
    .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
  {
    return Err(Error::invalid(
      "index name",
      "must start with a lowercase letter or digit",
    ));
  }
  if let Some(c) = chars.find(|c| {
    !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
  }) {
    return Err(Error::invalid(
      "index name",
      format!("unexpected character {c:?}"),
    ));
  }
  Ok(())
}

/// Name → identity resolution plus schema management.
pub trait IndexRegistry: Send + Sync {
  /// Register a new index. Fails with `AlreadyExists` on a duplicate name and
  /// `InvalidArgument` when the schema does not compile.
  fn create_index(
    &self,
    input: NewIndex,
  ) -> impl Future<Output = Result<Index>> + Send + '_;

  fn get_index<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Index>> + Send + 'a;

  /// All indices, ordered by name.
  fn list_indices(&self) -> impl Future<Output = Result<Vec<Index>>> + Send + '_;

  /// Replace title and schema in place. Stored records are not re-validated.
  fn update_index<'a>(
    &'a self,
    name: &'a str,
    update: IndexUpdate,
  ) -> impl Future<Output = Result<Index>> + Send + 'a;

  /// Remove an index together with all of its records and history.
  fn delete_index<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<()>> + Send + 'a;
}
