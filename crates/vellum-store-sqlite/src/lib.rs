//! SQLite backend for the Vellum versioned document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] implements both
//! [`vellum_core::store::RecordStore`] and
//! [`vellum_core::index::IndexRegistry`].

mod encode;
mod registry;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SqliteStore, Validators};
