//! SQLite backend for the tally record store.
//!
//! One database file per store, one row per record. Field values live in an
//! opaque JSON blob column so the table never needs migrating when the
//! active inventory type changes.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
