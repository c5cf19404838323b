//! The persistence-gateway trait.
//!
//! Implemented by storage backends (e.g. `tally-store-sqlite`). Callers
//! depend on this abstraction, not on any concrete backend. All operations
//! are synchronous: the system is a single user session pacing one local
//! store, with no background work to overlap.

use uuid::Uuid;

use crate::record::{Record, StoredRecord};

/// Durable storage of records keyed by id.
///
/// Implementations persist each record as identity + timestamps + an opaque
/// value blob. Reads return [`StoredRecord`]s; callers reconcile them
/// against the active schema with [`Record::from_stored`], so a blob whose
/// fields disagree with the current schema is never a storage error.
pub trait RecordStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `record`, replacing any stored record with the same id.
  fn save(&self, record: &Record) -> Result<(), Self::Error>;

  /// All stored records, in stable id order.
  fn fetch_all(&self) -> Result<Vec<StoredRecord>, Self::Error>;

  /// One record by id; `None` when absent.
  fn fetch_by_id(&self, id: Uuid) -> Result<Option<StoredRecord>, Self::Error>;

  /// Delete by id. Returns `false` when no such record existed.
  fn delete_by_id(&self, id: Uuid) -> Result<bool, Self::Error>;
}
