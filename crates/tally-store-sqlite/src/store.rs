//! [`SqliteStore`] — the SQLite implementation of
//! [`tally_core::store::RecordStore`].

use std::path::Path;

use rusqlite::{Connection, OptionalExtension as _};
use tally_core::{
  record::{Record, StoredRecord},
  store::RecordStore,
};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawRecord, encode_dt, encode_uuid, encode_values},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tally record store backed by a single SQLite file.
pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path)?;
    let store = Self { conn };
    store.init_schema()?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()?;
    let store = Self { conn };
    store.init_schema()?;
    Ok(store)
  }

  fn init_schema(&self) -> Result<()> {
    self.conn.execute_batch(SCHEMA)?;
    Ok(())
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  fn save(&self, record: &Record) -> Result<()> {
    self.conn.execute(
      "INSERT OR REPLACE INTO records (id, created_at, updated_at, values_json)
       VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![
        encode_uuid(record.id),
        encode_dt(record.created_at),
        encode_dt(record.updated_at),
        encode_values(record)?,
      ],
    )?;
    Ok(())
  }

  fn fetch_all(&self) -> Result<Vec<StoredRecord>> {
    let mut stmt = self.conn.prepare(
      "SELECT id, created_at, updated_at, values_json FROM records ORDER BY id",
    )?;
    let raws = stmt
      .query_map([], |row| {
        Ok(RawRecord {
          id:          row.get(0)?,
          created_at:  row.get(1)?,
          updated_at:  row.get(2)?,
          values_json: row.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    raws.into_iter().map(RawRecord::into_stored).collect()
  }

  fn fetch_by_id(&self, id: Uuid) -> Result<Option<StoredRecord>> {
    let raw = self
      .conn
      .query_row(
        "SELECT id, created_at, updated_at, values_json
         FROM records WHERE id = ?1",
        rusqlite::params![encode_uuid(id)],
        |row| {
          Ok(RawRecord {
            id:          row.get(0)?,
            created_at:  row.get(1)?,
            updated_at:  row.get(2)?,
            values_json: row.get(3)?,
          })
        },
      )
      .optional()?;

    raw.map(RawRecord::into_stored).transpose()
  }

  fn delete_by_id(&self, id: Uuid) -> Result<bool> {
    let n = self.conn.execute(
      "DELETE FROM records WHERE id = ?1",
      rusqlite::params![encode_uuid(id)],
    )?;
    Ok(n > 0)
  }
}
