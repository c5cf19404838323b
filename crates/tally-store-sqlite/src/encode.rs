//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs are hyphenated lowercase strings,
//! and the value map is compact JSON.

use chrono::{DateTime, Utc};
use tally_core::record::{Record, StoredRecord, ValueMap};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Value blob ──────────────────────────────────────────────────────────────

pub fn encode_values(record: &Record) -> Result<String> {
  Ok(serde_json::to_string(&record.values)?)
}

pub fn decode_values(s: &str) -> Result<ValueMap> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row type ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `records` row.
pub struct RawRecord {
  pub id:          String,
  pub created_at:  String,
  pub updated_at:  String,
  pub values_json: String,
}

impl RawRecord {
  pub fn into_stored(self) -> Result<StoredRecord> {
    Ok(StoredRecord {
      id:         decode_uuid(&self.id)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      values:     decode_values(&self.values_json)?,
    })
  }
}
