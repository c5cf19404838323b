//! Import run reports.
//!
//! Everything the pipeline inferred, fixed, or rejected, in a shape the
//! presentation layer can render directly. Reports are transient — they live
//! for one import run and are only persisted if the caller commits the
//! produced records.

use std::fmt;

use serde::Serialize;
use tally_core::record::Record;
use uuid::Uuid;

use crate::{map::ColumnMapping, sanitize::SanitizeReason};

// ─── Sanitize log ────────────────────────────────────────────────────────────

/// One logged cell normalization: what the cell said, what it became, why.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizeEntry {
  pub row:      usize,
  pub field:    String,
  pub original: String,
  pub fixed:    String,
  pub reason:   SanitizeReason,
}

// ─── Row errors ──────────────────────────────────────────────────────────────

/// Why a row was excluded from the produced records.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowErrorReason {
  /// The cell survived sanitization but still cannot become the field's
  /// kind.
  TypeCoercion { value: String },
  /// A required field had no usable value.
  MissingRequired,
  Other { message: String },
}

impl fmt::Display for RowErrorReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::TypeCoercion { value } => write!(f, "cannot coerce {value:?}"),
      Self::MissingRequired => f.write_str("required field missing"),
      Self::Other { message } => f.write_str(message),
    }
  }
}

/// One rejected row.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
  pub row:    usize,
  pub field:  String,
  pub reason: RowErrorReason,
}

// ─── ImportReport ────────────────────────────────────────────────────────────

/// The full result of previewing one source table.
///
/// Invariant: `records.len() + validation_errors.len()` equals the table's
/// data row count.
#[derive(Debug, Serialize)]
pub struct ImportReport {
  /// Logical name from the source (file stem or sheet name).
  pub source_table:      String,
  /// Slugified, collision-disambiguated target table name.
  pub table:             String,
  pub mapping:           Vec<ColumnMapping>,
  pub sanitize_log:      Vec<SanitizeEntry>,
  pub validation_errors: Vec<RowError>,
  pub records:           Vec<Record>,
}

impl ImportReport {
  /// Decline the import: discard the produced records without persisting
  /// anything. Returns how many records were dropped.
  pub fn reject(self) -> usize {
    let discarded = self.records.len();
    tracing::debug!(table = %self.table, discarded, "import rejected");
    discarded
  }
}

// ─── Commit outcome ──────────────────────────────────────────────────────────

/// What happened when a report's records were handed to a store.
#[derive(Debug)]
pub struct CommitOutcome {
  pub persisted: usize,
  /// Per-record failures; the rest of the batch still went through.
  pub failures:  Vec<CommitFailure>,
}

#[derive(Debug)]
pub struct CommitFailure {
  /// Position within [`ImportReport::records`].
  pub index:   usize,
  pub id:      Uuid,
  pub message: String,
}
