//! Datasheet import pipeline for tally.
//!
//! Takes a delimited-text file or spreadsheet through
//! `Parsed → Mapped → Sanitized → Validated` and reports everything it
//! inferred, fixed, or rejected. Nothing touches the store until the caller
//! explicitly commits — previewing is the default, safe mode.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use tally_core::schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::builtin();
//! let reports = tally_import::preview_file(Path::new("stock.csv"), &registry).unwrap();
//! for report in &reports {
//!   println!("{}: {} rows ok, {} rejected",
//!     report.table, report.records.len(), report.validation_errors.len());
//! }
//! ```

pub mod error;
pub mod map;
pub mod parse;
pub mod report;
pub mod sanitize;

use std::{collections::BTreeSet, path::Path};

use serde_json::Value;
use tally_core::{
  record::{Record, ValueMap},
  schema::SchemaRegistry,
  store::RecordStore,
};

pub use error::{Error, Result};
use map::{MappingTarget, propose_mapping, table_name};
pub use parse::{SourceTable, parse_file, supported_extensions};
pub use report::{
  CommitFailure, CommitOutcome, ImportReport, RowError, RowErrorReason,
  SanitizeEntry,
};
use sanitize::sanitize_cell;

// ─── Preview ─────────────────────────────────────────────────────────────────

/// Parse `path` and run every table through mapping, sanitization, and
/// validation under the registry's active schema. Nothing is persisted.
pub fn preview_file(
  path: &Path,
  registry: &SchemaRegistry,
) -> Result<Vec<ImportReport>> {
  let tables = parse::parse_file(path)?;
  tracing::info!(path = %path.display(), tables = tables.len(), "parsed import source");
  Ok(preview_tables(tables, registry))
}

/// The pure portion of the pipeline, separated from file I/O so the mapping
/// and validation behaviour is testable on in-memory tables.
pub fn preview_tables(
  tables: Vec<SourceTable>,
  registry: &SchemaRegistry,
) -> Vec<ImportReport> {
  let mut used_names = BTreeSet::new();
  tables
    .into_iter()
    .map(|table| preview_table(table, registry, &mut used_names))
    .collect()
}

fn preview_table(
  table: SourceTable,
  registry: &SchemaRegistry,
  used_names: &mut BTreeSet<String>,
) -> ImportReport {
  let fields = registry.active_fields();
  let mapping = propose_mapping(&table.columns, &fields);
  let target_table = table_name(&table.name, used_names);
  tracing::debug!(
    source = %table.name,
    table = %target_table,
    rows = table.rows.len(),
    "mapped import table"
  );

  let mut sanitize_log = Vec::new();
  let mut validation_errors = Vec::new();
  let mut records = Vec::new();

  for (row_idx, row) in table.rows.iter().enumerate() {
    let mut values = ValueMap::new();

    for (col_idx, column) in mapping.iter().enumerate() {
      let MappingTarget::Field { name: field, .. } = &column.target else {
        continue;
      };
      let Some(cell) = row.get(col_idx) else { continue };
      if cell.trim().is_empty() {
        // Blank cells are absent values, not empty strings.
        continue;
      }
      let Some(def) = fields.iter().find(|d| &d.name == field) else {
        continue;
      };

      let outcome = sanitize_cell(def.kind, cell);
      if let Some(reason) = outcome.reason {
        sanitize_log.push(SanitizeEntry {
          row:      row_idx,
          field:    field.clone(),
          original: cell.clone(),
          fixed:    outcome.value.clone(),
          reason,
        });
      }
      values.insert(field.clone(), Value::String(outcome.value));
    }

    match Record::create(registry, &values) {
      Ok(record) => records.push(record),
      Err(err) => validation_errors.push(row_error(row_idx, err)),
    }
  }

  ImportReport {
    source_table: table.name,
    table: target_table,
    mapping,
    sanitize_log,
    validation_errors,
    records,
  }
}

fn row_error(row: usize, err: tally_core::Error) -> RowError {
  match err {
    tally_core::Error::TypeCoercion { field, value, .. } => RowError {
      row,
      field,
      reason: RowErrorReason::TypeCoercion { value },
    },
    tally_core::Error::MissingRequiredField(field) => RowError {
      row,
      field,
      reason: RowErrorReason::MissingRequired,
    },
    other => RowError {
      row,
      field: String::new(),
      reason: RowErrorReason::Other {
        message: other.to_string(),
      },
    },
  }
}

// ─── Commit ──────────────────────────────────────────────────────────────────

/// Persist a previewed report's records, one save per record.
///
/// A failed save is collected into the outcome and never aborts the rest of
/// the batch; partial success is reported, not swallowed.
pub fn commit<S: RecordStore>(report: &ImportReport, store: &S) -> CommitOutcome {
  let mut persisted = 0;
  let mut failures = Vec::new();

  for (index, record) in report.records.iter().enumerate() {
    match store.save(record) {
      Ok(()) => persisted += 1,
      Err(err) => {
        tracing::warn!(
          table = %report.table,
          id = %record.id,
          error = %err,
          "record not persisted"
        );
        failures.push(CommitFailure {
          index,
          id: record.id,
          message: err.to_string(),
        });
      }
    }
  }

  tracing::info!(
    table = %report.table,
    persisted,
    failed = failures.len(),
    "import committed"
  );
  CommitOutcome { persisted, failures }
}

/// Parse, validate, and persist in one step — the explicit opt-in that
/// skips the preview stop.
pub fn commit_file<S: RecordStore>(
  path: &Path,
  registry: &SchemaRegistry,
  store: &S,
) -> Result<Vec<(ImportReport, CommitOutcome)>> {
  let reports = preview_file(path, registry)?;
  Ok(
    reports
      .into_iter()
      .map(|report| {
        let outcome = commit(&report, store);
        (report, outcome)
      })
      .collect(),
  )
}

// ─── Pipeline tests ──────────────────────────────────────────────────────────
