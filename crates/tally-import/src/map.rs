//! Column-to-field mapping — the `Mapped` stage.
//!
//! Pure, deterministic functions from source names to schema names, so the
//! heuristics are unit-testable away from file I/O. Matching is
//! case-insensitive exact first, then normalized (alphanumerics only); each
//! target field is consumed at most once and the leftmost source column
//! wins ties.

use std::collections::BTreeSet;

use serde::Serialize;
use tally_core::field::FieldDefinition;

// ─── Names ───────────────────────────────────────────────────────────────────

/// Turn an arbitrary string into a safe table name: lowercase, runs of
/// whitespace collapsed to `_`, symbols dropped.
///
/// `"Product Specs 2025!"` → `"product_specs_2025"`,
/// `"Voltage (V)"` → `"voltage_v"`.
pub fn slugify(name: &str) -> String {
  let mut slug = String::new();
  for c in name.trim().to_lowercase().chars() {
    if c.is_whitespace() {
      if !slug.ends_with('_') {
        slug.push('_');
      }
    } else if c.is_alphanumeric() || c == '_' {
      slug.push(c);
    }
  }
  let slug = slug.trim_matches('_');
  if slug.is_empty() { "table".to_string() } else { slug.to_string() }
}

/// Matching key: lowercase alphanumerics only, so `"Unit Price"`,
/// `"unit_price"`, and `"UnitPrice"` all collide.
pub fn normalize_key(s: &str) -> String {
  s.to_lowercase().chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Slugify `name` and make it unique within `used`, appending `_2`, `_3`, …
/// on collision. The chosen name is recorded in `used`.
pub fn table_name(name: &str, used: &mut BTreeSet<String>) -> String {
  let base = slugify(name);
  let mut candidate = base.clone();
  let mut n = 1;
  while used.contains(&candidate) {
    n += 1;
    candidate = format!("{base}_{n}");
  }
  used.insert(candidate.clone());
  candidate
}

// ─── Column mapping ──────────────────────────────────────────────────────────

/// How a mapped column earned its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchReason {
  Exact,
  Normalized,
}

/// Where a source column's cells go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingTarget {
  Field { name: String, reason: MatchReason },
  /// No schema field matched; the column is excluded from validation unless
  /// the operator re-maps it.
  Unmapped,
}

/// One source column's proposed destination.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnMapping {
  pub source: String,
  pub target: MappingTarget,
}

/// Propose a mapping from `columns` onto `fields`.
pub fn propose_mapping(
  columns: &[String],
  fields: &[FieldDefinition],
) -> Vec<ColumnMapping> {
  let mut taken: BTreeSet<String> = BTreeSet::new();
  columns
    .iter()
    .map(|col| {
      let target = best_match(col, fields, &taken);
      if let MappingTarget::Field { name, .. } = &target {
        taken.insert(name.clone());
      }
      ColumnMapping {
        source: col.clone(),
        target,
      }
    })
    .collect()
}

fn best_match(
  column: &str,
  fields: &[FieldDefinition],
  taken: &BTreeSet<String>,
) -> MappingTarget {
  let trimmed = column.trim();

  for def in fields {
    if !taken.contains(&def.name) && def.name.eq_ignore_ascii_case(trimmed) {
      return MappingTarget::Field {
        name:   def.name.clone(),
        reason: MatchReason::Exact,
      };
    }
  }

  let key = normalize_key(trimmed);
  if key.is_empty() {
    return MappingTarget::Unmapped;
  }
  for def in fields {
    if !taken.contains(&def.name) && normalize_key(&def.name) == key {
      return MappingTarget::Field {
        name:   def.name.clone(),
        reason: MatchReason::Normalized,
      };
    }
  }

  MappingTarget::Unmapped
}

// ─── Tests ───────────────────────────────────────────────────────────────────
