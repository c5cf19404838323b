//! Field definitions and typed field values.
//!
//! A schema is an ordered list of [`FieldDefinition`]s; a record holds one
//! [`FieldValue`] per field. Coercion from untyped JSON input is the single
//! validation chokepoint — create, field update, reconciliation, and import
//! all funnel through [`FieldValue::coerce`].

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical text form for `date` fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── FieldKind ───────────────────────────────────────────────────────────────

/// The data kind a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
  Text,
  Integer,
  Decimal,
  Date,
}

impl fmt::Display for FieldKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Text => "text",
      Self::Integer => "integer",
      Self::Decimal => "decimal",
      Self::Date => "date",
    };
    f.write_str(s)
  }
}

impl FieldKind {
  /// Fallback for an absent, non-required field with no declared default.
  /// `date` has none — an absent date stays absent.
  pub fn zero_value(self) -> Option<FieldValue> {
    match self {
      Self::Text => Some(FieldValue::Text(String::new())),
      Self::Integer => Some(FieldValue::Integer(0)),
      Self::Decimal => Some(FieldValue::Decimal(Decimal::ZERO)),
      Self::Date => None,
    }
  }
}

// ─── FieldValue ──────────────────────────────────────────────────────────────

/// A typed value held by a record.
///
/// Serializes as the bare JSON value so the stored blob stays readable:
/// `"Sword"`, `2`, `"100.00"`, `"2024-01-15"`. Reads go back through
/// [`FieldValue::coerce`] against the active schema, so no type tag is
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
  Text(String),
  Integer(i64),
  Decimal(Decimal),
  Date(NaiveDate),
}

impl FieldValue {
  pub fn kind(&self) -> FieldKind {
    match self {
      Self::Text(_) => FieldKind::Text,
      Self::Integer(_) => FieldKind::Integer,
      Self::Decimal(_) => FieldKind::Decimal,
      Self::Date(_) => FieldKind::Date,
    }
  }

  /// Coerce an untyped JSON value into `kind`.
  ///
  /// Returns `None` when the value cannot represent the kind; the caller
  /// attaches the field name and row context to build the error.
  pub fn coerce(kind: FieldKind, value: &Value) -> Option<Self> {
    match kind {
      FieldKind::Text => match value {
        Value::String(s) => Some(Self::Text(s.clone())),
        Value::Number(n) => Some(Self::Text(n.to_string())),
        Value::Bool(b) => Some(Self::Text(b.to_string())),
        _ => None,
      },
      FieldKind::Integer => match value {
        Value::Number(n) => coerce_integer_number(n),
        Value::String(s) => parse_integer(s.trim()).map(Self::Integer),
        _ => None,
      },
      FieldKind::Decimal => match value {
        // Route through the exact decimal rendering to avoid float artifacts.
        Value::Number(n) => n.to_string().parse::<Decimal>().ok().map(Self::Decimal),
        Value::String(s) => s.trim().parse::<Decimal>().ok().map(Self::Decimal),
        _ => None,
      },
      FieldKind::Date => match value {
        Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
          .ok()
          .map(Self::Date),
        _ => None,
      },
    }
  }

  /// The value as it would appear in a form or report cell.
  pub fn to_display_string(&self) -> String {
    match self {
      Self::Text(s) => s.clone(),
      Self::Integer(i) => i.to_string(),
      Self::Decimal(d) => d.to_string(),
      Self::Date(d) => d.format(DATE_FORMAT).to_string(),
    }
  }
}

fn coerce_integer_number(n: &serde_json::Number) -> Option<FieldValue> {
  if let Some(i) = n.as_i64() {
    return Some(FieldValue::Integer(i));
  }
  // Floats with a zero fraction count as integers (spreadsheet cells often
  // surface whole numbers as floats).
  n.as_f64()
    .filter(|f| {
      f.is_finite()
        && f.fract() == 0.0
        && *f >= i64::MIN as f64
        && *f <= i64::MAX as f64
    })
    .map(|f| FieldValue::Integer(f as i64))
}

/// Strict integer syntax: optional sign, then digits only.
fn parse_integer(s: &str) -> Option<i64> {
  let rest = s.strip_prefix(['+', '-']).unwrap_or(s);
  if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse::<i64>().ok()
}

// ─── FieldDefinition ─────────────────────────────────────────────────────────

/// One named, typed, possibly-required schema entry. Immutable once
/// registered; validated by [`crate::schema::SchemaRegistry::register`].
#[derive(Debug, Clone, Serialize)]
pub struct FieldDefinition {
  pub name:     String,
  pub kind:     FieldKind,
  pub required: bool,
  pub default:  Option<FieldValue>,
}

impl FieldDefinition {
  pub fn required(name: &str, kind: FieldKind) -> Self {
    Self {
      name: name.to_string(),
      kind,
      required: true,
      default: None,
    }
  }

  pub fn optional(name: &str, kind: FieldKind) -> Self {
    Self {
      name: name.to_string(),
      kind,
      required: false,
      default: None,
    }
  }

  /// Attach a default value. Kind agreement is checked at registration.
  pub fn with_default(mut self, default: FieldValue) -> Self {
    self.default = Some(default);
    self
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn text_accepts_strings_and_numbers() {
    assert_eq!(
      FieldValue::coerce(FieldKind::Text, &json!("Sword")),
      Some(FieldValue::Text("Sword".into()))
    );
    assert_eq!(
      FieldValue::coerce(FieldKind::Text, &json!(7)),
      Some(FieldValue::Text("7".into()))
    );
  }

  #[test]
  fn integer_accepts_digits_and_whole_floats() {
    assert_eq!(
      FieldValue::coerce(FieldKind::Integer, &json!("42")),
      Some(FieldValue::Integer(42))
    );
    assert_eq!(
      FieldValue::coerce(FieldKind::Integer, &json!("-3")),
      Some(FieldValue::Integer(-3))
    );
    assert_eq!(
      FieldValue::coerce(FieldKind::Integer, &json!(2.0)),
      Some(FieldValue::Integer(2))
    );
  }

  #[test]
  fn integer_rejects_words_and_fractions() {
    assert_eq!(FieldValue::coerce(FieldKind::Integer, &json!("two")), None);
    assert_eq!(FieldValue::coerce(FieldKind::Integer, &json!("2.5")), None);
    assert_eq!(FieldValue::coerce(FieldKind::Integer, &json!(2.5)), None);
  }

  #[test]
  fn decimal_parses_plain_numbers_only() {
    assert_eq!(
      FieldValue::coerce(FieldKind::Decimal, &json!("100.00")),
      Some(FieldValue::Decimal("100.00".parse().unwrap()))
    );
    // Currency stripping is the import pipeline's job, not coercion's.
    assert_eq!(FieldValue::coerce(FieldKind::Decimal, &json!("$100.00")), None);
  }

  #[test]
  fn date_requires_canonical_form() {
    assert_eq!(
      FieldValue::coerce(FieldKind::Date, &json!("2024-01-15")),
      Some(FieldValue::Date(
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
      ))
    );
    assert_eq!(FieldValue::coerce(FieldKind::Date, &json!("15/01/2024")), None);
  }

  #[test]
  fn values_serialize_as_bare_json() {
    assert_eq!(
      serde_json::to_value(FieldValue::Integer(2)).unwrap(),
      json!(2)
    );
    assert_eq!(
      serde_json::to_value(FieldValue::Text("Sword".into())).unwrap(),
      json!("Sword")
    );
    assert_eq!(
      serde_json::to_value(FieldValue::Decimal("100.00".parse().unwrap()))
        .unwrap(),
      json!("100.00")
    );
  }
}
