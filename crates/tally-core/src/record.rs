//! Records — one inventory entry, validated against the active schema.
//!
//! A record is an id + timestamps envelope around typed field values. Its
//! shape is not fixed at compile time: the active [`SchemaRegistry`] type
//! decides which fields exist, and every write path re-validates against it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  field::FieldValue,
  schema::SchemaRegistry,
};

/// Untyped field input keyed by field name — the boundary form accepted by
/// [`Record::create`] and held by [`StoredRecord`].
pub type ValueMap = BTreeMap<String, Value>;

// ─── Record ──────────────────────────────────────────────────────────────────

/// One validated inventory entry.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub values:     BTreeMap<String, FieldValue>,
}

impl Record {
  /// Build a record from untyped input under the active schema.
  ///
  /// Per active field: a present, non-null value must coerce to the field's
  /// kind ([`Error::TypeCoercion`] otherwise); an absent value on a required
  /// field is [`Error::MissingRequiredField`]; any other absence fills from
  /// the field default or the kind zero value (an absent `date` stays
  /// absent). Input keys outside the active schema are ignored.
  pub fn create(registry: &SchemaRegistry, values: &ValueMap) -> Result<Self> {
    let mut out = BTreeMap::new();
    for def in registry.active_fields() {
      match values.get(&def.name).filter(|v| !v.is_null()) {
        Some(raw) => {
          let value = FieldValue::coerce(def.kind, raw).ok_or_else(|| {
            Error::TypeCoercion {
              field: def.name.clone(),
              value: display_raw(raw),
              kind:  def.kind,
            }
          })?;
          out.insert(def.name.clone(), value);
        }
        None if def.required => {
          return Err(Error::MissingRequiredField(def.name.clone()));
        }
        None => {
          if let Some(v) = def.default.clone().or_else(|| def.kind.zero_value())
          {
            out.insert(def.name.clone(), v);
          }
        }
      }
    }

    let now = Utc::now();
    Ok(Self {
      id: Uuid::new_v4(),
      created_at: now,
      updated_at: now,
      values: out,
    })
  }

  /// Replace one field's value, re-validating it against the active schema.
  ///
  /// Returns an updated copy with `updated_at` refreshed; `self` is left
  /// untouched.
  pub fn update_field(
    &self,
    registry: &SchemaRegistry,
    name: &str,
    value: &Value,
  ) -> Result<Self> {
    let def = registry
      .active_fields()
      .into_iter()
      .find(|d| d.name == name)
      .ok_or_else(|| Error::UnknownField(name.to_string()))?;

    let coerced = FieldValue::coerce(def.kind, value).ok_or_else(|| {
      Error::TypeCoercion {
        field: def.name.clone(),
        value: display_raw(value),
        kind:  def.kind,
      }
    })?;

    let mut updated = self.clone();
    updated.values.insert(def.name, coerced);
    updated.updated_at = Utc::now();
    Ok(updated)
  }
}

fn display_raw(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Case-insensitive substring search over every text field value.
///
/// Input order is preserved; an empty query matches everything.
pub fn search<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
  if query.is_empty() {
    return records.iter().collect();
  }
  let needle = query.to_lowercase();
  records
    .iter()
    .filter(|r| {
      r.values.values().any(|v| match v {
        FieldValue::Text(s) => s.to_lowercase().contains(&needle),
        _ => false,
      })
    })
    .collect()
}

// ─── Stored records and reconciliation ───────────────────────────────────────

/// A record as returned by a [`crate::store::RecordStore`]: identity,
/// timestamps, and the untyped value blob. Typed values are recovered by
/// [`Record::from_stored`].
#[derive(Debug, Clone)]
pub struct StoredRecord {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub values:     ValueMap,
}

impl StoredRecord {
  /// The stored form of `record` — what a gateway persists.
  pub fn from_record(record: &Record) -> Result<Self> {
    let values = record
      .values
      .iter()
      .map(|(name, v)| Ok((name.clone(), serde_json::to_value(v)?)))
      .collect::<Result<ValueMap>>()?;
    Ok(Self {
      id: record.id,
      created_at: record.created_at,
      updated_at: record.updated_at,
      values,
    })
  }
}

/// The result of reconciling a stored record against the active schema.
#[derive(Debug, Clone)]
pub struct Reconciled {
  pub record:    Record,
  /// Fields filled from defaults because the blob had no usable value.
  pub defaulted: Vec<String>,
  /// Stored fields with no place in the active schema, dropped from the
  /// view (the store copy keeps them).
  pub unknown:   Vec<String>,
}

impl Record {
  /// Reconcile a stored blob against the currently active schema.
  ///
  /// Never fails: a missing or no-longer-coercible value falls back to the
  /// field default (or kind zero value), and every fallback is reported in
  /// [`Reconciled::defaulted`]. The store copy is not modified, so swapping
  /// the active type back restores the original view.
  pub fn from_stored(
    registry: &SchemaRegistry,
    stored: StoredRecord,
  ) -> Reconciled {
    let fields = registry.active_fields();
    let mut values = BTreeMap::new();
    let mut defaulted = Vec::new();

    for def in &fields {
      let coerced = stored
        .values
        .get(&def.name)
        .filter(|v| !v.is_null())
        .and_then(|v| FieldValue::coerce(def.kind, v));
      match coerced {
        Some(v) => {
          values.insert(def.name.clone(), v);
        }
        None => {
          if let Some(v) = def.default.clone().or_else(|| def.kind.zero_value())
          {
            values.insert(def.name.clone(), v);
            defaulted.push(def.name.clone());
          } else if stored.values.contains_key(&def.name) {
            // An unusable date with no default: stays absent, still reported.
            defaulted.push(def.name.clone());
          }
        }
      }
    }

    let known: BTreeSet<&str> = fields.iter().map(|d| d.name.as_str()).collect();
    let unknown = stored
      .values
      .keys()
      .filter(|k| !known.contains(k.as_str()))
      .cloned()
      .collect();

    Reconciled {
      record: Record {
        id: stored.id,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
        values,
      },
      defaulted,
      unknown,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::field::{FieldDefinition, FieldKind, FieldValue};

  fn retail_registry() -> SchemaRegistry {
    SchemaRegistry::with_types([(
      "retail",
      vec![
        FieldDefinition::required("name", FieldKind::Text),
        FieldDefinition::required("qty", FieldKind::Integer),
        FieldDefinition::required("price", FieldKind::Decimal),
        FieldDefinition::optional("note", FieldKind::Text),
        FieldDefinition::optional("restocked", FieldKind::Date),
      ],
    )])
    .unwrap()
  }

  fn sword(registry: &SchemaRegistry) -> Record {
    let values: ValueMap = [
      ("name".to_string(), json!("Sword")),
      ("qty".to_string(), json!(2)),
      ("price".to_string(), json!("100.00")),
    ]
    .into();
    Record::create(registry, &values).unwrap()
  }

  #[test]
  fn create_fills_defaults_and_zero_values() {
    let registry = retail_registry();
    let record = sword(&registry);

    assert_eq!(record.values["name"], FieldValue::Text("Sword".into()));
    assert_eq!(record.values["qty"], FieldValue::Integer(2));
    assert_eq!(
      record.values["price"],
      FieldValue::Decimal("100.00".parse().unwrap())
    );
    // Optional text fills its zero value; optional date stays absent.
    assert_eq!(record.values["note"], FieldValue::Text(String::new()));
    assert!(!record.values.contains_key("restocked"));
    assert_eq!(record.created_at, record.updated_at);
  }

  #[test]
  fn create_rejects_missing_required_field() {
    let registry = retail_registry();
    let values: ValueMap = [("name".to_string(), json!("Sword"))].into();
    let err = Record::create(&registry, &values).unwrap_err();
    assert!(matches!(err, Error::MissingRequiredField(f) if f == "qty"));
  }

  #[test]
  fn create_rejects_uncoercible_value() {
    let registry = retail_registry();
    let values: ValueMap = [
      ("name".to_string(), json!("Shield")),
      ("qty".to_string(), json!("two")),
      ("price".to_string(), json!("50")),
    ]
    .into();
    let err = Record::create(&registry, &values).unwrap_err();
    assert!(
      matches!(err, Error::TypeCoercion { field, value, .. } if field == "qty" && value == "two")
    );
  }

  #[test]
  fn create_ignores_keys_outside_the_schema() {
    let registry = retail_registry();
    let values: ValueMap = [
      ("name".to_string(), json!("Sword")),
      ("qty".to_string(), json!(1)),
      ("price".to_string(), json!("9.99")),
      ("colour".to_string(), json!("blue")),
    ]
    .into();
    let record = Record::create(&registry, &values).unwrap();
    assert!(!record.values.contains_key("colour"));
  }

  #[test]
  fn update_field_returns_a_fresh_copy() {
    let registry = retail_registry();
    let record = sword(&registry);

    let updated = record
      .update_field(&registry, "qty", &json!(5))
      .unwrap();
    assert_eq!(updated.values["qty"], FieldValue::Integer(5));
    assert_eq!(record.values["qty"], FieldValue::Integer(2));
    assert!(updated.updated_at >= record.updated_at);
    assert_eq!(updated.id, record.id);
  }

  #[test]
  fn update_field_rejects_unknown_and_uncoercible() {
    let registry = retail_registry();
    let record = sword(&registry);

    let err = record
      .update_field(&registry, "colour", &json!("blue"))
      .unwrap_err();
    assert!(matches!(err, Error::UnknownField(f) if f == "colour"));

    let err = record
      .update_field(&registry, "qty", &json!("lots"))
      .unwrap_err();
    assert!(matches!(err, Error::TypeCoercion { field, .. } if field == "qty"));
  }

  #[test]
  fn search_is_case_insensitive_substring() {
    let registry = retail_registry();
    let records = vec![sword(&registry)];

    let hits = search(&records, "sw");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, records[0].id);

    assert!(search(&records, "zz").is_empty());
    assert_eq!(search(&records, "").len(), 1);
  }

  #[test]
  fn search_preserves_input_order() {
    let registry = retail_registry();
    let mut records = Vec::new();
    for name in ["Axe", "Sword", "Saw"] {
      let values: ValueMap = [
        ("name".to_string(), json!(name)),
        ("qty".to_string(), json!(1)),
        ("price".to_string(), json!("1.00")),
      ]
      .into();
      records.push(Record::create(&registry, &values).unwrap());
    }

    let hits = search(&records, "s");
    let names: Vec<_> = hits
      .iter()
      .map(|r| r.values["name"].to_display_string())
      .collect();
    assert_eq!(names, ["Sword", "Saw"]);
  }

  #[test]
  fn stored_round_trip_is_field_for_field_equal() {
    let registry = retail_registry();
    let record = sword(&registry);

    let stored = StoredRecord::from_record(&record).unwrap();
    let reconciled = Record::from_stored(&registry, stored);

    assert_eq!(reconciled.record.values, record.values);
    assert!(reconciled.defaulted.is_empty());
    assert!(reconciled.unknown.is_empty());
  }

  #[test]
  fn reconcile_fills_missing_required_fields_and_reports_them() {
    let registry = retail_registry();
    let stored = StoredRecord {
      id:         Uuid::new_v4(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
      values:     [("name".to_string(), json!("Ledger"))].into(),
    };

    let reconciled = Record::from_stored(&registry, stored);
    assert_eq!(reconciled.record.values["qty"], FieldValue::Integer(0));
    assert_eq!(
      reconciled.record.values["price"],
      FieldValue::Decimal(rust_decimal::Decimal::ZERO)
    );
    assert!(reconciled.defaulted.contains(&"qty".to_string()));
    assert!(reconciled.defaulted.contains(&"price".to_string()));
  }

  #[test]
  fn reconcile_reports_fields_outside_the_schema() {
    let registry = retail_registry();
    let stored = StoredRecord {
      id:         Uuid::new_v4(),
      created_at: Utc::now(),
      updated_at: Utc::now(),
      values:     [
        ("name".to_string(), json!("Ledger")),
        ("qty".to_string(), json!(1)),
        ("price".to_string(), json!("3.00")),
        ("isbn".to_string(), json!("123-456")),
      ]
      .into(),
    };

    let reconciled = Record::from_stored(&registry, stored);
    assert_eq!(reconciled.unknown, vec!["isbn".to_string()]);
    assert!(!reconciled.record.values.contains_key("isbn"));
  }

  #[test]
  fn type_switch_round_trip_does_not_touch_stored_values() {
    let registry = SchemaRegistry::with_types([
      (
        "a",
        vec![
          FieldDefinition::required("name", FieldKind::Text),
          FieldDefinition::required("qty", FieldKind::Integer),
        ],
      ),
      (
        "b",
        vec![FieldDefinition::required("title", FieldKind::Text)],
      ),
    ])
    .unwrap();
    registry.set_active_type("a").unwrap();

    let values: ValueMap =
      [("name".to_string(), json!("Rope")), ("qty".to_string(), json!(4))]
        .into();
    let record = Record::create(&registry, &values).unwrap();
    let stored = StoredRecord::from_record(&record).unwrap();

    // A -> B -> A with no intervening writes: the blob is untouched and the
    // reconciled view under A matches the original.
    registry.set_active_type("b").unwrap();
    let under_b = Record::from_stored(&registry, stored.clone());
    assert!(under_b.defaulted.contains(&"title".to_string()));

    registry.set_active_type("a").unwrap();
    let under_a = Record::from_stored(&registry, stored);
    assert_eq!(under_a.record.values, record.values);
    assert!(under_a.defaulted.is_empty());
  }
}
