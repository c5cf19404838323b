//! The schema registry — which inventory types exist and which one is
//! active.
//!
//! The registry is an explicit handle passed (by reference or `Arc`) to
//! every consumer; it is never process-global state. Swapping the active
//! type through a shared handle propagates to all consumers immediately.
//! Records created under an earlier type are reconciled on read
//! ([`crate::record::Record::from_stored`]), never migrated.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::{PoisonError, RwLock},
};

use crate::{
  Error, Result,
  field::{FieldDefinition, FieldKind, FieldValue},
};

// ─── Registry ────────────────────────────────────────────────────────────────

/// Registered inventory types and the currently active one.
///
/// Registration takes `&mut self` and happens at startup; the active-type
/// swap takes `&self` so a shared handle can serve every consumer.
#[derive(Debug)]
pub struct SchemaRegistry {
  schemas: BTreeMap<String, Vec<FieldDefinition>>,
  active:  RwLock<String>,
}

impl SchemaRegistry {
  /// Registry with the five stock inventory types; `warehouse` is active.
  pub fn builtin() -> Self {
    use FieldKind::{Date, Decimal, Integer, Text};
    let dec = |s: &str| FieldValue::Decimal(s.parse().unwrap_or_default());

    let mut schemas = BTreeMap::new();
    schemas.insert("warehouse".to_string(), vec![
      FieldDefinition::required("name", Text),
      FieldDefinition::optional("sku", Text),
      FieldDefinition::required("quantity", Integer),
      FieldDefinition::required("price", Decimal),
      FieldDefinition::optional("category", Text),
      FieldDefinition::optional("supplier", Text),
      FieldDefinition::optional("location", Text),
      FieldDefinition::optional("min_stock", Integer)
        .with_default(FieldValue::Integer(0)),
    ]);
    schemas.insert("retail".to_string(), vec![
      FieldDefinition::required("name", Text),
      FieldDefinition::optional("barcode", Text),
      FieldDefinition::required("quantity", Integer),
      FieldDefinition::required("cost_price", Decimal),
      FieldDefinition::required("selling_price", Decimal),
      FieldDefinition::optional("brand", Text),
      FieldDefinition::optional("category", Text),
      FieldDefinition::optional("discount", Decimal).with_default(dec("0")),
    ]);
    schemas.insert("library".to_string(), vec![
      FieldDefinition::required("title", Text),
      FieldDefinition::required("author", Text),
      FieldDefinition::optional("isbn", Text),
      FieldDefinition::required("copies_total", Integer),
      FieldDefinition::required("copies_available", Integer),
      FieldDefinition::optional("genre", Text),
      FieldDefinition::optional("publisher", Text),
      FieldDefinition::optional("year", Integer),
      FieldDefinition::optional("location", Text),
    ]);
    schemas.insert("restaurant".to_string(), vec![
      FieldDefinition::required("name", Text),
      FieldDefinition::required("quantity", Decimal),
      FieldDefinition::required("unit", Text),
      FieldDefinition::required("cost_per_unit", Decimal),
      FieldDefinition::optional("supplier", Text),
      FieldDefinition::optional("expiry_date", Date),
      FieldDefinition::optional("category", Text),
      FieldDefinition::optional("min_stock", Decimal).with_default(dec("0")),
    ]);
    schemas.insert("electronics".to_string(), vec![
      FieldDefinition::required("name", Text),
      FieldDefinition::required("model", Text),
      FieldDefinition::required("brand", Text),
      FieldDefinition::required("quantity", Integer),
      FieldDefinition::required("price", Decimal),
      FieldDefinition::optional("warranty_months", Integer)
        .with_default(FieldValue::Integer(12)),
      FieldDefinition::optional("category", Text),
      FieldDefinition::optional("specifications", Text),
    ]);

    Self {
      schemas,
      active: RwLock::new("warehouse".to_string()),
    }
  }

  /// Registry over caller-supplied types. The first entry becomes active.
  pub fn with_types<I, S>(types: I) -> Result<Self>
  where
    I: IntoIterator<Item = (S, Vec<FieldDefinition>)>,
    S: Into<String>,
  {
    let mut schemas = BTreeMap::new();
    let mut first: Option<String> = None;
    for (ty, fields) in types {
      let ty = ty.into();
      validate_schema(&ty, &fields)?;
      first.get_or_insert_with(|| ty.clone());
      schemas.insert(ty, fields);
    }
    let active = first.ok_or_else(|| Error::UnknownType(String::new()))?;
    Ok(Self {
      schemas,
      active: RwLock::new(active),
    })
  }

  /// Register (or replace) an inventory type.
  pub fn register(
    &mut self,
    ty: impl Into<String>,
    fields: Vec<FieldDefinition>,
  ) -> Result<()> {
    let ty = ty.into();
    validate_schema(&ty, &fields)?;
    self.schemas.insert(ty, fields);
    Ok(())
  }

  /// All registered type identifiers, in stable order.
  pub fn list_types(&self) -> Vec<&str> {
    self.schemas.keys().map(String::as_str).collect()
  }

  /// Field definitions for `ty`.
  pub fn fields_for(&self, ty: &str) -> Result<&[FieldDefinition]> {
    self
      .schemas
      .get(ty)
      .map(Vec::as_slice)
      .ok_or_else(|| Error::UnknownType(ty.to_string()))
  }

  /// The currently active type identifier.
  pub fn active_type(&self) -> String {
    self
      .active
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Atomically swap the active type. Existing records are not migrated;
  /// they are reconciled against the new schema on read.
  pub fn set_active_type(&self, ty: &str) -> Result<()> {
    if !self.schemas.contains_key(ty) {
      return Err(Error::UnknownType(ty.to_string()));
    }
    let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
    *active = ty.to_string();
    Ok(())
  }

  /// Field definitions of the active type.
  ///
  /// Infallible: the active type always refers to a registered schema
  /// (enforced by construction and by `set_active_type`).
  pub fn active_fields(&self) -> Vec<FieldDefinition> {
    let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
    self.schemas.get(&*active).cloned().unwrap_or_default()
  }
}

fn validate_schema(ty: &str, fields: &[FieldDefinition]) -> Result<()> {
  if fields.is_empty() {
    return Err(Error::EmptySchema(ty.to_string()));
  }
  let mut seen = BTreeSet::new();
  for def in fields {
    if !seen.insert(def.name.as_str()) {
      return Err(Error::DuplicateField {
        ty:    ty.to_string(),
        field: def.name.clone(),
      });
    }
    if let Some(default) = &def.default
      && default.kind() != def.kind
    {
      return Err(Error::DefaultKindMismatch {
        field: def.name.clone(),
        kind:  def.kind,
      });
    }
  }
  Ok(())
}

/// Human-readable blurb for a built-in inventory type.
pub fn type_description(ty: &str) -> Option<&'static str> {
  match ty {
    "warehouse" => {
      Some("General warehouse inventory with SKU and location tracking")
    }
    "retail" => Some("Retail store with cost/selling prices and discounts"),
    "library" => Some("Library books with author, ISBN, and copy management"),
    "restaurant" => Some("Restaurant ingredients with units and expiry dates"),
    "electronics" => Some("Electronics with models, brands, and warranties"),
    _ => None,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_types_are_nonempty_with_unique_names() {
    let registry = SchemaRegistry::builtin();
    let types = registry.list_types();
    assert_eq!(types.len(), 5);
    for ty in types {
      let fields = registry.fields_for(ty).unwrap();
      assert!(!fields.is_empty(), "{ty} has no fields");
      let names: BTreeSet<_> = fields.iter().map(|f| f.name.as_str()).collect();
      assert_eq!(names.len(), fields.len(), "{ty} has duplicate field names");
    }
  }

  #[test]
  fn fields_for_unknown_type_errors() {
    let registry = SchemaRegistry::builtin();
    let err = registry.fields_for("garage").unwrap_err();
    assert!(matches!(err, Error::UnknownType(t) if t == "garage"));
  }

  #[test]
  fn set_active_type_swaps_the_schema() {
    let registry = SchemaRegistry::builtin();
    assert_eq!(registry.active_type(), "warehouse");

    registry.set_active_type("library").unwrap();
    assert_eq!(registry.active_type(), "library");
    assert_eq!(registry.active_fields()[0].name, "title");
  }

  #[test]
  fn set_active_type_rejects_unregistered() {
    let registry = SchemaRegistry::builtin();
    let err = registry.set_active_type("garage").unwrap_err();
    assert!(matches!(err, Error::UnknownType(_)));
    assert_eq!(registry.active_type(), "warehouse");
  }

  #[test]
  fn register_rejects_duplicate_field_names() {
    let mut registry = SchemaRegistry::builtin();
    let err = registry
      .register("bad", vec![
        FieldDefinition::required("name", FieldKind::Text),
        FieldDefinition::optional("name", FieldKind::Integer),
      ])
      .unwrap_err();
    assert!(matches!(err, Error::DuplicateField { field, .. } if field == "name"));
  }

  #[test]
  fn register_rejects_empty_schema() {
    let mut registry = SchemaRegistry::builtin();
    let err = registry.register("bad", vec![]).unwrap_err();
    assert!(matches!(err, Error::EmptySchema(t) if t == "bad"));
  }

  #[test]
  fn register_rejects_mismatched_default() {
    let mut registry = SchemaRegistry::builtin();
    let err = registry
      .register("bad", vec![
        FieldDefinition::optional("qty", FieldKind::Integer)
          .with_default(FieldValue::Text("many".into())),
      ])
      .unwrap_err();
    assert!(matches!(err, Error::DefaultKindMismatch { field, .. } if field == "qty"));
  }

  #[test]
  fn with_types_activates_the_first_entry() {
    let registry = SchemaRegistry::with_types([(
      "retail",
      vec![
        FieldDefinition::required("name", FieldKind::Text),
        FieldDefinition::required("qty", FieldKind::Integer),
      ],
    )])
    .unwrap();
    assert_eq!(registry.active_type(), "retail");
  }
}
