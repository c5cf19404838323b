//! Error types for `tally-core`.

use thiserror::Error;

use crate::field::FieldKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown inventory type: {0:?}")]
  UnknownType(String),

  #[error("unknown field: {0:?}")]
  UnknownField(String),

  #[error("required field {0:?} is missing")]
  MissingRequiredField(String),

  #[error("cannot coerce {value:?} into {kind} for field {field:?}")]
  TypeCoercion {
    field: String,
    value: String,
    kind:  FieldKind,
  },

  #[error("inventory type {0:?} has an empty schema")]
  EmptySchema(String),

  #[error("duplicate field {field:?} in inventory type {ty:?}")]
  DuplicateField { ty: String, field: String },

  #[error("default for field {field:?} does not match its {kind} kind")]
  DefaultKindMismatch { field: String, kind: FieldKind },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
