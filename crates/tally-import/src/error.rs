//! Error types for `tally-import`.
//!
//! Per-row problems are not errors — they land in the
//! [`crate::report::ImportReport`] so one bad row never aborts a batch.
//! These variants cover the whole-file failures only.

use std::{fmt, path::{Path, PathBuf}};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unsupported file type: {0:?}")]
  UnsupportedExtension(String),

  #[error("unreadable source {path}: {message}")]
  UnreadableSource { path: PathBuf, message: String },
}

impl Error {
  pub(crate) fn unreadable(path: &Path, err: &dyn fmt::Display) -> Self {
    Self::UnreadableSource {
      path:    path.to_path_buf(),
      message: err.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
