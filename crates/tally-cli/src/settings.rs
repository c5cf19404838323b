//! Persisted CLI settings — currently just the chosen inventory type.
//!
//! A small JSON file next to the database, so the selected type survives
//! between runs. The core itself never reads it; this is launcher glue.

use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Settings {
  inventory_type: String,
}

/// `settings.json` next to the database file.
pub fn settings_path(db_path: &Path) -> PathBuf {
  db_path.with_file_name("settings.json")
}

/// The stored inventory type, if a readable settings file exists.
pub fn load_active_type(path: &Path) -> Option<String> {
  let raw = fs::read_to_string(path).ok()?;
  let settings: Settings = serde_json::from_str(&raw).ok()?;
  (!settings.inventory_type.is_empty()).then_some(settings.inventory_type)
}

/// Write the inventory type back, creating parent directories as needed.
pub fn save_active_type(path: &Path, ty: &str) -> anyhow::Result<()> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  let settings = Settings {
    inventory_type: ty.to_string(),
  };
  let raw = serde_json::to_string_pretty(&settings)?;
  fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
}
