//! `tally` — command-line front end for the tally inventory tracker.
//!
//! The core makes no assumption about how it is driven; this binary is the
//! thin operator surface: pick an inventory type, add/list/search/delete
//! records, preview and commit datasheet imports.
//!
//! # Usage
//!
//! ```
//! tally use retail
//! tally add name=Sword quantity=2 cost_price=60 selling_price=100
//! tally import shipment.csv            # preview only
//! tally import shipment.csv --commit   # persist the validated rows
//! ```

mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tally_core::{
  record::{self, Record, ValueMap},
  schema::{SchemaRegistry, type_description},
  store::RecordStore as _,
};
use tally_import::{ImportReport, map::MappingTarget};
use tally_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tally", about = "Offline inventory tracker")]
struct Cli {
  /// Path to the SQLite database file.
  #[arg(long, default_value = "data/tally.db", value_name = "FILE")]
  db: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// List the registered inventory types.
  Types,
  /// Select the active inventory type.
  Use {
    #[arg(value_name = "TYPE")]
    ty: String,
  },
  /// Add one record from field=value pairs.
  Add {
    #[arg(value_name = "FIELD=VALUE", required = true)]
    values: Vec<String>,
  },
  /// List all records under the active schema.
  List,
  /// Case-insensitive substring search over text fields.
  Search { query: String },
  /// Delete a record by id.
  Delete { id: Uuid },
  /// Preview a datasheet import; nothing is written without --commit.
  Import {
    file: PathBuf,
    /// Persist the validated rows instead of only previewing.
    #[arg(long)]
    commit: bool,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let registry = SchemaRegistry::builtin();
  let settings_path = settings::settings_path(&cli.db);
  if let Some(ty) = settings::load_active_type(&settings_path)
    && registry.set_active_type(&ty).is_err()
  {
    tracing::warn!(%ty, "ignoring unknown inventory type from settings");
  }

  match cli.command {
    Command::Types => cmd_types(&registry),
    Command::Use { ty } => cmd_use(&registry, &settings_path, &ty),
    Command::Add { values } => {
      cmd_add(&registry, &open_store(&cli.db)?, &values)
    }
    Command::List => cmd_list(&registry, &open_store(&cli.db)?),
    Command::Search { query } => {
      cmd_search(&registry, &open_store(&cli.db)?, &query)
    }
    Command::Delete { id } => cmd_delete(&open_store(&cli.db)?, id),
    Command::Import { file, commit } => {
      cmd_import(&registry, &open_store(&cli.db)?, &file, commit)
    }
  }
}

fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  SqliteStore::open(path)
    .with_context(|| format!("opening store {}", path.display()))
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn cmd_types(registry: &SchemaRegistry) -> anyhow::Result<()> {
  let active = registry.active_type();
  for ty in registry.list_types() {
    let marker = if ty == active { "*" } else { " " };
    match type_description(ty) {
      Some(desc) => println!("{marker} {ty:<12} {desc}"),
      None => println!("{marker} {ty}"),
    }
  }
  Ok(())
}

fn cmd_use(
  registry: &SchemaRegistry,
  settings_path: &Path,
  ty: &str,
) -> anyhow::Result<()> {
  registry.set_active_type(ty)?;
  settings::save_active_type(settings_path, ty)?;
  println!("active inventory type: {ty}");
  Ok(())
}

fn cmd_add(
  registry: &SchemaRegistry,
  store: &SqliteStore,
  pairs: &[String],
) -> anyhow::Result<()> {
  let mut values = ValueMap::new();
  for pair in pairs {
    let Some((field, value)) = pair.split_once('=') else {
      bail!("expected field=value, got {pair:?}");
    };
    values.insert(
      field.trim().to_string(),
      Value::String(value.trim().to_string()),
    );
  }

  let record = Record::create(registry, &values)?;
  store.save(&record)?;
  println!("added {}", record.id);
  Ok(())
}

fn cmd_list(
  registry: &SchemaRegistry,
  store: &SqliteStore,
) -> anyhow::Result<()> {
  let records = load_records(registry, store)?;
  print_records(registry, &records);
  Ok(())
}

fn cmd_search(
  registry: &SchemaRegistry,
  store: &SqliteStore,
  query: &str,
) -> anyhow::Result<()> {
  let records = load_records(registry, store)?;
  let hits: Vec<Record> =
    record::search(&records, query).into_iter().cloned().collect();
  print_records(registry, &hits);
  Ok(())
}

fn cmd_delete(store: &SqliteStore, id: Uuid) -> anyhow::Result<()> {
  if store.delete_by_id(id)? {
    println!("deleted {id}");
    Ok(())
  } else {
    bail!("no record with id {id}")
  }
}

fn cmd_import(
  registry: &SchemaRegistry,
  store: &SqliteStore,
  file: &Path,
  commit: bool,
) -> anyhow::Result<()> {
  let reports = tally_import::preview_file(file, registry)?;
  for report in &reports {
    print_report(report);
  }

  if commit {
    for report in &reports {
      let outcome = tally_import::commit(report, store);
      println!(
        "{}: persisted {} record(s), {} failure(s)",
        report.table,
        outcome.persisted,
        outcome.failures.len()
      );
      for failure in &outcome.failures {
        println!("  {}: {}", failure.id, failure.message);
      }
    }
  } else {
    println!("preview only; re-run with --commit to persist");
  }
  Ok(())
}

// ─── Output helpers ───────────────────────────────────────────────────────────

fn load_records(
  registry: &SchemaRegistry,
  store: &SqliteStore,
) -> anyhow::Result<Vec<Record>> {
  Ok(
    store
      .fetch_all()?
      .into_iter()
      .map(|stored| Record::from_stored(registry, stored).record)
      .collect(),
  )
}

fn print_records(registry: &SchemaRegistry, records: &[Record]) {
  let fields = registry.active_fields();
  let header: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
  println!("{:<36}  {}", "id", header.join("  "));

  for record in records {
    let cells: Vec<String> = fields
      .iter()
      .map(|f| {
        record
          .values
          .get(&f.name)
          .map(|v| v.to_display_string())
          .unwrap_or_default()
      })
      .collect();
    println!("{:<36}  {}", record.id, cells.join("  "));
  }
  println!("{} record(s)", records.len());
}

fn print_report(report: &ImportReport) {
  println!("table {} (from {:?})", report.table, report.source_table);
  for mapping in &report.mapping {
    match &mapping.target {
      MappingTarget::Field { name, .. } => {
        println!("  {} -> {name}", mapping.source);
      }
      MappingTarget::Unmapped => {
        println!("  {} -> (unmapped)", mapping.source);
      }
    }
  }
  for entry in &report.sanitize_log {
    println!(
      "  row {}: {} {:?} -> {:?} ({})",
      entry.row, entry.field, entry.original, entry.fixed, entry.reason
    );
  }
  for error in &report.validation_errors {
    println!(
      "  row {} rejected: field {}: {}",
      error.row, error.field, error.reason
    );
  }
  println!(
    "  {} row(s) ok, {} rejected",
    report.records.len(),
    report.validation_errors.len()
  );
}
