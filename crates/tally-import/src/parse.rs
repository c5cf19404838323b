//! Source-file parsing — the `Parsed` stage.
//!
//! Every supported format is reduced to the same shape: an ordered list of
//! named [`SourceTable`]s, one per CSV file or workbook sheet, holding raw
//! string cells. Nothing here knows about schemas; mapping and sanitization
//! happen downstream.

use std::{ffi::OsStr, fs, path::Path};

use calamine::{Data, Reader as _, open_workbook_auto};

use crate::{Error, Result};

// ─── SourceTable ─────────────────────────────────────────────────────────────

/// One raw table extracted from an import source.
#[derive(Debug, Clone)]
pub struct SourceTable {
  /// Logical name: file stem, or `stem_sheet` for multi-sheet workbooks.
  pub name:    String,
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Parse an import source into raw tables.
///
/// CSV/TSV/TXT files yield one table; workbooks yield one table per
/// non-empty sheet. Unsupported extensions and malformed files fail with
/// the underlying parser message — content is never guessed.
pub fn parse_file(path: &Path) -> Result<Vec<SourceTable>> {
  let ext = path
    .extension()
    .and_then(OsStr::to_str)
    .map(str::to_lowercase)
    .unwrap_or_default();

  match ext.as_str() {
    "csv" | "tsv" | "txt" => parse_delimited(path),
    "xlsx" | "xlsm" | "xls" | "ods" => parse_workbook(path),
    other => Err(Error::UnsupportedExtension(other.to_string())),
  }
}

/// Extensions accepted by [`parse_file`], for file-dialog filters and help
/// text.
pub fn supported_extensions() -> &'static [&'static str] {
  &["csv", "tsv", "txt", "xlsx", "xlsm", "xls", "ods"]
}

// ─── Delimited text ──────────────────────────────────────────────────────────

fn parse_delimited(path: &Path) -> Result<Vec<SourceTable>> {
  let raw = fs::read_to_string(path).map_err(|e| Error::unreadable(path, &e))?;
  let delimiter = detect_delimiter(&raw);

  let mut reader = csv::ReaderBuilder::new()
    .delimiter(delimiter)
    .has_headers(false)
    .flexible(true)
    .from_reader(raw.as_bytes());

  let mut rows: Vec<Vec<String>> = Vec::new();
  for result in reader.records() {
    let record = result.map_err(|e| Error::unreadable(path, &e))?;
    rows.push(record.iter().map(str::to_string).collect());
  }

  Ok(vec![table_from_rows(file_stem(path), rows)])
}

/// Pick the most frequent candidate delimiter in the leading lines.
/// First listed wins ties; comma when nothing matches.
fn detect_delimiter(raw: &str) -> u8 {
  let sample: Vec<&str> = raw.lines().take(5).collect();
  let sample = sample.join("\n");

  let counts = [
    (b'\t', sample.matches('\t').count()),
    (b',', sample.matches(',').count()),
    (b';', sample.matches(';').count()),
    (b'|', sample.matches('|').count()),
  ];

  let mut best = (b',', 0usize);
  for (delimiter, count) in counts {
    if count > best.1 {
      best = (delimiter, count);
    }
  }
  best.0
}

// ─── Workbooks ───────────────────────────────────────────────────────────────

fn parse_workbook(path: &Path) -> Result<Vec<SourceTable>> {
  let mut workbook =
    open_workbook_auto(path).map_err(|e| Error::unreadable(path, &e))?;

  let sheet_names = workbook.sheet_names();
  let multi = sheet_names.len() > 1;
  let stem = file_stem(path);

  let mut tables = Vec::new();
  for sheet in sheet_names {
    let range = workbook
      .worksheet_range(&sheet)
      .map_err(|e| Error::unreadable(path, &e))?;

    let rows: Vec<Vec<String>> = range
      .rows()
      .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
      .map(|row| row.iter().map(cell_to_string).collect())
      .collect();

    let name = if multi { format!("{stem}_{sheet}") } else { stem.clone() };
    tables.push(table_from_rows(name, rows));
  }

  Ok(tables)
}

fn cell_to_string(cell: &Data) -> String {
  match cell {
    Data::Empty => String::new(),
    Data::String(s) => s.clone(),
    Data::Int(i) => i.to_string(),
    // Whole-number floats render without the trailing `.0` a spreadsheet
    // would never show.
    Data::Float(f) if f.fract() == 0.0 && f.is_finite() => {
      format!("{}", *f as i64)
    }
    Data::Float(f) => f.to_string(),
    Data::Bool(b) => b.to_string(),
    Data::DateTime(dt) => dt
      .as_datetime()
      .map(|d| d.date().format("%Y-%m-%d").to_string())
      .unwrap_or_else(|| cell.to_string()),
    other => other.to_string(),
  }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

fn file_stem(path: &Path) -> String {
  path
    .file_stem()
    .and_then(OsStr::to_str)
    .unwrap_or("table")
    .to_string()
}

/// Split raw rows into header + data.
///
/// The first row is a header when any cell is non-numeric or its width
/// differs from the second row; otherwise synthetic `col_N` names are used
/// and every row is data.
fn table_from_rows(name: String, rows: Vec<Vec<String>>) -> SourceTable {
  if rows.is_empty() {
    return SourceTable {
      name,
      columns: Vec::new(),
      rows: Vec::new(),
    };
  }

  let header = rows.len() > 1
    && (rows[0].iter().any(|cell| !is_numeric(cell))
      || rows[0].len() != rows[1].len());

  if header {
    let mut rows = rows.into_iter();
    let columns = rows
      .next()
      .unwrap_or_default()
      .into_iter()
      .enumerate()
      .map(|(i, cell)| {
        let cell = cell.trim().to_string();
        if cell.is_empty() { format!("col_{}", i + 1) } else { cell }
      })
      .collect();
    SourceTable {
      name,
      columns,
      rows: rows.collect(),
    }
  } else {
    let columns = (1..=rows[0].len()).map(|i| format!("col_{i}")).collect();
    SourceTable {
      name,
      columns,
      rows,
    }
  }
}

fn is_numeric(s: &str) -> bool { s.trim().parse::<f64>().is_ok() }

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  fn write_temp(name: &str, contents: &str) -> tempfile::TempPath {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("tally-parse-{}-{name}", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    tempfile::TempPath::from_path(path)
  }

  #[test]
  fn csv_with_header_row() {
    let path = write_temp("header.csv", "name,qty,price\nSword,2,$100.00\n");
    let tables = parse_file(&path).unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].columns, ["name", "qty", "price"]);
    assert_eq!(tables[0].rows, [["Sword", "2", "$100.00"]]);
  }

  #[test]
  fn csv_without_header_gets_synthetic_columns() {
    let path = write_temp("bare.csv", "1,2,3\n4,5,6\n");
    let tables = parse_file(&path).unwrap();
    assert_eq!(tables[0].columns, ["col_1", "col_2", "col_3"]);
    assert_eq!(tables[0].rows.len(), 2);
  }

  #[test]
  fn empty_file_parses_to_an_empty_table() {
    let path = write_temp("empty.csv", "");
    let tables = parse_file(&path).unwrap();
    assert_eq!(tables.len(), 1);
    assert!(tables[0].columns.is_empty());
    assert!(tables[0].rows.is_empty());
  }

  #[test]
  fn tab_delimited_text_is_detected() {
    let path = write_temp("tabs.txt", "name\tqty\nRope\t7\n");
    let tables = parse_file(&path).unwrap();
    assert_eq!(tables[0].columns, ["name", "qty"]);
    assert_eq!(tables[0].rows, [["Rope", "7"]]);
  }

  #[test]
  fn semicolon_delimiter_is_detected() {
    let path = write_temp("semi.csv", "name;qty\nAxe;3\n");
    let tables = parse_file(&path).unwrap();
    assert_eq!(tables[0].columns, ["name", "qty"]);
  }

  #[test]
  fn unsupported_extension_is_rejected() {
    let err = parse_file(Path::new("inventory.pdf")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedExtension(e) if e == "pdf"));
  }

  #[test]
  fn missing_file_is_unreadable() {
    let err = parse_file(Path::new("does-not-exist.csv")).unwrap_err();
    assert!(matches!(err, Error::UnreadableSource { .. }));
  }

  #[test]
  fn header_detection_survives_ragged_first_row() {
    // First row narrower than the second: treated as a header.
    let path = write_temp("ragged.csv", "name,qty\nSword,2,extra\n");
    let tables = parse_file(&path).unwrap();
    assert_eq!(tables[0].columns, ["name", "qty"]);
    assert_eq!(tables[0].rows.len(), 1);
  }
}
