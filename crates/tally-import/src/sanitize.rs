//! Cell sanitization — the `Sanitized` stage.
//!
//! Deterministic, kind-specific normalization of raw cell text before type
//! coercion. Every change is reported back to the caller with a reason tag;
//! values that cannot be normalized are returned untouched so the Validated
//! stage can flag the row. Running a pass over already-sanitized values is a
//! no-op.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tally_core::field::{DATE_FORMAT, FieldKind};

// ─── Reasons ─────────────────────────────────────────────────────────────────

/// Why a cell's text changed during sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SanitizeReason {
  /// Currency symbols, thousands separators, or accounting parentheses
  /// removed before decimal parsing.
  CurrencyStripped,
  /// Non-digit characters removed before integer parsing.
  DigitsStripped,
  /// Leading/trailing whitespace removed.
  WhitespaceTrimmed,
  /// A recognised date format rewritten to the canonical `%Y-%m-%d`.
  DateNormalized,
}

impl SanitizeReason {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::CurrencyStripped => "currency-stripped",
      Self::DigitsStripped => "digits-stripped",
      Self::WhitespaceTrimmed => "whitespace-trimmed",
      Self::DateNormalized => "date-normalized",
    }
  }
}

impl fmt::Display for SanitizeReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The result of sanitizing one cell. `reason` is `None` when the text was
/// already clean (or could not be fixed at all).
#[derive(Debug, Clone)]
pub struct Sanitized {
  pub value:  String,
  pub reason: Option<SanitizeReason>,
}

fn unchanged(raw: &str) -> Sanitized {
  Sanitized {
    value:  raw.to_string(),
    reason: None,
  }
}

fn trimmed_or_unchanged(raw: &str, trimmed: &str) -> Sanitized {
  if trimmed == raw {
    unchanged(raw)
  } else {
    Sanitized {
      value:  trimmed.to_string(),
      reason: Some(SanitizeReason::WhitespaceTrimmed),
    }
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Normalize one raw cell for a field of the given kind.
pub fn sanitize_cell(kind: FieldKind, raw: &str) -> Sanitized {
  match kind {
    FieldKind::Text => trimmed_or_unchanged(raw, raw.trim()),
    FieldKind::Integer => sanitize_integer(raw),
    FieldKind::Decimal => sanitize_decimal(raw),
    FieldKind::Date => sanitize_date(raw),
  }
}

// ─── Integer ─────────────────────────────────────────────────────────────────

fn sanitize_integer(raw: &str) -> Sanitized {
  let trimmed = raw.trim();
  if is_integer_literal(trimmed) {
    return trimmed_or_unchanged(raw, trimmed);
  }

  let digits: String =
    trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
  if digits.is_empty() {
    // Nothing salvageable ("two", "n/a"): leave for validation to flag.
    return unchanged(raw);
  }

  let value = if trimmed.starts_with('-') {
    format!("-{digits}")
  } else {
    digits
  };
  Sanitized {
    value,
    reason: Some(SanitizeReason::DigitsStripped),
  }
}

fn is_integer_literal(s: &str) -> bool {
  let rest = s.strip_prefix(['+', '-']).unwrap_or(s);
  !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

fn sanitize_decimal(raw: &str) -> Sanitized {
  let trimmed = raw.trim();
  if trimmed.parse::<Decimal>().is_ok() {
    return trimmed_or_unchanged(raw, trimmed);
  }

  // Keep digits, separators, sign, and accounting parentheses; drop
  // currency symbols and units.
  let mut s: String = trimmed
    .chars()
    .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '(' | ')'))
    .collect();
  if s.is_empty() {
    return unchanged(raw);
  }

  // "(1,234.00)" is an accounting negative.
  if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
    s = format!("-{}", &s[1..s.len() - 1]);
  }

  // Comma handling: alongside a dot (or repeated) commas are thousands
  // separators; a lone comma with no dot is a decimal comma.
  if s.matches(',').count() > 1 || (s.contains(',') && s.contains('.')) {
    s = s.replace(',', "");
  } else if s.contains(',') {
    s = s.replace(',', ".");
  }

  if s.parse::<Decimal>().is_ok() {
    Sanitized {
      value:  s,
      reason: Some(SanitizeReason::CurrencyStripped),
    }
  } else {
    unchanged(raw)
  }
}

// ─── Date ────────────────────────────────────────────────────────────────────

/// Accepted input formats, tried in order; the first is canonical.
const DATE_INPUT_FORMATS: &[&str] =
  &[DATE_FORMAT, "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

fn sanitize_date(raw: &str) -> Sanitized {
  let trimmed = raw.trim();
  if NaiveDate::parse_from_str(trimmed, DATE_FORMAT).is_ok() {
    return trimmed_or_unchanged(raw, trimmed);
  }

  for format in &DATE_INPUT_FORMATS[1..] {
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
      return Sanitized {
        value:  date.format(DATE_FORMAT).to_string(),
        reason: Some(SanitizeReason::DateNormalized),
      };
    }
  }
  unchanged(raw)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
