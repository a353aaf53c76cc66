//! Amount normalization and Italian-locale formatting
//!
//! Amounts reach the ledger either as native numbers or as text typed by
//! users or read back from the spreadsheet (`1.234,56`, `€ 40,00`,
//! `1500.5`). Everything funnels through [`normalize`] so that the
//! thousands-dot / decimal-comma convention is handled in one place, and
//! [`format_euro`] renders values back in the same convention.

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{NormalizationWarning, PrimaNotaError, PrimaNotaResult};

/// Currency marker appended by [`format_euro`]
pub const EURO_MARKER: &str = "€";

/// Number of fractional digits kept on persisted amounts
pub const CENT_SCALE: i64 = 2;

/// Raw amount as received from a form, a sheet cell or a caller
#[derive(Debug, Clone, PartialEq)]
pub enum RawAmount {
    /// Already a decimal value
    Decimal(BigDecimal),
    /// Whole number value
    Integer(i64),
    /// Floating point value (spreadsheet numeric cells)
    Float(f64),
    /// Free text in Italian or plain dot-decimal convention
    Text(String),
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAmount::Decimal(value) => write!(f, "{}", value),
            RawAmount::Integer(value) => write!(f, "{}", value),
            RawAmount::Float(value) => write!(f, "{}", value),
            RawAmount::Text(value) => f.write_str(value),
        }
    }
}

impl From<BigDecimal> for RawAmount {
    fn from(value: BigDecimal) -> Self {
        RawAmount::Decimal(value)
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        RawAmount::Integer(value)
    }
}

impl From<i32> for RawAmount {
    fn from(value: i32) -> Self {
        RawAmount::Integer(value.into())
    }
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Float(value)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

/// Result of a lenient normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    /// Canonical value, zero when the input could not be parsed
    pub value: BigDecimal,
    /// Present when the input was degraded to zero
    pub warning: Option<NormalizationWarning>,
}

impl Normalized {
    pub fn is_clean(&self) -> bool {
        self.warning.is_none()
    }
}

/// Convert a raw amount into a canonical decimal, degrading to zero on
/// unparseable input.
///
/// Numeric inputs are converted directly. Text has currency markers and
/// whitespace removed; when a comma is present it is the decimal separator
/// and every dot is a thousands separator, otherwise the text is parsed as a
/// plain dot-decimal.
pub fn normalize(raw: impl Into<RawAmount>) -> Normalized {
    let raw = raw.into();
    match parse_raw(&raw) {
        Some(value) => Normalized {
            value,
            warning: None,
        },
        None => Normalized {
            value: BigDecimal::from(0),
            warning: Some(NormalizationWarning {
                raw: raw.to_string(),
            }),
        },
    }
}

/// Strict variant of [`normalize`] used when validating new entries
pub fn normalize_strict(raw: impl Into<RawAmount>) -> PrimaNotaResult<BigDecimal> {
    let raw = raw.into();
    parse_raw(&raw).ok_or_else(|| PrimaNotaError::InvalidAmount(raw.to_string()))
}

fn parse_raw(raw: &RawAmount) -> Option<BigDecimal> {
    match raw {
        RawAmount::Decimal(value) => Some(value.clone()),
        RawAmount::Integer(value) => Some(BigDecimal::from(*value)),
        // Shortest round-trip text keeps 0.1 as 0.1 instead of its binary expansion
        RawAmount::Float(value) if value.is_finite() => BigDecimal::from_str(&value.to_string()).ok(),
        RawAmount::Float(_) => None,
        RawAmount::Text(text) => parse_text(text),
    }
}

fn parse_text(text: &str) -> Option<BigDecimal> {
    let cleaned: String = strip_currency(text)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let canonical = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };

    // Reject exponent forms and other text BigDecimal would otherwise accept
    if !canonical
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
    {
        return None;
    }

    BigDecimal::from_str(&canonical).ok()
}

fn strip_currency(text: &str) -> String {
    let without_symbol = text.replace(EURO_MARKER, "");
    let trimmed = without_symbol.trim();
    let upper = trimmed.to_ascii_uppercase();
    if let Some(rest) = upper.strip_suffix("EUR") {
        trimmed[..rest.len()].to_string()
    } else if let Some(rest) = upper.strip_prefix("EUR") {
        trimmed[trimmed.len() - rest.len()..].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Round half-up to two fractional digits
pub fn round_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(CENT_SCALE, RoundingMode::HalfUp)
}

/// Sign and absolute cent digits of a value rounded to cents, padded to at
/// least three digits
fn cent_digits(value: &BigDecimal) -> (bool, String) {
    let cents = (round_cents(value) * BigDecimal::from(100)).with_scale(0);
    let negative = cents < BigDecimal::from(0);
    let (units, _) = cents.as_bigint_and_exponent();
    let digits = units.to_string();
    (negative, format!("{:0>3}", digits.trim_start_matches('-')))
}

/// Canonical stored form: dot-decimal with exactly two fractional digits
///
/// Used for every amount written to a sheet or an export, zero included
/// (`0.00`).
pub fn canonical_amount(value: &BigDecimal) -> String {
    let (negative, digits) = cent_digits(value);
    let (integer_part, fraction) = digits.split_at(digits.len() - 2);
    let sign = if negative { "-" } else { "" };
    format!("{}{}.{}", sign, integer_part, fraction)
}

/// Render a value as `1.234,56` (no currency marker)
pub fn format_italian(value: &BigDecimal) -> String {
    let (negative, digits) = cent_digits(value);
    let (integer_part, fraction) = digits.split_at(digits.len() - 2);

    let mut grouped = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, c) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    format!("{}{},{}", sign, grouped, fraction)
}

/// Render a value with a trailing currency marker, e.g. `-1.234,56 €`
pub fn format_amount(value: &BigDecimal, marker: &str) -> String {
    if marker.is_empty() {
        format_italian(value)
    } else {
        format!("{} {}", format_italian(value), marker)
    }
}

/// Render a value as euros, e.g. `1.234,56 €`
///
/// `normalize(format_euro(v))` equals `v` rounded to cents.
pub fn format_euro(value: &BigDecimal) -> String {
    format_amount(value, EURO_MARKER)
}

/// Render a date the way the sheet stores it (`dd/mm/yyyy`)
pub fn format_italian_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parse a sheet date cell: `dd/mm/yyyy`, ISO `yyyy-mm-dd`, or ISO date-time
pub fn parse_sheet_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(text, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(text, "%d-%m-%Y"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
                .map(|dt| dt.date())
                .ok()
        })
}
