//! Core types and data structures for the prima nota ledger

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Namespace of identifiers derived from sheet rows that carry no id
const SHEET_ROW_NAMESPACE: Uuid = Uuid::from_u128(0x7b3e_4a52_9c1d_4f06_8e2a_d51c_0b9f_6e13);

/// Stable surrogate identifier of a movement
///
/// Assigned once when the movement is created and used for every update and
/// delete, so that two movements carrying identical values stay distinct.
/// Rows written before ids existed get one derived from their position and
/// content until the sheet is saved with an id column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(Uuid);

impl MovementId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier of a sheet row without a usable id cell
    ///
    /// Same row position and cells give the same id on every load.
    pub fn for_sheet_row(row: usize, cells: &[String]) -> Self {
        let mut key = row.to_string();
        for cell in cells {
            key.push('\u{1f}');
            key.push_str(cell.trim());
        }
        Self(Uuid::new_v5(&SHEET_ROW_NAMESPACE, key.as_bytes()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MovementId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Calendar month a movement belongs to, displayed as `YYYY-MM`
///
/// Field order gives chronological ordering. Serialized as its text form so
/// it can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Period containing the given date
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for Period {
    type Error = PrimaNotaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for Period {
    type Err = PrimaNotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrimaNotaError::Validation(format!("Invalid period '{}'", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

/// One ledger entry of the prima nota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Stable identifier used for update/delete addressing
    pub id: MovementId,
    /// Date of the movement (no time component)
    pub date: NaiveDate,
    /// Reason code ("causale")
    pub reason: String,
    /// Cost center ("centro")
    pub cost_center: String,
    /// Signed amount: positive is income, negative is expense
    pub amount: BigDecimal,
    /// Free text description
    pub description: String,
    /// Cash or bank account ("cassa") the movement is booked on
    pub account: String,
    /// Free text notes
    pub notes: String,
}

impl Movement {
    /// Create a movement with a freshly generated identifier
    pub fn new(
        date: NaiveDate,
        reason: String,
        cost_center: String,
        amount: BigDecimal,
        account: String,
    ) -> Self {
        Self {
            id: MovementId::new(),
            date,
            reason,
            cost_center,
            amount,
            description: String::new(),
            account,
            notes: String::new(),
        }
    }

    /// Derived `year-month` of the movement date
    pub fn period(&self) -> Period {
        Period::of(self.date)
    }

    pub fn is_income(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }

    pub fn is_expense(&self) -> bool {
        self.amount < BigDecimal::from(0)
    }
}

/// Externally declared balance of one account (bank statement, cash count)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredBalance {
    pub account: String,
    pub declared_amount: BigDecimal,
}

impl DeclaredBalance {
    pub fn new(account: impl Into<String>, declared_amount: BigDecimal) -> Self {
        Self {
            account: account.into(),
            declared_amount,
        }
    }
}

/// Amount text that could not be parsed and was degraded to zero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Unparseable amount '{raw}', counted as zero")]
pub struct NormalizationWarning {
    /// The original input as received
    pub raw: String,
}

/// Errors that can occur in the prima nota system
#[derive(Debug, thiserror::Error)]
pub enum PrimaNotaError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Required column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },
    #[error("Movement not found: {0}")]
    MovementNotFound(MovementId),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

/// Result type for prima nota operations
pub type PrimaNotaResult<T> = Result<T, PrimaNotaError>;
