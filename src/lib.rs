//! # Prima Nota Core
//!
//! Cash ledger ("prima nota") library for small non-profit bookkeeping kept
//! on a spreadsheet: Italian-locale amount normalization, aggregation of
//! movements and reconciliation against declared account balances.
//!
//! ## Features
//!
//! - **Amount normalization**: `1.234,56`, `€ 40,00` or native numbers into canonical decimals
//! - **Aggregation**: income, expense and net totals per account, month, reason and cost center
//! - **Reconciliation**: computed vs declared balances per account under a one-cent tolerance
//! - **Movement management**: add, edit and delete by stable identifier
//! - **Export**: CSV of movements and reconciliation reports
//! - **Storage abstraction**: worksheet-based storage trait with an in-memory implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use prima_nota_core::{aggregate, format_euro, normalize, reconcile, Movement};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//! use std::collections::BTreeMap;
//!
//! let amount = normalize("1.234,56").value;
//! assert_eq!(format_euro(&amount), "1.234,56 €");
//!
//! let movement = Movement::new(
//!     NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
//!     "Quote".to_string(),
//!     "Generale".to_string(),
//!     amount.clone(),
//!     "Contanti".to_string(),
//! );
//! let totals = aggregate(&[movement]);
//!
//! let mut declared = BTreeMap::new();
//! declared.insert("Contanti".to_string(), amount);
//! let report = reconcile(&totals.by_account, &declared, &"0.01".parse::<BigDecimal>().unwrap());
//! assert!(report.ok);
//! ```

pub mod amount;
pub mod config;
pub mod export;
pub mod ledger;
pub mod reconciliation;
pub mod sheet;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use amount::{
    canonical_amount, format_euro, normalize, normalize_strict, round_cents, Normalized, RawAmount,
};
pub use config::PrimaNotaConfig;
pub use ledger::*;
pub use reconciliation::{reconcile, ReconciliationEngine, ReconciliationReport, ReconciliationRow};
pub use sheet::{RowIssue, RowWarning, Table};
pub use traits::*;
pub use types::*;
