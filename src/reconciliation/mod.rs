//! Reconciliation of computed account balances against declared balances
//!
//! The "prova del 9": every account that appears either in the ledger or in
//! the declared balances gets one row with the computed balance, the declared
//! balance and their difference. The ledger is reconciled only when every
//! difference is within the tolerance.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::default_tolerance;
use crate::ledger::AggregationResult;
use crate::types::*;

/// One account of the reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRow {
    pub account: String,
    /// Sum of the movements booked on the account
    pub computed_balance: BigDecimal,
    /// Declared balance, zero when none was declared
    pub declared_balance: BigDecimal,
    /// `computed_balance - declared_balance`
    pub delta: BigDecimal,
    pub within_tolerance: bool,
}

/// Outcome of a reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// One row per account, sorted by account name
    pub rows: Vec<ReconciliationRow>,
    /// True when every row is within tolerance
    pub ok: bool,
    pub tolerance: BigDecimal,
}

impl ReconciliationReport {
    /// Rows outside the tolerance; empty when reconciled
    pub fn mismatches(&self) -> impl Iterator<Item = &ReconciliationRow> {
        self.rows.iter().filter(|r| !r.within_tolerance)
    }

    pub fn row(&self, account: &str) -> Option<&ReconciliationRow> {
        self.rows.iter().find(|r| r.account == account)
    }

    pub fn total_computed(&self) -> BigDecimal {
        self.rows.iter().map(|r| &r.computed_balance).sum()
    }

    pub fn total_declared(&self) -> BigDecimal {
        self.rows.iter().map(|r| &r.declared_balance).sum()
    }

    pub fn total_delta(&self) -> BigDecimal {
        self.rows.iter().map(|r| &r.delta).sum()
    }

    pub fn into_parts(self) -> (Vec<ReconciliationRow>, bool) {
        (self.rows, self.ok)
    }
}

/// Compare computed and declared balances per account
///
/// Full outer join on the account name; a side missing an account counts as
/// zero. `ok` holds iff `|delta| <= tolerance` for every row.
pub fn reconcile(
    computed: &BTreeMap<String, BigDecimal>,
    declared: &BTreeMap<String, BigDecimal>,
    tolerance: &BigDecimal,
) -> ReconciliationReport {
    let zero = BigDecimal::from(0);
    let accounts: BTreeSet<&String> = computed.keys().chain(declared.keys()).collect();

    let rows: Vec<ReconciliationRow> = accounts
        .into_iter()
        .map(|account| {
            let computed_balance = computed.get(account).unwrap_or(&zero).clone();
            let declared_balance = declared.get(account).unwrap_or(&zero).clone();
            let delta = &computed_balance - &declared_balance;
            let within_tolerance = delta.abs() <= *tolerance;
            ReconciliationRow {
                account: account.clone(),
                computed_balance,
                declared_balance,
                delta,
                within_tolerance,
            }
        })
        .collect();

    let ok = rows.iter().all(|r| r.within_tolerance);

    ReconciliationReport {
        rows,
        ok,
        tolerance: tolerance.clone(),
    }
}

/// Reconciliation engine holding the tolerance
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    tolerance: BigDecimal,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    /// Engine with the one-cent default tolerance
    pub fn new() -> Self {
        Self {
            tolerance: default_tolerance(),
        }
    }

    pub fn with_tolerance(tolerance: BigDecimal) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> &BigDecimal {
        &self.tolerance
    }

    pub fn reconcile(
        &self,
        computed: &BTreeMap<String, BigDecimal>,
        declared: &BTreeMap<String, BigDecimal>,
    ) -> ReconciliationReport {
        let report = reconcile(computed, declared, &self.tolerance);
        if report.ok {
            tracing::info!(accounts = report.rows.len(), "ledger reconciled");
        } else {
            let mismatched: Vec<&str> = report.mismatches().map(|r| r.account.as_str()).collect();
            tracing::info!(
                accounts = report.rows.len(),
                mismatched = ?mismatched,
                "ledger does not reconcile"
            );
        }
        report
    }

    /// Reconcile an aggregation against a declared balance list
    ///
    /// When an account is declared twice the later entry wins.
    pub fn reconcile_balances(
        &self,
        aggregation: &AggregationResult,
        declared: &[DeclaredBalance],
    ) -> ReconciliationReport {
        let declared: BTreeMap<String, BigDecimal> = declared
            .iter()
            .map(|b| (b.account.clone(), b.declared_amount.clone()))
            .collect();
        self.reconcile(&aggregation.by_account, &declared)
    }
}
