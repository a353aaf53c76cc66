//! Aggregation of movements into totals and grouped subtotals

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::*;

/// Income, expense and net of a group of movements
///
/// `expense` is reported as a positive magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub income: BigDecimal,
    pub expense: BigDecimal,
    pub net: BigDecimal,
}

impl Default for Totals {
    fn default() -> Self {
        Self {
            income: BigDecimal::from(0),
            expense: BigDecimal::from(0),
            net: BigDecimal::from(0),
        }
    }
}

impl Totals {
    fn add(&mut self, amount: &BigDecimal) {
        if *amount > BigDecimal::from(0) {
            self.income += amount;
        } else {
            self.expense -= amount;
        }
        self.net += amount;
    }
}

/// Output of [`Aggregator::aggregate`]
///
/// Sums keep full precision; round only when displaying.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub totals: Totals,
    /// Signed sum per account, the computed balance used by reconciliation
    pub by_account: BTreeMap<String, BigDecimal>,
    /// Income/expense series per month
    pub by_period: BTreeMap<Period, Totals>,
    /// Rendiconto breakdown per reason code
    pub by_reason: BTreeMap<String, Totals>,
    /// Rendiconto breakdown per cost center
    pub by_cost_center: BTreeMap<String, Totals>,
    pub movement_count: usize,
}

impl AggregationResult {
    pub fn total_income(&self) -> &BigDecimal {
        &self.totals.income
    }

    pub fn total_expense(&self) -> &BigDecimal {
        &self.totals.expense
    }

    pub fn net_balance(&self) -> &BigDecimal {
        &self.totals.net
    }

    pub fn is_empty(&self) -> bool {
        self.movement_count == 0
    }
}

/// Computes totals and grouped subtotals over movements
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    exclude_zero_amounts: bool,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip movements whose amount is zero (typically amounts that failed to
    /// parse). Off by default so missing data surfaces in reconciliation.
    pub fn exclude_zero_amounts(mut self, exclude: bool) -> Self {
        self.exclude_zero_amounts = exclude;
        self
    }

    pub fn aggregate<'a, I>(&self, movements: I) -> AggregationResult
    where
        I: IntoIterator<Item = &'a Movement>,
    {
        let zero = BigDecimal::from(0);
        let mut result = AggregationResult::default();

        for movement in movements {
            if self.exclude_zero_amounts && movement.amount == zero {
                continue;
            }

            let amount = &movement.amount;
            result.totals.add(amount);
            *result
                .by_account
                .entry(movement.account.clone())
                .or_insert_with(|| BigDecimal::from(0)) += amount;
            result
                .by_period
                .entry(movement.period())
                .or_default()
                .add(amount);
            result
                .by_reason
                .entry(movement.reason.clone())
                .or_default()
                .add(amount);
            result
                .by_cost_center
                .entry(movement.cost_center.clone())
                .or_default()
                .add(amount);
            result.movement_count += 1;
        }

        result
    }
}

/// Aggregate with the default (inclusive) settings
pub fn aggregate<'a, I>(movements: I) -> AggregationResult
where
    I: IntoIterator<Item = &'a Movement>,
{
    Aggregator::new().aggregate(movements)
}

/// Selection of movements for listing, aggregation and export
///
/// Every criterion left unset matches everything; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account: Option<String>,
    pub reason: Option<String>,
    pub cost_center: Option<String>,
    pub period: Option<Period>,
}

impl MovementFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = Some(cost_center.into());
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn matches(&self, movement: &Movement) -> bool {
        if let Some(from) = self.from {
            if movement.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if movement.date > to {
                return false;
            }
        }
        if let Some(period) = self.period {
            if movement.period() != period {
                return false;
            }
        }

        let same = |wanted: &Option<String>, actual: &str| {
            wanted.as_deref().is_none_or(|w| w == actual)
        };
        same(&self.account, &movement.account)
            && same(&self.reason, &movement.reason)
            && same(&self.cost_center, &movement.cost_center)
    }

    /// Keep the matching movements, preserving order
    pub fn apply<'a>(&self, movements: &'a [Movement]) -> Vec<&'a Movement> {
        movements.iter().filter(|m| self.matches(m)).collect()
    }
}
