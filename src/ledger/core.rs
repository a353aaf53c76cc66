//! Main prima nota orchestrator that coordinates movements and declared balances

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amount;
use crate::config::PrimaNotaConfig;
use crate::export::{movements_to_csv, reconciliation_to_csv};
use crate::ledger::{
    seed_declared_balances, AggregationResult, Aggregator, BalanceManager, MovementDraft,
    MovementFilter, MovementManager,
};
use crate::reconciliation::{ReconciliationEngine, ReconciliationReport};
use crate::sheet::{reference_options, RowWarning};
use crate::traits::*;
use crate::types::*;

/// Reference sheets feeding the selectors of the movement form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceList {
    /// Cash and bank accounts ("rif cassa")
    Accounts,
    /// Reason codes ("rif causale")
    Reasons,
    /// Cost centers ("rif centro")
    CostCenters,
}

/// Movements selected for display with the warnings found while loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementListing {
    pub movements: Vec<Movement>,
    pub warnings: Vec<RowWarning>,
}

/// Balances page: reconciliation plus the declared balances it used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOverview {
    pub report: ReconciliationReport,
    pub declared: Vec<DeclaredBalance>,
    /// True when no balances were stored and `declared` is the zero seed
    pub seeded: bool,
    pub warnings: Vec<RowWarning>,
}

/// Main prima nota system that orchestrates all ledger operations
///
/// Every call reloads the sheets it needs; nothing is cached between calls.
pub struct PrimaNota<S: PrimaNotaStorage> {
    movement_manager: MovementManager<S>,
    balance_manager: BalanceManager<S>,
    engine: ReconciliationEngine,
    config: PrimaNotaConfig,
}

impl<S: PrimaNotaStorage + Clone> PrimaNota<S> {
    /// Create a new prima nota with the given storage backend
    pub fn new(storage: S, config: PrimaNotaConfig) -> Self {
        Self {
            movement_manager: MovementManager::new(storage.clone(), config.clone()),
            balance_manager: BalanceManager::new(storage, config.clone()),
            engine: ReconciliationEngine::with_tolerance(config.tolerance.clone()),
            config,
        }
    }

    /// Create a new prima nota with a custom movement validator
    pub fn with_validator(
        storage: S,
        config: PrimaNotaConfig,
        validator: Box<dyn MovementValidator>,
    ) -> Self {
        Self {
            movement_manager: MovementManager::with_validator(
                storage.clone(),
                config.clone(),
                validator,
            ),
            balance_manager: BalanceManager::new(storage, config.clone()),
            engine: ReconciliationEngine::with_tolerance(config.tolerance.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PrimaNotaConfig {
        &self.config
    }

    /// Render an amount Italian style with the configured currency marker
    pub fn format_amount(&self, value: &BigDecimal) -> String {
        amount::format_amount(value, &self.config.currency_marker)
    }

    // Movement operations
    /// Load all movements with the row warnings of the sheet
    pub async fn load_movements(&self) -> PrimaNotaResult<MovementListing> {
        let import = self.movement_manager.load().await?;
        if import.assigned_ids > 0 {
            tracing::debug!(
                count = import.assigned_ids,
                "movements without id, derived ids are stored on the next edit"
            );
        }
        Ok(MovementListing {
            movements: import.movements,
            warnings: import.warnings,
        })
    }

    /// Movements matching a filter, in sheet order
    pub async fn list_movements(&self, filter: &MovementFilter) -> PrimaNotaResult<MovementListing> {
        let mut listing = self.load_movements().await?;
        listing.movements.retain(|m| filter.matches(m));
        Ok(listing)
    }

    /// Get a movement by id
    pub async fn get_movement(&self, id: MovementId) -> PrimaNotaResult<Option<Movement>> {
        self.movement_manager.get(id).await
    }

    /// Record a new movement from the form values
    pub async fn add_movement(&mut self, draft: MovementDraft) -> PrimaNotaResult<Movement> {
        self.movement_manager.add(draft).await
    }

    /// Edit the movement with the given id
    pub async fn update_movement(
        &mut self,
        id: MovementId,
        draft: MovementDraft,
    ) -> PrimaNotaResult<Movement> {
        self.movement_manager.update(id, draft).await
    }

    /// Delete the movement with the given id
    pub async fn delete_movement(&mut self, id: MovementId) -> PrimaNotaResult<Movement> {
        self.movement_manager.delete(id).await
    }

    /// Selector options for the movement form
    pub async fn reference_options(&self, list: ReferenceList) -> PrimaNotaResult<Vec<String>> {
        let tables = &self.config.tables;
        let name = match list {
            ReferenceList::Accounts => &tables.accounts,
            ReferenceList::Reasons => &tables.reasons,
            ReferenceList::CostCenters => &tables.cost_centers,
        };
        let table = self.movement_manager.storage.read_table(name).await?;
        Ok(reference_options(&table, name))
    }

    // Aggregation operations
    /// Totals and subtotals of the movements matching a filter
    pub async fn aggregate(&self, filter: &MovementFilter) -> PrimaNotaResult<AggregationResult> {
        let listing = self.list_movements(filter).await?;
        Ok(Aggregator::new().aggregate(&listing.movements))
    }

    /// Computed balance per account over the whole ledger
    pub async fn account_balances(&self) -> PrimaNotaResult<BTreeMap<String, BigDecimal>> {
        Ok(self.aggregate(&MovementFilter::all()).await?.by_account)
    }

    // Declared balance operations
    /// Declared balances as stored
    pub async fn declared_balances(&self) -> PrimaNotaResult<Vec<DeclaredBalance>> {
        Ok(self.balance_manager.load().await?.balances)
    }

    /// Declared balances, or a zero entry per ledger account when none are stored
    pub async fn declared_balances_or_seed(&self) -> PrimaNotaResult<Vec<DeclaredBalance>> {
        let declared = self.declared_balances().await?;
        if !declared.is_empty() {
            return Ok(declared);
        }
        Ok(seed_declared_balances(&self.account_balances().await?))
    }

    /// Replace the declared balance set as a whole
    pub async fn save_declared_balances(
        &mut self,
        balances: Vec<DeclaredBalance>,
    ) -> PrimaNotaResult<Vec<DeclaredBalance>> {
        self.balance_manager.replace(balances).await
    }

    // Reconciliation operations
    /// Compare ledger balances with the declared balances
    pub async fn reconcile(&self) -> PrimaNotaResult<ReconciliationReport> {
        Ok(self.balance_overview().await?.report)
    }

    /// Everything the balances page shows
    pub async fn balance_overview(&self) -> PrimaNotaResult<BalanceOverview> {
        let listing = self.load_movements().await?;
        let aggregation = Aggregator::new().aggregate(&listing.movements);

        let import = self.balance_manager.load().await?;
        let seeded = import.balances.is_empty();
        let declared = if seeded {
            seed_declared_balances(&aggregation.by_account)
        } else {
            import.balances
        };

        let report = self.engine.reconcile_balances(&aggregation, &declared);

        let mut warnings = listing.warnings;
        warnings.extend(import.warnings);

        Ok(BalanceOverview {
            report,
            declared,
            seeded,
            warnings,
        })
    }

    // Export operations
    /// CSV export of the movements matching a filter
    pub async fn export_csv(&self, filter: &MovementFilter) -> PrimaNotaResult<Vec<u8>> {
        let listing = self.list_movements(filter).await?;
        movements_to_csv(&listing.movements, &self.config.movement_columns)
    }

    /// CSV export of the current reconciliation
    pub async fn export_reconciliation_csv(&self) -> PrimaNotaResult<Vec<u8>> {
        reconciliation_to_csv(&self.reconcile().await?)
    }
}
