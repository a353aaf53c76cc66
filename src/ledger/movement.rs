//! Movement entry and management

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amount::{canonical_amount, normalize_strict, round_cents};
use crate::config::PrimaNotaConfig;
use crate::sheet::{
    append_movement, decode_movements, remove_movement, replace_movement, MovementImport, Table,
};
use crate::traits::*;
use crate::types::*;

/// Values of the new-movement form, amount still as typed by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub date: NaiveDate,
    pub reason: String,
    pub cost_center: String,
    pub amount: String,
    pub description: String,
    pub account: String,
    pub notes: String,
}

impl MovementDraft {
    /// Check the draft and turn it into a movement with the given id
    ///
    /// Selector fields (reason, cost center, account) must hold a real
    /// choice, not a placeholder, and the amount must parse; it is rounded
    /// to cents before being stored.
    pub fn into_movement(
        self,
        id: MovementId,
        config: &PrimaNotaConfig,
    ) -> PrimaNotaResult<Movement> {
        let selectors = [
            ("reason", &self.reason),
            ("cost center", &self.cost_center),
            ("account", &self.account),
        ];
        for (field, value) in selectors {
            if config.is_placeholder(value) {
                return Err(PrimaNotaError::Validation(format!(
                    "Select a {} before saving",
                    field
                )));
            }
        }

        let amount = round_cents(&normalize_strict(self.amount.as_str())?);

        Ok(Movement {
            id,
            date: self.date,
            reason: self.reason.trim().to_string(),
            cost_center: self.cost_center.trim().to_string(),
            amount,
            description: self.description.trim().to_string(),
            account: self.account.trim().to_string(),
            notes: self.notes.trim().to_string(),
        })
    }
}

impl From<&Movement> for MovementDraft {
    fn from(movement: &Movement) -> Self {
        Self {
            date: movement.date,
            reason: movement.reason.clone(),
            cost_center: movement.cost_center.clone(),
            amount: canonical_amount(&movement.amount),
            description: movement.description.clone(),
            account: movement.account.clone(),
            notes: movement.notes.clone(),
        }
    }
}

/// Builder for movement drafts
#[derive(Debug)]
pub struct MovementBuilder {
    draft: MovementDraft,
}

impl MovementBuilder {
    /// Start a draft with the fields every movement needs
    pub fn new(date: NaiveDate, reason: &str, account: &str, amount: &str) -> Self {
        Self {
            draft: MovementDraft {
                date,
                reason: reason.to_string(),
                cost_center: String::new(),
                amount: amount.to_string(),
                description: String::new(),
                account: account.to_string(),
                notes: String::new(),
            },
        }
    }

    pub fn cost_center(mut self, cost_center: &str) -> Self {
        self.draft.cost_center = cost_center.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.draft.description = description.to_string();
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.draft.notes = notes.to_string();
        self
    }

    pub fn build(self) -> MovementDraft {
        self.draft
    }
}

/// Movement manager for reading and editing the movements sheet
///
/// Every edit reads the sheet, patches the affected row and writes the whole
/// sheet back. Rows that do not decode keep their original cells.
pub struct MovementManager<S: PrimaNotaStorage> {
    pub(crate) storage: S,
    config: PrimaNotaConfig,
    validator: Box<dyn MovementValidator>,
}

impl<S: PrimaNotaStorage> MovementManager<S> {
    /// Create a new movement manager
    pub fn new(storage: S, config: PrimaNotaConfig) -> Self {
        Self {
            storage,
            config,
            validator: Box::new(DefaultMovementValidator),
        }
    }

    /// Create a new movement manager with custom validator
    pub fn with_validator(
        storage: S,
        config: PrimaNotaConfig,
        validator: Box<dyn MovementValidator>,
    ) -> Self {
        Self {
            storage,
            config,
            validator,
        }
    }

    /// Read the raw sheet together with its decoded movements
    async fn read_sheet(&self) -> PrimaNotaResult<(Table, MovementImport)> {
        let name = &self.config.tables.movements;
        let table = self.storage.read_table(name).await?;
        let import = decode_movements(&table, name, &self.config.movement_columns)?;
        Ok((table, import))
    }

    /// Load and decode every movement
    pub async fn load(&self) -> PrimaNotaResult<MovementImport> {
        Ok(self.read_sheet().await?.1)
    }

    /// Get a movement by id
    pub async fn get(&self, id: MovementId) -> PrimaNotaResult<Option<Movement>> {
        let import = self.load().await?;
        Ok(import.movements.into_iter().find(|m| m.id == id))
    }

    /// Validate a draft and append it to the sheet
    pub async fn add(&mut self, draft: MovementDraft) -> PrimaNotaResult<Movement> {
        let movement = draft.into_movement(MovementId::new(), &self.config)?;
        self.validator.validate_movement(&movement)?;

        let (mut table, _) = self.read_sheet().await?;
        append_movement(&mut table, &movement, &self.config.movement_columns);
        self.save(&table).await?;

        tracing::info!(id = %movement.id, account = %movement.account, amount = %movement.amount, "movement added");
        Ok(movement)
    }

    /// Replace the movement with the given id, keeping the id
    pub async fn update(
        &mut self,
        id: MovementId,
        draft: MovementDraft,
    ) -> PrimaNotaResult<Movement> {
        let movement = draft.into_movement(id, &self.config)?;
        self.validator.validate_movement(&movement)?;

        let (mut table, import) = self.read_sheet().await?;
        if !import.movements.iter().any(|m| m.id == id)
            || !replace_movement(&mut table, &movement, &self.config.movement_columns)
        {
            return Err(PrimaNotaError::MovementNotFound(id));
        }
        self.save(&table).await?;

        tracing::info!(id = %id, "movement updated");
        Ok(movement)
    }

    /// Remove the movement with the given id
    pub async fn delete(&mut self, id: MovementId) -> PrimaNotaResult<Movement> {
        let (mut table, import) = self.read_sheet().await?;
        let removed = import
            .movements
            .into_iter()
            .find(|m| m.id == id)
            .ok_or(PrimaNotaError::MovementNotFound(id))?;
        if !remove_movement(&mut table, id, &self.config.movement_columns) {
            return Err(PrimaNotaError::MovementNotFound(id));
        }
        self.save(&table).await?;

        tracing::info!(id = %id, "movement deleted");
        Ok(removed)
    }

    /// Clear the sheet and write the edited table back, header included
    async fn save(&mut self, table: &Table) -> PrimaNotaResult<()> {
        self.storage
            .write_table(&self.config.tables.movements, table)
            .await
    }
}
