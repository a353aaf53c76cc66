//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::sheet::Table;
use crate::types::*;

/// Storage abstraction for the worksheets backing the prima nota
///
/// The system of record is a spreadsheet, so storage deals in whole tables:
/// reads return every row and writes clear the worksheet and rewrite it,
/// header row included. There is no concurrency control; when two sessions
/// write the same table the last writer wins.
#[async_trait]
pub trait PrimaNotaStorage: Send + Sync {
    /// Read a whole worksheet; an unknown worksheet reads as a blank table
    async fn read_table(&self, name: &str) -> PrimaNotaResult<Table>;

    /// Replace the whole content of a worksheet
    async fn write_table(&mut self, name: &str, table: &Table) -> PrimaNotaResult<()>;
}

/// Trait for implementing custom movement validation rules
pub trait MovementValidator: Send + Sync {
    /// Validate a movement before it is written
    fn validate_movement(&self, movement: &Movement) -> PrimaNotaResult<()>;
}

/// Default movement validator with basic rules
pub struct DefaultMovementValidator;

impl MovementValidator for DefaultMovementValidator {
    fn validate_movement(&self, movement: &Movement) -> PrimaNotaResult<()> {
        if movement.reason.trim().is_empty() {
            return Err(PrimaNotaError::Validation(
                "Movement reason cannot be empty".to_string(),
            ));
        }

        if movement.account.trim().is_empty() {
            return Err(PrimaNotaError::Validation(
                "Movement account cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
