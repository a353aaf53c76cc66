//! Validation utilities

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;

/// Validate that an amount is not zero
pub fn validate_non_zero_amount(amount: &BigDecimal) -> PrimaNotaResult<()> {
    if *amount == BigDecimal::from(0) {
        Err(PrimaNotaError::Validation(
            "Amount cannot be zero".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a required text field is present and not too long
pub fn validate_required_text(field: &str, value: &str, max_len: usize) -> PrimaNotaResult<()> {
    if value.trim().is_empty() {
        return Err(PrimaNotaError::Validation(format!(
            "{} cannot be empty",
            field
        )));
    }

    validate_text_length(field, value, max_len)
}

/// Validate that a text field does not exceed `max_len` characters
pub fn validate_text_length(field: &str, value: &str, max_len: usize) -> PrimaNotaResult<()> {
    if value.chars().count() > max_len {
        return Err(PrimaNotaError::Validation(format!(
            "{} cannot exceed {} characters",
            field, max_len
        )));
    }

    Ok(())
}

/// Validate that a selector value is one of the reference options
pub fn validate_reference(field: &str, value: &str, options: &[String]) -> PrimaNotaResult<()> {
    if options.iter().any(|o| o == value) {
        Ok(())
    } else {
        Err(PrimaNotaError::Validation(format!(
            "{} '{}' is not in the reference list",
            field, value
        )))
    }
}

/// Enhanced movement validator with detailed checks
pub struct EnhancedMovementValidator;

impl MovementValidator for EnhancedMovementValidator {
    fn validate_movement(&self, movement: &Movement) -> PrimaNotaResult<()> {
        DefaultMovementValidator.validate_movement(movement)?;

        validate_required_text("Reason", &movement.reason, 100)?;
        validate_required_text("Account", &movement.account, 100)?;
        validate_text_length("Cost center", &movement.cost_center, 100)?;
        validate_text_length("Description", &movement.description, 500)?;
        validate_text_length("Notes", &movement.notes, 500)?;
        validate_non_zero_amount(&movement.amount)?;

        Ok(())
    }
}

/// Validator accepting only selector values listed on the reference sheets
///
/// An empty option list disables the check for that field.
pub struct ReferenceMovementValidator {
    pub accounts: Vec<String>,
    pub reasons: Vec<String>,
    pub cost_centers: Vec<String>,
}

impl MovementValidator for ReferenceMovementValidator {
    fn validate_movement(&self, movement: &Movement) -> PrimaNotaResult<()> {
        EnhancedMovementValidator.validate_movement(movement)?;

        let checks = [
            ("Account", &movement.account, &self.accounts),
            ("Reason", &movement.reason, &self.reasons),
            ("Cost center", &movement.cost_center, &self.cost_centers),
        ];
        for (field, value, options) in checks {
            if !options.is_empty() {
                validate_reference(field, value, options)?;
            }
        }

        Ok(())
    }
}
