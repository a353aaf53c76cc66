//! Runtime configuration: sheet names, column mapping and reconciliation tolerance

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::amount::{normalize_strict, EURO_MARKER};
use crate::types::{PrimaNotaError, PrimaNotaResult};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaNotaConfig {
    /// Largest absolute delta still considered reconciled (inclusive)
    #[serde(deserialize_with = "deserialize_decimal")]
    pub tolerance: BigDecimal,
    /// Marker appended by `PrimaNota::format_amount`
    pub currency_marker: String,
    /// Selector values meaning "nothing chosen"
    pub placeholders: Vec<String>,
    pub tables: TableNames,
    pub movement_columns: MovementColumns,
    pub balance_columns: BalanceColumns,
}

impl Default for PrimaNotaConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            currency_marker: EURO_MARKER.to_string(),
            placeholders: vec!["".to_string(), "-- seleziona --".to_string()],
            tables: TableNames::default(),
            movement_columns: MovementColumns::default(),
            balance_columns: BalanceColumns::default(),
        }
    }
}

impl PrimaNotaConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> PrimaNotaResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| PrimaNotaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> PrimaNotaResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            PrimaNotaError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> PrimaNotaResult<()> {
        if self.tolerance < BigDecimal::from(0) {
            return Err(PrimaNotaError::Config(format!(
                "tolerance must not be negative, got {}",
                self.tolerance
            )));
        }

        if self.balance_columns.declared.is_empty() {
            return Err(PrimaNotaError::Config(
                "balance_columns.declared needs at least one column name".to_string(),
            ));
        }

        let columns = &self.movement_columns;
        let required = [
            ("date", &columns.date),
            ("amount", &columns.amount),
            ("account", &columns.account),
        ];
        for (key, name) in required {
            if name.trim().is_empty() {
                return Err(PrimaNotaError::Config(format!(
                    "movement_columns.{} cannot be empty",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Whether a selector value counts as "not selected"
    pub fn is_placeholder(&self, value: &str) -> bool {
        let value = value.trim();
        self.placeholders
            .iter()
            .any(|p| p.trim().eq_ignore_ascii_case(value))
    }
}

/// Names of the worksheets backing the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub movements: String,
    pub declared_balances: String,
    pub accounts: String,
    pub reasons: String,
    pub cost_centers: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            movements: "prima_nota".to_string(),
            declared_balances: "saldi estratto conto".to_string(),
            accounts: "rif cassa".to_string(),
            reasons: "rif causale".to_string(),
            cost_centers: "rif centro".to_string(),
        }
    }
}

/// Header names of the movements sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementColumns {
    pub id: String,
    pub date: String,
    pub reason: String,
    pub cost_center: String,
    pub amount: String,
    pub description: String,
    pub account: String,
    pub notes: String,
    pub period: String,
}

impl MovementColumns {
    /// Every mapped header, in the order a new sheet is laid out
    pub fn all(&self) -> [&str; 9] {
        [
            &self.id,
            &self.date,
            &self.reason,
            &self.cost_center,
            &self.amount,
            &self.description,
            &self.account,
            &self.notes,
            &self.period,
        ]
    }
}

impl Default for MovementColumns {
    fn default() -> Self {
        Self {
            id: "Id".to_string(),
            date: "Data".to_string(),
            reason: "Causale".to_string(),
            cost_center: "Centro".to_string(),
            amount: "Importo".to_string(),
            description: "Descrizione".to_string(),
            account: "Cassa".to_string(),
            notes: "Note".to_string(),
            period: "Mese".to_string(),
        }
    }
}

/// Header names of the declared balances sheet
///
/// The declared column has been named differently over time, so every alias
/// in `declared` is accepted on read; the first one is used on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceColumns {
    pub account: String,
    pub declared: Vec<String>,
}

impl Default for BalanceColumns {
    fn default() -> Self {
        Self {
            account: "Cassa".to_string(),
            declared: vec!["Saldo dichiarato".to_string(), "Estratto conto".to_string()],
        }
    }
}

/// Default reconciliation tolerance: one cent
pub fn default_tolerance() -> BigDecimal {
    BigDecimal::new(1.into(), 2)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match DecimalValue::deserialize(deserializer)? {
        DecimalValue::Integer(v) => normalize_strict(v),
        DecimalValue::Float(v) => normalize_strict(v),
        DecimalValue::Text(v) => normalize_strict(v),
    };
    value.map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults() {
        let config = PrimaNotaConfig::default();
        assert_eq!(config.tolerance, BigDecimal::from_str("0.01").unwrap());
        assert_eq!(default_tolerance(), BigDecimal::from_str("0.01").unwrap());
        assert_eq!(config.movement_columns.all()[0], "Id");
        assert_eq!(config.tables.movements, "prima_nota");
        assert_eq!(config.movement_columns.amount, "Importo");
        assert!(config.is_placeholder("  "));
        assert!(config.is_placeholder("-- Seleziona --"));
        assert!(!config.is_placeholder("Contanti"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PrimaNotaConfig::from_toml_str(
            r#"
            tolerance = 0.05
            currency_marker = "EUR"

            [balance_columns]
            declared = ["Estratto conto"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tolerance, BigDecimal::from_str("0.05").unwrap());
        assert_eq!(config.currency_marker, "EUR");
        assert_eq!(config.balance_columns.account, "Cassa");
        assert_eq!(config.balance_columns.declared, vec!["Estratto conto"]);
        assert_eq!(config.movement_columns.date, "Data");
    }

    #[test]
    fn test_tolerance_as_italian_text() {
        let config = PrimaNotaConfig::from_toml_str(r#"tolerance = "0,10""#).unwrap();
        assert_eq!(config.tolerance, BigDecimal::from_str("0.1").unwrap());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            PrimaNotaConfig::from_toml_str("tolerance = -1"),
            Err(PrimaNotaError::Config(_))
        ));
        assert!(matches!(
            PrimaNotaConfig::from_toml_str("tolerance = \"molto\""),
            Err(PrimaNotaError::Config(_))
        ));
        assert!(matches!(
            PrimaNotaConfig::from_toml_str("[balance_columns]\ndeclared = []"),
            Err(PrimaNotaError::Config(_))
        ));
    }
}
