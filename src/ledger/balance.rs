//! Declared balance management

use bigdecimal::BigDecimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::amount::round_cents;
use crate::config::PrimaNotaConfig;
use crate::sheet::{decode_declared_balances, encode_declared_balances, BalanceImport};
use crate::traits::*;
use crate::types::*;

/// Manager for the declared balances sheet
pub struct BalanceManager<S: PrimaNotaStorage> {
    pub(crate) storage: S,
    config: PrimaNotaConfig,
}

impl<S: PrimaNotaStorage> BalanceManager<S> {
    pub fn new(storage: S, config: PrimaNotaConfig) -> Self {
        Self { storage, config }
    }

    /// Load the declared balances currently stored
    pub async fn load(&self) -> PrimaNotaResult<BalanceImport> {
        let name = &self.config.tables.declared_balances;
        let table = self.storage.read_table(name).await?;
        decode_declared_balances(&table, name, &self.config.balance_columns)
    }

    /// Replace the whole declared balance set
    ///
    /// Blank accounts are dropped, duplicates are rejected and amounts are
    /// rounded to cents before writing.
    pub async fn replace(
        &mut self,
        balances: Vec<DeclaredBalance>,
    ) -> PrimaNotaResult<Vec<DeclaredBalance>> {
        let mut seen = BTreeSet::new();
        let mut cleaned = Vec::with_capacity(balances.len());

        for balance in balances {
            let account = balance.account.trim().to_string();
            if account.is_empty() {
                continue;
            }
            if !seen.insert(account.clone()) {
                return Err(PrimaNotaError::Validation(format!(
                    "Account '{}' is declared more than once",
                    account
                )));
            }
            cleaned.push(DeclaredBalance::new(
                account,
                round_cents(&balance.declared_amount),
            ));
        }

        let table = encode_declared_balances(&cleaned, &self.config.balance_columns);
        self.storage
            .write_table(&self.config.tables.declared_balances, &table)
            .await?;

        tracing::info!(accounts = cleaned.len(), "declared balances replaced");
        Ok(cleaned)
    }
}

/// Starting declared balances: one zero entry per account with movements
pub fn seed_declared_balances(computed: &BTreeMap<String, BigDecimal>) -> Vec<DeclaredBalance> {
    computed
        .keys()
        .map(|account| DeclaredBalance::new(account.clone(), BigDecimal::from(0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_replace_is_wholesale() {
        let storage = MemoryStorage::new();
        let mut manager = BalanceManager::new(storage, PrimaNotaConfig::default());

        manager
            .replace(vec![
                DeclaredBalance::new("Contanti", BigDecimal::from(60)),
                DeclaredBalance::new("Banco Posta", BigDecimal::from(10)),
            ])
            .await
            .unwrap();
        manager
            .replace(vec![
                DeclaredBalance::new("Contanti", BigDecimal::from_str("61.005").unwrap()),
                DeclaredBalance::new("  ", BigDecimal::from(1)),
            ])
            .await
            .unwrap();

        let stored = manager.load().await.unwrap().balances;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].account, "Contanti");
        assert_eq!(
            stored[0].declared_amount,
            BigDecimal::from_str("61.01").unwrap()
        );
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let mut manager = BalanceManager::new(MemoryStorage::new(), PrimaNotaConfig::default());
        let result = manager
            .replace(vec![
                DeclaredBalance::new("Contanti", BigDecimal::from(1)),
                DeclaredBalance::new("Contanti ", BigDecimal::from(2)),
            ])
            .await;
        assert!(matches!(result, Err(PrimaNotaError::Validation(_))));
    }

    #[test]
    fn test_seed() {
        let mut computed = BTreeMap::new();
        computed.insert("Contanti".to_string(), BigDecimal::from(60));
        computed.insert("Banco Posta".to_string(), BigDecimal::from(-5));

        let seeded = seed_declared_balances(&computed);
        assert_eq!(seeded.len(), 2);
        assert_eq!(seeded[0].account, "Banco Posta");
        assert!(seeded.iter().all(|b| b.declared_amount == BigDecimal::from(0)));
    }
}
