//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::sheet::Table;
use crate::traits::*;
use crate::types::*;

/// In-memory worksheets for testing and development
///
/// Clones share the same worksheets, like several handles on one spreadsheet.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a worksheet (useful for testing)
    pub fn insert_table(&self, name: &str, table: Table) -> PrimaNotaResult<()> {
        self.tables
            .write()
            .map_err(|_| poisoned())?
            .insert(name.to_string(), table);
        Ok(())
    }

    /// Names of the worksheets present, sorted
    pub fn table_names(&self) -> PrimaNotaResult<Vec<String>> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .map_err(|_| poisoned())?
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> PrimaNotaResult<()> {
        self.tables.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

fn poisoned() -> PrimaNotaError {
    PrimaNotaError::Storage("worksheet lock poisoned".to_string())
}

#[async_trait]
impl PrimaNotaStorage for MemoryStorage {
    async fn read_table(&self, name: &str) -> PrimaNotaResult<Table> {
        Ok(self
            .tables
            .read()
            .map_err(|_| poisoned())?
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    async fn write_table(&mut self, name: &str, table: &Table) -> PrimaNotaResult<()> {
        self.insert_table(name, table.clone())
    }
}
