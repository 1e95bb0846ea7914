//! In-memory catalog snapshot.
//!
//! A `SnapshotCatalog` holds a frozen copy of every table. It backs offline
//! runs (a catalog captured once as JSON and replayed), prefetched runs, and
//! tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::CatalogSource;
use super::types::{Column, ForeignKeyEdge, Table};
use crate::error::{GenerateError, GenerateResult};

/// Immutable catalog held in memory.
///
/// Tables keep their insertion order, which is the order `list_tables`
/// reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotCatalog {
    tables: Vec<Table>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl SnapshotCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from tables.
    ///
    /// A later table with the same name replaces the earlier one in place.
    pub fn from_tables(tables: impl IntoIterator<Item = Table>) -> Self {
        tables.into_iter().fold(Self::new(), Self::table)
    }

    /// Builder: add a table.
    pub fn table(mut self, table: Table) -> Self {
        match self.index.get(&table.name) {
            Some(&pos) => self.tables[pos] = table,
            None => {
                self.index.insert(table.name.clone(), self.tables.len());
                self.tables.push(table);
            }
        }
        self
    }

    /// All tables in catalog order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Look up a table.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.index.get(name).map(|&pos| &self.tables[pos])
    }

    fn require(&self, name: &str) -> GenerateResult<&Table> {
        self.get(name)
            .ok_or_else(|| GenerateError::table_not_found(name))
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let parsed: SnapshotCatalog = serde_json::from_str(json)?;
        Ok(Self::from_tables(parsed.tables))
    }

    /// Serialize the snapshot to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> GenerateResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
            .map_err(|e| GenerateError::unavailable(format!("load({})", path.display()), e))
    }
}

#[async_trait]
impl CatalogSource for SnapshotCatalog {
    async fn list_tables(&self) -> GenerateResult<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>> {
        Ok(self.require(table)?.columns.clone())
    }

    async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        Ok(self.require(table)?.foreign_keys.clone())
    }
}
