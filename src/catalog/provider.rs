//! CatalogSource trait definition.
//!
//! The CatalogSource trait abstracts over the different ways of reading a
//! database catalog. Implementations only need the three fetch operations;
//! the point predicates have default implementations computed from them,
//! which sources backed by a live server may override with direct queries.

use async_trait::async_trait;

use super::types::{Column, ForeignKeyEdge, KeyClass};
use crate::error::{GenerateError, GenerateResult};

/// Read-only access to a database catalog scoped to one schema.
///
/// # Example
///
/// ```ignore
/// use modelsmith::catalog::{CatalogSource, SqliteCatalog};
///
/// let source = SqliteCatalog::open("./shop.db")?;
/// for table in source.list_tables().await? {
///     let columns = source.columns_of(&table).await?;
///     let edges = source.foreign_keys_of(&table).await?;
/// }
/// ```
#[async_trait]
pub trait CatalogSource: Send + Sync {
    // =========================================================================
    // Fetch operations
    // =========================================================================

    /// List all table names. Must return the same order on every call.
    async fn list_tables(&self) -> GenerateResult<Vec<String>>;

    /// Columns of `table` in ordinal order.
    async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>>;

    /// Foreign keys whose source is `table`.
    async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>>;

    // =========================================================================
    // Point predicates (default implementations over the fetch operations)
    // =========================================================================

    /// True iff the table has exactly two foreign-key-bearing columns and at
    /// most two primary key columns.
    ///
    /// This is a structural heuristic: a table with two indexed references
    /// and its own payload columns also qualifies.
    async fn is_join_table(&self, table: &str) -> GenerateResult<bool> {
        let columns = self.columns_of(table).await?;
        Ok(join_table_shape(&columns))
    }

    /// True iff the column is classified unique or primary.
    async fn is_column_unique(&self, table: &str, column: &str) -> GenerateResult<bool> {
        let columns = self.columns_of(table).await?;
        columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.key.is_unique())
            .ok_or_else(|| GenerateError::column_not_found(table, column))
    }

    /// True iff `table` has at least one foreign key targeting `target_table`.
    async fn has_foreign_key_to(&self, table: &str, target_table: &str) -> GenerateResult<bool> {
        let edges = self.foreign_keys_of(table).await?;
        Ok(edges.iter().any(|e| e.target_table == target_table))
    }

    /// The second foreign key column of `table`, if it has at least two.
    async fn secondary_foreign_key_column(&self, table: &str) -> GenerateResult<Option<String>> {
        let edges = self.foreign_keys_of(table).await?;
        Ok(edges.into_iter().nth(1).map(|e| e.source_column))
    }
}

/// Join-table shape test shared by sources that evaluate it locally.
pub(crate) fn join_table_shape(columns: &[Column]) -> bool {
    let multiple = columns
        .iter()
        .filter(|c| c.key == KeyClass::Multiple)
        .count();
    let primary = columns.iter().filter(|c| c.key == KeyClass::Primary).count();
    multiple == 2 && primary <= 2
}
