//! Catalog facade.
//!
//! The facade is the only way the engine talks to a catalog. It pins the
//! table list for the whole run, bounds every call with the caller's
//! timeout, and retries connectivity failures with exponential backoff.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::provider::CatalogSource;
use super::snapshot::SnapshotCatalog;
use super::types::{Column, ForeignKeyEdge, Table};
use crate::error::{GenerateError, GenerateResult};

/// Default timeout for catalog calls (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Call policy for the facade.
#[derive(Debug, Clone)]
pub struct FacadeOptions {
    /// Upper bound for a single catalog call.
    pub timeout: Duration,
    /// Retries after the first attempt for `CatalogUnavailable` failures.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_backoff: Duration,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

impl FacadeOptions {
    /// Builder: set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: set the retry budget.
    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }
}

/// Bounded, retrying view over a [`CatalogSource`] with a pinned table list.
pub struct CatalogFacade {
    source: Arc<dyn CatalogSource>,
    options: FacadeOptions,
    tables: Vec<String>,
    known: HashSet<String>,
}

impl CatalogFacade {
    /// Open the facade, listing the tables once.
    pub async fn open(
        source: Arc<dyn CatalogSource>,
        options: FacadeOptions,
    ) -> GenerateResult<Self> {
        let mut facade = Self {
            source,
            options,
            tables: Vec::new(),
            known: HashSet::new(),
        };
        let source = facade.source.clone();
        let tables = facade
            .call("list_tables".to_string(), || source.list_tables())
            .await?;
        facade.known = tables.iter().cloned().collect();
        facade.tables = tables;
        tracing::debug!(tables = facade.tables.len(), "catalog opened");
        Ok(facade)
    }

    /// Run one catalog call under the timeout and retry policy.
    async fn call<T, F, Fut>(&self, operation: String, mut attempt: F) -> GenerateResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = GenerateResult<T>>,
    {
        let mut backoff = self.options.initial_backoff;
        let mut retries = 0;
        loop {
            let result = match tokio::time::timeout(self.options.timeout, attempt()).await {
                Ok(result) => result,
                Err(_) => Err(GenerateError::unavailable(
                    operation.clone(),
                    format!("timed out after {:?}", self.options.timeout),
                )),
            };

            match result {
                Err(err) if err.is_retriable() && retries < self.options.max_retries => {
                    retries += 1;
                    tracing::warn!(
                        operation = %operation,
                        attempt = retries,
                        error = %err,
                        "catalog call failed, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                other => return other,
            }
        }
    }

    /// Call options in effect.
    pub fn options(&self) -> &FacadeOptions {
        &self.options
    }

    /// Table names, in the order listed when the facade was opened.
    pub fn list_tables(&self) -> &[String] {
        &self.tables
    }

    /// True if `table` was in the listed table set.
    pub fn contains_table(&self, table: &str) -> bool {
        self.known.contains(table)
    }

    pub async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>> {
        self.call(format!("columns_of({})", table), || {
            self.source.columns_of(table)
        })
        .await
    }

    pub async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        self.call(format!("foreign_keys_of({})", table), || {
            self.source.foreign_keys_of(table)
        })
        .await
    }

    pub async fn is_join_table(&self, table: &str) -> GenerateResult<bool> {
        self.call(format!("is_join_table({})", table), || {
            self.source.is_join_table(table)
        })
        .await
    }

    pub async fn is_column_unique(&self, table: &str, column: &str) -> GenerateResult<bool> {
        self.call(format!("is_column_unique({}.{})", table, column), || {
            self.source.is_column_unique(table, column)
        })
        .await
    }

    pub async fn has_foreign_key_to(&self, table: &str, target_table: &str) -> GenerateResult<bool> {
        self.call(
            format!("has_foreign_key_to({} -> {})", table, target_table),
            || self.source.has_foreign_key_to(table, target_table),
        )
        .await
    }

    pub async fn secondary_foreign_key_column(&self, table: &str) -> GenerateResult<Option<String>> {
        self.call(format!("secondary_foreign_key_column({})", table), || {
            self.source.secondary_foreign_key_column(table)
        })
        .await
    }

    /// Fetch one table's columns and foreign keys.
    pub async fn table(&self, name: &str) -> GenerateResult<Table> {
        let columns = self.columns_of(name).await?;
        let foreign_keys = self.foreign_keys_of(name).await?;
        Ok(Table {
            name: name.to_string(),
            columns,
            foreign_keys,
        })
    }

    /// Fetch every table concurrently into an in-memory snapshot.
    ///
    /// Tables keep the listed order regardless of completion order. Any
    /// failure fails the whole prefetch.
    pub async fn prefetch(&self) -> GenerateResult<SnapshotCatalog> {
        let fetches: Vec<_> = self.tables.iter().map(|name| self.table(name)).collect();
        let tables = join_all(fetches)
            .await
            .into_iter()
            .collect::<GenerateResult<Vec<_>>>()?;
        tracing::debug!(tables = tables.len(), "catalog prefetched");
        Ok(SnapshotCatalog::from_tables(tables))
    }
}
