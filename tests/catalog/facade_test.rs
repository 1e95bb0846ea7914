use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use modelsmith::catalog::{
    CatalogFacade, CatalogSource, Column, FacadeOptions, ForeignKeyEdge, SnapshotCatalog, Table,
};
use modelsmith::{GenerateError, GenerateResult};

/// Wraps a snapshot and fails the first `failures` calls to `columns_of`.
struct FlakySource {
    inner: SnapshotCatalog,
    failures: u32,
    column_calls: AtomicU32,
    error: fn() -> GenerateError,
}

impl FlakySource {
    fn new(failures: u32, error: fn() -> GenerateError) -> Self {
        Self {
            inner: library(),
            failures,
            column_calls: AtomicU32::new(0),
            error,
        }
    }

    fn calls(&self) -> u32 {
        self.column_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for FlakySource {
    async fn list_tables(&self) -> GenerateResult<Vec<String>> {
        self.inner.list_tables().await
    }

    async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>> {
        let call = self.column_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err((self.error)());
        }
        self.inner.columns_of(table).await
    }

    async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        self.inner.foreign_keys_of(table).await
    }
}

/// Never answers `columns_of` within any reasonable timeout.
struct StalledSource;

#[async_trait]
impl CatalogSource for StalledSource {
    async fn list_tables(&self) -> GenerateResult<Vec<String>> {
        Ok(vec!["book".to_string()])
    }

    async fn columns_of(&self, _table: &str) -> GenerateResult<Vec<Column>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(vec![])
    }

    async fn foreign_keys_of(&self, _table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        Ok(vec![])
    }
}

fn library() -> SnapshotCatalog {
    SnapshotCatalog::new()
        .table(Table::new("author").column(Column::new("id", "int").primary_key()))
        .table(
            Table::new("book")
                .column(Column::new("id", "int").primary_key())
                .column(Column::new("author_id", "int"))
                .foreign_key("author_id", "author", "id"),
        )
}

fn fast_retries(max_retries: u32) -> FacadeOptions {
    FacadeOptions::default().with_retries(max_retries, Duration::from_millis(1))
}

fn connection_reset() -> GenerateError {
    GenerateError::unavailable("columns_of", "connection reset")
}

#[tokio::test]
async fn test_table_list_is_pinned_at_open() {
    let facade = CatalogFacade::open(Arc::new(library()), FacadeOptions::default())
        .await
        .unwrap();
    assert_eq!(facade.list_tables(), ["author", "book"]);
    assert!(facade.contains_table("book"));
    assert!(!facade.contains_table("publisher"));
}

#[tokio::test]
async fn test_unavailable_is_retried_until_success() {
    let source = Arc::new(FlakySource::new(2, connection_reset));
    let facade = CatalogFacade::open(source.clone(), fast_retries(2)).await.unwrap();

    let columns = facade.columns_of("book").await.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let source = Arc::new(FlakySource::new(10, connection_reset));
    let facade = CatalogFacade::open(source.clone(), fast_retries(2)).await.unwrap();

    let err = facade.columns_of("book").await.unwrap_err();
    assert!(matches!(err, GenerateError::CatalogUnavailable { .. }));
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn test_schema_errors_are_not_retried() {
    let source = Arc::new(FlakySource::new(10, || GenerateError::table_not_found("book")));
    let facade = CatalogFacade::open(source.clone(), fast_retries(5)).await.unwrap();

    let err = facade.columns_of("book").await.unwrap_err();
    assert!(matches!(err, GenerateError::SchemaNotFound { .. }));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_backoff_doubles_between_attempts() {
    let source = Arc::new(FlakySource::new(2, connection_reset));
    let options = FacadeOptions::default().with_retries(2, Duration::from_millis(40));
    let facade = CatalogFacade::open(source, options).await.unwrap();

    let started = Instant::now();
    facade.columns_of("book").await.unwrap();
    // 40ms + 80ms of backoff
    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn test_timeout_surfaces_as_unavailable() {
    let options = FacadeOptions::default()
        .with_timeout(Duration::from_millis(30))
        .with_retries(0, Duration::from_millis(1));
    let facade = CatalogFacade::open(Arc::new(StalledSource), options).await.unwrap();

    let started = Instant::now();
    let err = facade.columns_of("book").await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5));
    match err {
        GenerateError::CatalogUnavailable { operation, reason } => {
            assert_eq!(operation, "columns_of(book)");
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected CatalogUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prefetch_preserves_order_and_content() {
    let facade = CatalogFacade::open(Arc::new(library()), FacadeOptions::default())
        .await
        .unwrap();
    let snapshot = facade.prefetch().await.unwrap();

    let names: Vec<_> = snapshot.tables().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["author", "book"]);
    assert_eq!(snapshot.get("book"), library().get("book"));
}

#[tokio::test]
async fn test_prefetch_fails_as_a_whole() {
    let source = Arc::new(FlakySource::new(10, connection_reset));
    let facade = CatalogFacade::open(source, fast_retries(0)).await.unwrap();
    assert!(facade.prefetch().await.is_err());
}
