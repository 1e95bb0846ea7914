//! Catalog access.
//!
//! Everything the engine knows about a database comes through this module.
//! Sources normalize their native metadata into [`Column`] and
//! [`ForeignKeyEdge`] records once, at this boundary.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        CatalogFacade                            │
//! │  pinned table list · per-call timeout · bounded retry/backoff   │
//! │  - list_tables()          - is_join_table()                     │
//! │  - columns_of()           - is_column_unique()                  │
//! │  - foreign_keys_of()      - has_foreign_key_to()                │
//! │  - prefetch()             - secondary_foreign_key_column()      │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼  Arc<dyn CatalogSource>
//! ┌───────────────────┬───────────────────┬─────────────────────────┐
//! │  SnapshotCatalog  │   SqliteCatalog   │  MySqlCatalog (mysql)   │
//! │  (JSON, memory)   │   (pragma_*)      │  (information_schema)   │
//! └───────────────────┴───────────────────┴─────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modelsmith::catalog::{CatalogFacade, FacadeOptions, SqliteCatalog};
//!
//! let source = Arc::new(SqliteCatalog::open("./shop.db")?);
//! let facade = CatalogFacade::open(source, FacadeOptions::default()).await?;
//! for table in facade.list_tables() {
//!     let edges = facade.foreign_keys_of(table).await?;
//! }
//! ```

mod facade;
#[cfg(feature = "mysql")]
mod mysql;
mod provider;
mod snapshot;
mod sqlite;
mod types;

pub use facade::{CatalogFacade, FacadeOptions};
#[cfg(feature = "mysql")]
pub use mysql::MySqlCatalog;
pub use provider::CatalogSource;
pub use snapshot::SnapshotCatalog;
pub use sqlite::SqliteCatalog;
pub use types::*;
