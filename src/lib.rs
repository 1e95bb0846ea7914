//! # modelsmith
//!
//! Reads a relational database's catalog and generates entity model classes
//! with their inferred relationships.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        CatalogSource (snapshot · SQLite · MySQL)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [catalog]  timeout · retry · pinned table list
//! ┌─────────────────────────────────────────────────────────┐
//! │                    CatalogFacade                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │  one table at a time
//!                          ▼ [inference]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Relationships (1:1 · 1:N · N:1 · N:M via join table)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 EntityDescription                        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [emitter] + [registry]
//! ┌─────────────────────────────────────────────────────────┐
//! │        <Entity>.model.ts ...  +  init-models.ts          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use modelsmith::prelude::*;
//!
//! let source = Arc::new(SqliteCatalog::open("./shop.db")?);
//! let facade = CatalogFacade::open(source, FacadeOptions::default()).await?;
//! let output = Generator::new(GeneratorOptions::default()).run(&facade).await?;
//! output.write_to("./models")?;
//! ```

pub mod catalog;
pub mod config;
pub mod emitter;
pub mod error;
pub mod inference;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod registry;

pub use error::{GenerateError, GenerateResult};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{
        CatalogFacade, CatalogSource, Column, ColumnDefault, FacadeOptions, ForeignKeyEdge,
        KeyClass, SnapshotCatalog, SqliteCatalog, Table,
    };
    pub use crate::emitter::{Artifact, EmitConfig};
    pub use crate::error::{GenerateError, GenerateResult};
    pub use crate::inference::{InferenceEngine, Relationship, RelationshipKind};
    pub use crate::model::{EntityDescription, Pluralization};
    pub use crate::pipeline::{CancelToken, GenerationOutput, Generator, GeneratorOptions};
}
