//! Relationship inference.
//!
//! Every foreign-key edge of a table is classified into exactly one
//! [`RelationshipKind`]. The decision order is fixed:
//!
//! 1. the target table must be known, otherwise `DanglingReference`
//! 2. the source is a join table → [`RelationshipKind::ManyToMany`]
//! 3. the source column is unique or primary → [`RelationshipKind::OneToOne`]
//! 4. the target references the source back → [`RelationshipKind::OneToMany`],
//!    otherwise [`RelationshipKind::ManyToOne`]
//!
//! # Example
//!
//! ```ignore
//! use modelsmith::inference::InferenceEngine;
//!
//! let engine = InferenceEngine::default();
//! for edge in facade.foreign_keys_of("book").await? {
//!     let rel = engine.classify(&facade, "book", &edge).await?;
//!     println!("{} {} -> {}", rel.kind, rel.property_name, rel.target_entity);
//! }
//! ```

mod engine;

use std::fmt;

use serde::Serialize;

use crate::catalog::ForeignKeyEdge;

pub use engine::{through_name, InferenceEngine};

/// Kind of association a foreign-key edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipKind {
    /// Association method name (`belongsTo`, `hasOne`, `hasMany`, `belongsToMany`).
    pub fn association_name(self) -> &'static str {
        match self {
            RelationshipKind::OneToOne => "hasOne",
            RelationshipKind::OneToMany => "hasMany",
            RelationshipKind::ManyToOne => "belongsTo",
            RelationshipKind::ManyToMany => "belongsToMany",
        }
    }

    /// Association decorator name (`BelongsTo`, `HasOne`, ...).
    pub fn decorator_name(self) -> &'static str {
        match self {
            RelationshipKind::OneToOne => "HasOne",
            RelationshipKind::OneToMany => "HasMany",
            RelationshipKind::ManyToOne => "BelongsTo",
            RelationshipKind::ManyToMany => "BelongsToMany",
        }
    }

    /// True for kinds whose property holds a collection.
    pub fn is_collection(self) -> bool {
        matches!(self, RelationshipKind::OneToMany | RelationshipKind::ManyToMany)
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationshipKind::OneToOne => "one_to_one",
            RelationshipKind::OneToMany => "one_to_many",
            RelationshipKind::ManyToOne => "many_to_one",
            RelationshipKind::ManyToMany => "many_to_many",
        };
        write!(f, "{}", name)
    }
}

/// A classified foreign-key edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// The edge this relationship was derived from.
    pub edge: ForeignKeyEdge,
    pub kind: RelationshipKind,
    /// Normalized name of the target table.
    pub target_entity: String,
    /// Attachment name on the source entity (`author`, `books`).
    pub property_name: String,
    /// Join table identifier, for many-to-many only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub through: Option<String>,
    /// Join table's second foreign key column, for many-to-many only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_key: Option<String>,
}

impl Relationship {
    /// The foreign key column on the source table.
    pub fn foreign_key(&self) -> &str {
        &self.edge.source_column
    }
}
