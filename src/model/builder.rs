//! Entity description builder.

use std::collections::BTreeSet;

use serde::Serialize;

use super::naming::{entity_name, field_name};
use super::types::FieldType;
use crate::catalog::Column;
use crate::inference::Relationship;

/// A column with its normalized field name and resolved type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityColumn {
    pub column: Column,
    pub field_name: String,
    pub field_type: FieldType,
}

impl EntityColumn {
    /// True if the field name differs from the catalog column name.
    pub fn is_renamed(&self) -> bool {
        self.field_name != self.column.name
    }
}

/// Normalized description of one table, ready for emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescription {
    /// Catalog table name.
    pub table: String,
    pub entity_name: String,
    /// Columns in ordinal order.
    pub columns: Vec<EntityColumn>,
    /// Outgoing relationships in edge order.
    pub relationships: Vec<Relationship>,
    /// Distinct relationship targets, sorted.
    pub references: BTreeSet<String>,
}

impl EntityDescription {
    /// Referenced entities other than this one.
    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.references
            .iter()
            .map(String::as_str)
            .filter(move |name| *name != self.entity_name)
    }
}

/// Combine a table's columns and relationships into an entity description.
pub fn build(table: &str, columns: &[Column], relationships: Vec<Relationship>) -> EntityDescription {
    let columns = columns
        .iter()
        .map(|column| EntityColumn {
            field_name: field_name(&column.name),
            field_type: FieldType::from_raw(&column.raw_type),
            column: column.clone(),
        })
        .collect();

    let references = relationships
        .iter()
        .map(|r| r.target_entity.clone())
        .collect();

    EntityDescription {
        table: table.to_string(),
        entity_name: entity_name(table),
        columns,
        relationships,
        references,
    }
}
