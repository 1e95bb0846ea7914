//! Edge classification.

use std::collections::HashSet;

use super::{Relationship, RelationshipKind};
use crate::catalog::{CatalogFacade, Column, ForeignKeyEdge, KeyClass};
use crate::error::{GenerateError, GenerateResult};
use crate::model::naming::{entity_name, field_name, property_name, Pluralization};

/// Through-table identifier for a join between two tables.
///
/// The pair is sorted first, so both sides of the join agree on the name.
pub fn through_name(a: &str, b: &str) -> String {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    format!("{}_{}", first, second)
}

/// True when `column` is one member of a multi-column primary key.
fn in_composite_primary_key(columns: &[Column], column: &str) -> bool {
    let primary: Vec<_> = columns
        .iter()
        .filter(|c| c.key == KeyClass::Primary)
        .collect();
    primary.len() > 1 && primary.iter().any(|c| c.name == column)
}

/// Classifies foreign-key edges against a catalog facade.
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    pluralization: Pluralization,
}

impl InferenceEngine {
    pub fn new(pluralization: Pluralization) -> Self {
        Self { pluralization }
    }

    pub fn pluralization(&self) -> Pluralization {
        self.pluralization
    }

    /// Classify one outgoing edge of `source_table`.
    ///
    /// Self-referencing edges skip the reverse-reference test, which would
    /// always succeed, and resolve to many-to-one unless the column is unique.
    pub async fn classify(
        &self,
        facade: &CatalogFacade,
        source_table: &str,
        edge: &ForeignKeyEdge,
    ) -> GenerateResult<Relationship> {
        if !facade.contains_table(&edge.target_table) {
            return Err(GenerateError::DanglingReference {
                table: source_table.to_string(),
                column: edge.source_column.clone(),
                target_table: edge.target_table.clone(),
                constraint: edge.constraint_name.clone(),
            });
        }

        let mut through = None;
        let mut other_key = None;

        let kind = if facade.is_join_table(source_table).await? {
            let edges = facade.foreign_keys_of(source_table).await?;
            let partner = edges
                .iter()
                .find(|e| e.source_column != edge.source_column)
                .map(|e| e.target_table.as_str())
                .unwrap_or(edge.target_table.as_str());
            through = Some(through_name(&edge.target_table, partner));
            other_key = facade.secondary_foreign_key_column(source_table).await?;
            RelationshipKind::ManyToMany
        } else if facade
            .is_column_unique(source_table, &edge.source_column)
            .await?
        {
            let columns = facade.columns_of(source_table).await?;
            if in_composite_primary_key(&columns, &edge.source_column) {
                tracing::warn!(
                    table = source_table,
                    column = %edge.source_column,
                    "column is part of a composite primary key, classifying as one-to-one"
                );
            }
            RelationshipKind::OneToOne
        } else if edge.is_self_reference() {
            tracing::warn!(
                table = source_table,
                column = %edge.source_column,
                "self-referencing foreign key, assuming many-to-one"
            );
            RelationshipKind::ManyToOne
        } else if facade
            .has_foreign_key_to(&edge.target_table, source_table)
            .await?
        {
            RelationshipKind::OneToMany
        } else {
            RelationshipKind::ManyToOne
        };

        let target_entity = entity_name(&edge.target_table);
        let property_name = property_name(&target_entity, kind.is_collection(), self.pluralization);

        tracing::debug!(
            table = source_table,
            column = %edge.source_column,
            target = %edge.target_table,
            kind = %kind,
            "classified foreign key"
        );

        Ok(Relationship {
            edge: edge.clone(),
            kind,
            target_entity,
            property_name,
            through,
            other_key,
        })
    }

    /// Classify every outgoing edge of `table`, in edge order.
    ///
    /// Property names stay unique within the table: a name already taken by
    /// a column or an earlier edge becomes `<fieldName><TargetEntity>`.
    pub async fn classify_table(
        &self,
        facade: &CatalogFacade,
        table: &str,
        edges: &[ForeignKeyEdge],
    ) -> GenerateResult<Vec<Relationship>> {
        let mut constraints = HashSet::new();
        for edge in edges {
            if !constraints.insert(edge.constraint_name.as_str()) {
                tracing::warn!(
                    table,
                    constraint = %edge.constraint_name,
                    "composite foreign key, classifying each column separately"
                );
            }
        }

        let mut taken: HashSet<String> = facade
            .columns_of(table)
            .await?
            .iter()
            .map(|c| field_name(&c.name))
            .collect();
        let mut relationships = Vec::with_capacity(edges.len());
        for edge in edges {
            let mut rel = self.classify(facade, table, edge).await?;
            if taken.contains(&rel.property_name) {
                let base = format!("{}{}", field_name(&edge.source_column), rel.target_entity);
                let mut candidate = base.clone();
                let mut n = 2;
                while taken.contains(&candidate) {
                    candidate = format!("{}{}", base, n);
                    n += 1;
                }
                rel.property_name = candidate;
            }
            taken.insert(rel.property_name.clone());
            relationships.push(rel);
        }
        Ok(relationships)
    }
}
