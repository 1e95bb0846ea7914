//! Relationship registry.
//!
//! Collects every entity's relationships during a run so the aggregate
//! artifact can wire all associations at the end.
//!
//! ```text
//!   Empty ──record──▶ Accumulating ──seal──▶ Sealed ──render──▶ Rendered
//!     │                                        ▲
//!     └────────────────── seal ────────────────┘
//! ```
//!
//! `record` is accepted once per entity while Empty or Accumulating.
//!
//! Any other transition is an [`GenerateError::InvariantViolation`].

use std::collections::HashSet;
use std::fmt;

use crate::error::{GenerateError, GenerateResult};
use crate::inference::Relationship;

/// Lifecycle state of a [`RelationshipRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Empty,
    Accumulating,
    Sealed,
    Rendered,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistryState::Empty => "empty",
            RegistryState::Accumulating => "accumulating",
            RegistryState::Sealed => "sealed",
            RegistryState::Rendered => "rendered",
        };
        write!(f, "{}", name)
    }
}

/// One entity's recorded relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub entity: String,
    pub relationships: Vec<Relationship>,
}

/// Write-once-per-entity accumulator, consumed once.
#[derive(Debug)]
pub struct RelationshipRegistry {
    state: RegistryState,
    entries: Vec<RegistryEntry>,
    recorded: HashSet<String>,
}

impl Default for RelationshipRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipRegistry {
    pub fn new() -> Self {
        Self {
            state: RegistryState::Empty,
            entries: Vec::new(),
            recorded: HashSet::new(),
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    /// Number of recorded entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an entity's relationships. Each entity is recorded at most once.
    pub fn record(
        &mut self,
        entity: impl Into<String>,
        relationships: Vec<Relationship>,
    ) -> GenerateResult<()> {
        let entity = entity.into();
        match self.state {
            RegistryState::Empty | RegistryState::Accumulating => {}
            state => {
                return Err(GenerateError::InvariantViolation(format!(
                    "cannot record '{}' in a {} registry",
                    entity, state
                )))
            }
        }
        if !self.recorded.insert(entity.clone()) {
            return Err(GenerateError::InvariantViolation(format!(
                "entity '{}' recorded twice",
                entity
            )));
        }

        self.entries.push(RegistryEntry {
            entity,
            relationships,
        });
        self.state = RegistryState::Accumulating;
        Ok(())
    }

    /// Close the registry to further writes.
    pub fn seal(&mut self) -> GenerateResult<()> {
        match self.state {
            RegistryState::Empty | RegistryState::Accumulating => {
                self.state = RegistryState::Sealed;
                Ok(())
            }
            state => Err(GenerateError::InvariantViolation(format!(
                "cannot seal a {} registry",
                state
            ))),
        }
    }

    /// Hand the entries, in record order, to `render`. Allowed once, after sealing.
    pub fn render<T>(&mut self, render: impl FnOnce(&[RegistryEntry]) -> T) -> GenerateResult<T> {
        if self.state != RegistryState::Sealed {
            return Err(GenerateError::InvariantViolation(format!(
                "cannot render a {} registry",
                self.state
            )));
        }
        let output = render(&self.entries);
        self.state = RegistryState::Rendered;
        Ok(output)
    }
}
