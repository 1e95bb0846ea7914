//! Code emission.
//!
//! Renders entity descriptions as `sequelize-typescript` model classes and
//! the relationship registry as an `init-models.ts` module that registers
//! every model and wires every association.
//!
//! # Example
//!
//! ```ignore
//! use modelsmith::emitter::{emit_entity, EmitConfig};
//!
//! let artifact = emit_entity(&entity, &EmitConfig::default());
//! assert_eq!(artifact.file_name, "Book.model.ts");
//! ```

mod entity;
pub mod format;
mod registry;

use serde::Serialize;

pub use entity::emit_entity;
pub use format::Indent;
pub use registry::{emit_registry, REGISTRY_FILE_NAME};

use crate::inference::Relationship;
use crate::model::naming::field_name;

/// Configuration for emission.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Indentation style.
    pub indent: Indent,
    /// Value of `timestamps` in every `@Table` decorator.
    pub timestamps: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            indent: Indent::default(),
            timestamps: true,
        }
    }
}

impl EmitConfig {
    /// Builder: set indentation.
    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }

    /// Builder: set the `timestamps` table option.
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.timestamps = timestamps;
        self
    }
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// File name relative to the output directory.
    pub file_name: String,
    pub contents: String,
}

/// File name of an entity's model class.
pub fn model_file_name(entity: &str) -> String {
    format!("{}.model.ts", entity)
}

/// Association options as a JSON object literal.
///
/// Keys are inserted in sorted order, so the text is the same whether or
/// not the map preserves insertion order.
pub(crate) fn association_options(rel: &Relationship) -> String {
    let mut options = serde_json::Map::new();
    options.insert(
        "foreignKey".to_string(),
        field_name(&rel.edge.source_column).into(),
    );
    if let Some(other_key) = &rel.other_key {
        options.insert("otherKey".to_string(), field_name(other_key).into());
    }
    if let Some(through) = &rel.through {
        options.insert("through".to_string(), through.clone().into());
    }
    serde_json::Value::Object(options).to_string()
}
