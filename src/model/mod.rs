//! Entity model.
//!
//! Turns a table's raw columns and classified relationships into an
//! [`EntityDescription`]: normalized entity and field names, resolved field
//! types, and the set of entities it references.

mod builder;
pub mod naming;
pub mod types;

pub use builder::{build, EntityColumn, EntityDescription};
pub use naming::Pluralization;
pub use types::FieldType;
