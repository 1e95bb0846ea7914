//! Scalar field types.
//!
//! Raw catalog types (`varchar(255)`, `int(10) unsigned`, `double precision`)
//! resolve to one of a fixed set of field types. The lookup never fails:
//! anything unrecognized is text.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Base name, optional `(args)`, trailing numeric modifiers.
static RAW_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z][a-z0-9_ ]*?)\s*(?:\(\s*([^)]*?)\s*\))?(?:\s+(?:unsigned|signed|zerofill))*$")
        .unwrap()
});

/// Resolved scalar type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Text,
    DateOnly,
    DateTime,
    Time,
    Float,
    Decimal,
    Boolean,
    Json,
    Uuid,
}

impl FieldType {
    /// Resolve a raw catalog type.
    pub fn from_raw(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        let Some(caps) = RAW_TYPE.captures(&lowered) else {
            return FieldType::Text;
        };
        let base = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let args = caps.get(2).map(|m| m.as_str());

        match base {
            // MySQL's boolean alias is tinyint(1)
            "tinyint" if args == Some("1") => FieldType::Boolean,
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "bigint" | "year" => {
                FieldType::Integer
            }
            "date" => FieldType::DateOnly,
            "datetime" | "timestamp" => FieldType::DateTime,
            "time" => FieldType::Time,
            "float" | "double" | "double precision" | "real" => FieldType::Float,
            "decimal" | "numeric" => FieldType::Decimal,
            "boolean" | "bool" => FieldType::Boolean,
            "json" | "jsonb" => FieldType::Json,
            "uuid" => FieldType::Uuid,
            _ => FieldType::Text,
        }
    }

    /// `DataType` member used in `@Column({ type })`.
    pub fn sequelize_type(self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Text => "STRING",
            FieldType::DateOnly => "DATEONLY",
            FieldType::DateTime => "DATE",
            FieldType::Time => "TIME",
            FieldType::Float => "FLOAT",
            FieldType::Decimal => "DECIMAL",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Json => "JSON",
            FieldType::Uuid => "UUID",
        }
    }

    /// TypeScript type of the declared property.
    pub fn ts_type(self) -> &'static str {
        match self {
            FieldType::Integer | FieldType::Float | FieldType::Decimal => "number",
            FieldType::Boolean => "boolean",
            FieldType::DateOnly | FieldType::DateTime => "Date",
            FieldType::Json => "object",
            FieldType::Text | FieldType::Time | FieldType::Uuid => "string",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "integer",
            FieldType::Text => "text",
            FieldType::DateOnly => "date",
            FieldType::DateTime => "datetime",
            FieldType::Time => "time",
            FieldType::Float => "float",
            FieldType::Decimal => "decimal",
            FieldType::Boolean => "boolean",
            FieldType::Json => "json",
            FieldType::Uuid => "uuid",
        };
        write!(f, "{}", name)
    }
}
