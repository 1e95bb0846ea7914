//! Catalog record types.
//!
//! These are the normalized records produced once at the catalog boundary.
//! Sources translate their driver-specific rows into these types; nothing
//! downstream looks at raw catalog rows.

use serde::{Deserialize, Serialize};

/// Key classification of a column, as reported by the catalog.
///
/// Mirrors MySQL's `information_schema.columns.COLUMN_KEY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyClass {
    /// Part of the primary key (`PRI`).
    Primary,
    /// Single-column unique index (`UNI`).
    Unique,
    /// Leading column of a non-unique index, typically a foreign key (`MUL`).
    Multiple,
    /// Not indexed.
    #[default]
    None,
}

impl KeyClass {
    /// Parse a MySQL `COLUMN_KEY` code. Unknown codes are `None`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }

    /// True for the classes treated as unique.
    ///
    /// Every member of a composite primary key is `Primary`, so this holds
    /// for each of them even though only the combination is unique.
    pub fn is_unique(self) -> bool {
        matches!(self, Self::Primary | Self::Unique)
    }
}

/// Raw default value state of a column.
///
/// A missing default and an explicit `NULL` literal are kept apart; the
/// emitter decides how each is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    /// No default declared.
    #[default]
    Absent,
    /// Default is the literal `NULL`.
    Null,
    /// Default is an expression or literal, kept verbatim.
    Expression(String),
}

impl ColumnDefault {
    /// Normalize a raw catalog default.
    ///
    /// `None` means the catalog reported no default; the string `NULL`
    /// (any case) is the explicit null literal.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Absent,
            Some(value) if value.trim().eq_ignore_ascii_case("null") => Self::Null,
            Some(value) => Self::Expression(value.to_string()),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name as stored in the catalog.
    pub name: String,
    /// Raw catalog type (e.g. `varchar(255)`, `int unsigned`).
    pub raw_type: String,
    /// Whether NULL values are allowed.
    #[serde(default)]
    pub nullable: bool,
    /// Whether this column is part of the primary key.
    #[serde(default)]
    pub primary_key: bool,
    /// Whether this column is auto-incremented.
    #[serde(default)]
    pub auto_increment: bool,
    /// Default value state.
    #[serde(default)]
    pub default: ColumnDefault,
    /// Key classification.
    #[serde(default)]
    pub key: KeyClass,
}

impl Column {
    /// Create a NOT NULL, unindexed column without a default.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            nullable: false,
            primary_key: false,
            auto_increment: false,
            default: ColumnDefault::Absent,
            key: KeyClass::None,
        }
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.key = KeyClass::Primary;
        self
    }

    /// Mark as auto-increment.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Allow NULL values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark as carrying a single-column unique index.
    pub fn unique(mut self) -> Self {
        if self.key != KeyClass::Primary {
            self.key = KeyClass::Unique;
        }
        self
    }

    /// Set the key classification explicitly.
    pub fn key(mut self, key: KeyClass) -> Self {
        self.key = key;
        self
    }

    /// Set the default value state.
    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = default;
        self
    }
}

/// A directed single-column foreign key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    /// Table owning the foreign key.
    pub source_table: String,
    /// Foreign key column in the source table.
    pub source_column: String,
    /// Referenced table.
    pub target_table: String,
    /// Referenced column.
    pub target_column: String,
    /// Constraint name.
    pub constraint_name: String,
}

impl ForeignKeyEdge {
    pub fn new(
        source_table: impl Into<String>,
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
        constraint_name: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            source_column: source_column.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
            constraint_name: constraint_name.into(),
        }
    }

    /// True when the edge points back at its own table.
    pub fn is_self_reference(&self) -> bool {
        self.source_table == self.target_table
    }
}

/// Immutable snapshot of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns in ordinal order.
    pub columns: Vec<Column>,
    /// Outgoing foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

impl Table {
    /// Create an empty table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Add a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a foreign key from `column` to `target_table.target_column`.
    ///
    /// The constraint is named `fk_<table>_<column>`. An unindexed source
    /// column is promoted to [`KeyClass::Multiple`], matching how InnoDB
    /// indexes foreign key columns.
    pub fn foreign_key(
        mut self,
        column: &str,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        let constraint = format!("fk_{}_{}", self.name, column);
        self.foreign_keys.push(ForeignKeyEdge::new(
            self.name.clone(),
            column,
            target_table,
            target_column,
            constraint,
        ));
        if let Some(col) = self.columns.iter_mut().find(|c| c.name == column) {
            if col.key == KeyClass::None {
                col.key = KeyClass::Multiple;
            }
        }
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
