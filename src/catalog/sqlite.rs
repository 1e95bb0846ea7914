//! SQLite catalog source.
//!
//! Reads table metadata through the `pragma_*` table-valued functions.
//! SQLite has no `COLUMN_KEY`, so key classes are derived:
//!
//! - primary key column → [`KeyClass::Primary`]
//! - column covered alone by a unique index → [`KeyClass::Unique`]
//! - column used by a foreign key, or leading a non-unique index → [`KeyClass::Multiple`]
//!
//! SQLite foreign keys are unnamed; they are reported as `fk_<table>_<id>`,
//! ordered by the position of their source column.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags};

use super::provider::CatalogSource;
use super::types::{Column, ColumnDefault, ForeignKeyEdge, KeyClass};
use crate::error::{GenerateError, GenerateResult};

/// Catalog source over a SQLite database.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

/// One row of `pragma_table_info`.
struct ColumnRow {
    name: String,
    data_type: String,
    not_null: bool,
    default: Option<String>,
    pk_position: i64,
}

/// One row of `pragma_foreign_key_list`.
struct ForeignKeyRow {
    id: i64,
    target_table: String,
    from: String,
    to: Option<String>,
}

impl SqliteCatalog {
    /// Open a database file read-only.
    pub fn open(path: impl AsRef<Path>) -> GenerateResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| GenerateError::unavailable(format!("open({})", path.display()), e))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> GenerateResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| GenerateError::unavailable(operation, "connection lock poisoned"))?;
        f(&*conn).map_err(|e| GenerateError::unavailable(operation, e))
    }

    fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn column_rows(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnRow>> {
        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid",
        )?;
        let rows = stmt.query_map(params![table], |row| {
            Ok(ColumnRow {
                name: row.get(0)?,
                data_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default: row.get(3)?,
                pk_position: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    fn foreign_key_rows(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ForeignKeyRow>> {
        let mut stmt = conn.prepare(
            "SELECT id, \"table\", \"from\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
        )?;
        let rows = stmt.query_map(params![table], |row| {
            Ok(ForeignKeyRow {
                id: row.get(0)?,
                target_table: row.get(1)?,
                from: row.get(2)?,
                to: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    /// Columns covered alone by a unique index, and leading columns of
    /// non-unique indexes.
    fn index_columns(
        conn: &Connection,
        table: &str,
    ) -> rusqlite::Result<(HashSet<String>, HashSet<String>)> {
        let mut list = conn.prepare("SELECT name, \"unique\" FROM pragma_index_list(?1)")?;
        let indexes: Vec<(String, bool)> = list
            .query_map(params![table], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
            })?
            .collect::<rusqlite::Result<_>>()?;

        let mut info =
            conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
        let mut unique = HashSet::new();
        let mut leading = HashSet::new();
        for (index, is_unique) in indexes {
            let columns: Vec<Option<String>> = info
                .query_map(params![index], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;
            match (is_unique, columns.as_slice()) {
                (true, [Some(only)]) => {
                    unique.insert(only.clone());
                }
                (false, [Some(first), ..]) => {
                    leading.insert(first.clone());
                }
                _ => {}
            }
        }
        Ok((unique, leading))
    }

    fn primary_key_column(conn: &Connection, table: &str) -> rusqlite::Result<Option<String>> {
        let rows = Self::column_rows(conn, table)?;
        Ok(rows.into_iter().find(|r| r.pk_position == 1).map(|r| r.name))
    }

    fn load_columns(conn: &Connection, table: &str) -> rusqlite::Result<Option<Vec<Column>>> {
        let rows = Self::column_rows(conn, table)?;
        if rows.is_empty() {
            return Ok(None);
        }

        let (unique, leading) = Self::index_columns(conn, table)?;
        let fk_columns: HashSet<String> = Self::foreign_key_rows(conn, table)?
            .into_iter()
            .map(|r| r.from)
            .collect();
        let pk_count = rows.iter().filter(|r| r.pk_position > 0).count();

        let columns = rows
            .into_iter()
            .map(|r| {
                let primary_key = r.pk_position > 0;
                let key = if primary_key {
                    KeyClass::Primary
                } else if unique.contains(&r.name) {
                    KeyClass::Unique
                } else if fk_columns.contains(&r.name) || leading.contains(&r.name) {
                    KeyClass::Multiple
                } else {
                    KeyClass::None
                };
                // INTEGER PRIMARY KEY aliases the rowid
                let auto_increment =
                    primary_key && pk_count == 1 && r.data_type.eq_ignore_ascii_case("integer");
                Column {
                    nullable: !r.not_null && !primary_key,
                    default: ColumnDefault::from_raw(r.default.as_deref()),
                    name: r.name,
                    raw_type: r.data_type,
                    primary_key,
                    auto_increment,
                    key,
                }
            })
            .collect();
        Ok(Some(columns))
    }

    fn load_foreign_keys(
        conn: &Connection,
        table: &str,
    ) -> rusqlite::Result<Vec<ForeignKeyEdge>> {
        let positions: HashMap<String, usize> = Self::column_rows(conn, table)?
            .into_iter()
            .enumerate()
            .map(|(i, r)| (r.name, i))
            .collect();
        // pragma ids run opposite to declaration order; report by column position
        let mut rows = Self::foreign_key_rows(conn, table)?;
        rows.sort_by_key(|r| positions.get(&r.from).copied().unwrap_or(usize::MAX));

        let mut target_pks: HashMap<String, Option<String>> = HashMap::new();
        let mut edges = Vec::with_capacity(rows.len());
        for row in rows {
            // A missing target column means the target's primary key.
            let target_column = match row.to {
                Some(column) => column,
                None => {
                    if !target_pks.contains_key(&row.target_table) {
                        let pk = Self::primary_key_column(conn, &row.target_table)?;
                        target_pks.insert(row.target_table.clone(), pk);
                    }
                    target_pks
                        .get(&row.target_table)
                        .cloned()
                        .flatten()
                        .unwrap_or_default()
                }
            };
            edges.push(ForeignKeyEdge::new(
                table,
                row.from,
                row.target_table,
                target_column,
                format!("fk_{}_{}", table, row.id),
            ));
        }
        Ok(edges)
    }
}

#[async_trait]
impl CatalogSource for SqliteCatalog {
    async fn list_tables(&self) -> GenerateResult<Vec<String>> {
        self.with_conn("list_tables", |conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
    }

    async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>> {
        self.with_conn(&format!("columns_of({})", table), |conn| {
            Self::load_columns(conn, table)
        })?
        .ok_or_else(|| GenerateError::table_not_found(table))
    }

    async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        let operation = format!("foreign_keys_of({})", table);
        let edges = self.with_conn(&operation, |conn| {
            if !Self::table_exists(conn, table)? {
                return Ok(None);
            }
            Self::load_foreign_keys(conn, table).map(Some)
        })?;
        edges.ok_or_else(|| GenerateError::table_not_found(table))
    }
}
