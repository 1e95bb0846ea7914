//! MySQL catalog source.
//!
//! Reads `information_schema` scoped to the connection's database. The point
//! predicates are answered with direct queries instead of the default
//! fetch-then-filter implementations.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;

use super::provider::CatalogSource;
use super::types::{Column, ColumnDefault, ForeignKeyEdge, KeyClass};
use crate::config::ConnectionConfig;
use crate::error::{GenerateError, GenerateResult};

/// Catalog source over a MySQL/MariaDB server.
pub struct MySqlCatalog {
    pool: MySqlPool,
    database: String,
}

impl MySqlCatalog {
    /// Connect using a connection descriptor.
    ///
    /// `acquire_timeout` bounds how long a catalog query waits for a pooled
    /// connection.
    pub async fn connect(
        config: &ConnectionConfig,
        acquire_timeout: Duration,
    ) -> GenerateResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(4)
            .acquire_timeout(acquire_timeout)
            .connect(&config.to_url())
            .await
            .map_err(|e| GenerateError::unavailable("connect", e))?;

        Ok(Self {
            pool,
            database: config.database.clone(),
        })
    }

    /// The schema this source is scoped to.
    pub fn database(&self) -> &str {
        &self.database
    }

    async fn fetch(
        &self,
        operation: String,
        sql: &str,
        binds: &[&str],
    ) -> GenerateResult<Vec<MySqlRow>> {
        let mut query = sqlx::query(sql).bind(self.database.as_str());
        for value in binds {
            query = query.bind(*value);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GenerateError::unavailable(operation, e))
    }

    async fn ensure_table(&self, table: &str) -> GenerateResult<()> {
        let rows = self
            .fetch(
                format!("table_exists({})", table),
                "SELECT table_name AS table_name FROM information_schema.tables \
                 WHERE table_schema = ? AND table_name = ?",
                &[table],
            )
            .await?;
        if rows.is_empty() {
            return Err(GenerateError::table_not_found(table));
        }
        Ok(())
    }

    fn column_from_row(row: &MySqlRow) -> Result<Column, sqlx::Error> {
        let key: String = row.try_get("column_key")?;
        let extra: String = row.try_get("extra")?;
        let nullable: String = row.try_get("is_nullable")?;
        let default: Option<String> = row.try_get("column_default")?;
        let key = KeyClass::from_code(&key);

        Ok(Column {
            name: row.try_get("column_name")?,
            raw_type: row.try_get("column_type")?,
            nullable: nullable.eq_ignore_ascii_case("YES"),
            primary_key: key == KeyClass::Primary,
            auto_increment: extra.to_lowercase().contains("auto_increment"),
            default: ColumnDefault::from_raw(default.as_deref()),
            key,
        })
    }
}

fn decode<T>(operation: &str, result: Result<T, sqlx::Error>) -> GenerateResult<T> {
    result.map_err(|e| GenerateError::unavailable(operation, e))
}

#[async_trait]
impl CatalogSource for MySqlCatalog {
    async fn list_tables(&self) -> GenerateResult<Vec<String>> {
        let rows = self
            .fetch(
                "list_tables".to_string(),
                "SELECT CAST(table_name AS CHAR) AS table_name FROM information_schema.tables \
                 WHERE table_schema = ? AND table_type = 'BASE TABLE' \
                 ORDER BY table_name",
                &[],
            )
            .await?;
        rows.iter()
            .map(|row| decode("list_tables", row.try_get("table_name")))
            .collect()
    }

    async fn columns_of(&self, table: &str) -> GenerateResult<Vec<Column>> {
        let operation = format!("columns_of({})", table);
        let rows = self
            .fetch(
                operation.clone(),
                "SELECT CAST(column_name AS CHAR) AS column_name, \
                        CAST(column_type AS CHAR) AS column_type, \
                        CAST(is_nullable AS CHAR) AS is_nullable, \
                        CAST(column_key AS CHAR) AS column_key, \
                        CAST(extra AS CHAR) AS extra, \
                        CAST(column_default AS CHAR) AS column_default \
                 FROM information_schema.columns \
                 WHERE table_schema = ? AND table_name = ? \
                 ORDER BY ordinal_position",
                &[table],
            )
            .await?;
        if rows.is_empty() {
            return Err(GenerateError::table_not_found(table));
        }
        rows.iter()
            .map(|row| decode(&operation, Self::column_from_row(row)))
            .collect()
    }

    async fn foreign_keys_of(&self, table: &str) -> GenerateResult<Vec<ForeignKeyEdge>> {
        self.ensure_table(table).await?;
        let operation = format!("foreign_keys_of({})", table);
        let rows = self
            .fetch(
                operation.clone(),
                "SELECT CAST(column_name AS CHAR) AS source_column, \
                        CAST(referenced_table_name AS CHAR) AS target_table, \
                        CAST(referenced_column_name AS CHAR) AS target_column, \
                        CAST(constraint_name AS CHAR) AS constraint_name \
                 FROM information_schema.key_column_usage \
                 WHERE table_schema = ? AND table_name = ? \
                   AND referenced_table_name IS NOT NULL \
                 ORDER BY constraint_name, ordinal_position",
                &[table],
            )
            .await?;
        rows.iter()
            .map(|row| {
                Ok(ForeignKeyEdge::new(
                    table,
                    decode::<String>(&operation, row.try_get("source_column"))?,
                    decode::<String>(&operation, row.try_get("target_table"))?,
                    decode::<String>(&operation, row.try_get("target_column"))?,
                    decode::<String>(&operation, row.try_get("constraint_name"))?,
                ))
            })
            .collect()
    }

    async fn is_join_table(&self, table: &str) -> GenerateResult<bool> {
        let operation = format!("is_join_table({})", table);
        let rows = self
            .fetch(
                operation.clone(),
                "SELECT CAST(column_key AS CHAR) AS column_key \
                 FROM information_schema.columns \
                 WHERE table_schema = ? AND table_name = ?",
                &[table],
            )
            .await?;
        if rows.is_empty() {
            return Err(GenerateError::table_not_found(table));
        }
        let mut multiple = 0;
        let mut primary = 0;
        for row in &rows {
            let code: String = decode(&operation, row.try_get("column_key"))?;
            match KeyClass::from_code(&code) {
                KeyClass::Multiple => multiple += 1,
                KeyClass::Primary => primary += 1,
                _ => {}
            }
        }
        Ok(multiple == 2 && primary <= 2)
    }

    async fn is_column_unique(&self, table: &str, column: &str) -> GenerateResult<bool> {
        let operation = format!("is_column_unique({}.{})", table, column);
        let rows = self
            .fetch(
                operation.clone(),
                "SELECT CAST(column_key AS CHAR) AS column_key \
                 FROM information_schema.columns \
                 WHERE table_schema = ? AND table_name = ? AND column_name = ?",
                &[table, column],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| GenerateError::column_not_found(table, column))?;
        let code: String = decode(&operation, row.try_get("column_key"))?;
        Ok(KeyClass::from_code(&code).is_unique())
    }

    async fn has_foreign_key_to(&self, table: &str, target_table: &str) -> GenerateResult<bool> {
        let operation = format!("has_foreign_key_to({} -> {})", table, target_table);
        let rows = self
            .fetch(
                operation.clone(),
                "SELECT COUNT(*) AS edge_count \
                 FROM information_schema.key_column_usage \
                 WHERE table_schema = ? AND table_name = ? AND referenced_table_name = ?",
                &[table, target_table],
            )
            .await?;
        let count: i64 = match rows.first() {
            Some(row) => decode(&operation, row.try_get("edge_count"))?,
            None => 0,
        };
        Ok(count > 0)
    }

    async fn secondary_foreign_key_column(&self, table: &str) -> GenerateResult<Option<String>> {
        let operation = format!("secondary_foreign_key_column({})", table);
        let rows = self
            .fetch(
                operation.clone(),
                "SELECT CAST(column_name AS CHAR) AS column_name \
                 FROM information_schema.key_column_usage \
                 WHERE table_schema = ? AND table_name = ? \
                   AND referenced_table_name IS NOT NULL \
                 ORDER BY constraint_name, ordinal_position \
                 LIMIT 1, 1",
                &[table],
            )
            .await?;
        rows.first()
            .map(|row| decode(&operation, row.try_get("column_name")))
            .transpose()
    }
}
