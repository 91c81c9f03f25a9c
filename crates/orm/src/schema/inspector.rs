//! Reflection of the live SQLite schema

use sqlx::{Row, SqlitePool};

use super::types::{Column, ColumnType, Table};
use crate::error::{ModelError, ModelResult};

/// Reads table definitions out of a live database
pub struct Inspector<'a> {
    pool: &'a SqlitePool,
}

impl<'a> Inspector<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Names of all user tables, sorted; SQLite's internal tables are skipped
    pub async fn table_names(&self) -> ModelResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| ModelError::Schema(format!("Failed to list tables: {}", e)))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("name")
                    .map_err(|e| ModelError::Schema(format!("Failed to read table name: {}", e)))
            })
            .collect()
    }

    /// True if a table with this name exists
    pub async fn has_table(&self, name: &str) -> ModelResult<bool> {
        Ok(self.table_names().await?.iter().any(|t| t == name))
    }

    /// Reflect one table, or `None` if it does not exist
    pub async fn reflect_table(&self, name: &str) -> ModelResult<Option<Table>> {
        let pragma = format!("PRAGMA table_info(\"{}\")", name.replace('"', "\"\""));
        let rows = sqlx::query(&pragma)
            .fetch_all(self.pool)
            .await
            .map_err(|e| ModelError::Schema(format!("Failed to inspect table {}: {}", name, e)))?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut table = Table::new(name);
        for row in rows {
            let column_name: String = row
                .try_get("name")
                .map_err(|e| ModelError::Schema(format!("Failed to read column name: {}", e)))?;
            let declared: String = row.try_get("type").unwrap_or_default();
            let not_null: i64 = row.try_get("notnull").unwrap_or(0);
            let pk: i64 = row.try_get("pk").unwrap_or(0);

            table.columns.push(Column {
                name: column_name,
                column_type: ColumnType::from_declared(&declared),
                nullable: not_null == 0 && pk == 0,
                primary_key: pk > 0,
            });
        }

        Ok(Some(table))
    }

    /// Reflect every user table, sorted by name
    pub async fn reflect(&self) -> ModelResult<Vec<Table>> {
        let mut tables = Vec::new();
        for name in self.table_names().await? {
            if let Some(table) = self.reflect_table(&name).await? {
                tables.push(table);
            }
        }
        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_url;

    #[tokio::test]
    async fn test_reflects_tables_and_columns() {
        let pool = connect_url("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE books (id INTEGER NOT NULL, title VARCHAR(30), author VARCHAR, PRIMARY KEY (id))",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE TABLE alembic_version_one (version_num VARCHAR(32) NOT NULL)")
            .execute(&pool)
            .await
            .unwrap();

        let inspector = Inspector::new(&pool);
        assert_eq!(
            inspector.table_names().await.unwrap(),
            vec!["alembic_version_one".to_string(), "books".to_string()]
        );

        let books = inspector.reflect_table("books").await.unwrap().unwrap();
        assert_eq!(books.primary_key_columns(), vec!["id"]);
        let title = books.get_column("title").unwrap();
        assert_eq!(title.column_type, ColumnType::String(Some(30)));
        assert!(title.nullable);

        assert!(inspector.reflect_table("users").await.unwrap().is_none());
        assert_eq!(inspector.reflect().await.unwrap().len(), 2);
    }
}
