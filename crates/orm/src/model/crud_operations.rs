//! CRUD Operations - Create, Read, Update, Delete operations for models
//!
//! Implements the core database operations with parameter binding over a
//! SQLite pool.

use serde_json::Value;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Sqlite, SqlitePool};

use crate::error::{ModelError, ModelResult};
use crate::model::core_trait::Model;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Trait providing CRUD operations for models
#[allow(async_fn_in_trait)]
pub trait CrudOperations: Model {
    /// Find a model by its primary key
    async fn find(pool: &SqlitePool, id: Self::PrimaryKey) -> ModelResult<Option<Self>>
    where
        Self: Sized,
    {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?",
            Self::table_name(),
            Self::primary_key_name()
        );

        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to find {}: {}", Self::table_name(), e)))?;

        match row {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Find a model by its primary key or return an error if not found
    async fn find_or_fail(pool: &SqlitePool, id: Self::PrimaryKey) -> ModelResult<Self>
    where
        Self: Sized,
    {
        Self::find(pool, id.clone())
            .await?
            .ok_or_else(|| ModelError::NotFound(format!("{}({})", Self::table_name(), id)))
    }

    /// All rows of the table, ordered by primary key
    async fn all(pool: &SqlitePool) -> ModelResult<Vec<Self>>
    where
        Self: Sized,
    {
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            Self::table_name(),
            Self::primary_key_name()
        );

        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to list {}: {}", Self::table_name(), e)))?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Number of rows in the table
    async fn count(pool: &SqlitePool) -> ModelResult<i64>
    where
        Self: Sized,
    {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::table_name());
        sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to count {}: {}", Self::table_name(), e)))
    }

    /// Insert a new row and return it as stored
    async fn create(pool: &SqlitePool, model: Self) -> ModelResult<Self>
    where
        Self: Sized,
    {
        let fields = model.to_fields();

        if fields.is_empty() {
            let insert_sql = format!("INSERT INTO {} DEFAULT VALUES RETURNING *", Self::table_name());
            let row = sqlx::query(&insert_sql)
                .fetch_one(pool)
                .await
                .map_err(|e| ModelError::Database(format!("Failed to create {}: {}", Self::table_name(), e)))?;

            return Self::from_row(&row);
        }

        let mut field_names: Vec<&String> = fields.keys().collect();
        field_names.sort();
        let placeholders = vec!["?"; field_names.len()];

        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
            Self::table_name(),
            field_names.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", "),
            placeholders.join(", ")
        );

        let mut query = sqlx::query(&insert_sql);
        for field_name in &field_names {
            query = bind_json_value(query, &fields[*field_name]);
        }

        let row = query
            .fetch_one(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to create {}: {}", Self::table_name(), e)))?;

        Self::from_row(&row)
    }

    /// Write every non-key field of this instance back to its row
    async fn update(&self, pool: &SqlitePool) -> ModelResult<()> {
        let pk = self
            .primary_key()
            .ok_or_else(|| ModelError::Validation(format!("{} has no primary key", Self::table_name())))?;

        let pk_name = Self::primary_key_name();
        let fields = self.to_fields();
        let mut field_names: Vec<&String> = fields.keys().filter(|&field| field != pk_name).collect();
        if field_names.is_empty() {
            return Ok(());
        }
        field_names.sort();

        let update_sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            Self::table_name(),
            field_names
                .iter()
                .map(|field| format!("{} = ?", field))
                .collect::<Vec<_>>()
                .join(", "),
            pk_name
        );

        let mut query = sqlx::query(&update_sql);
        for field_name in &field_names {
            query = bind_json_value(query, &fields[*field_name]);
        }
        query = query.bind(pk.to_string());

        let result = query
            .execute(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to update {}: {}", Self::table_name(), e)))?;

        if result.rows_affected() == 0 {
            return Err(ModelError::NotFound(format!("{}({})", Self::table_name(), pk)));
        }
        Ok(())
    }

    /// Delete this model instance from the database
    async fn delete(self, pool: &SqlitePool) -> ModelResult<()>
    where
        Self: Sized,
    {
        let pk = self
            .primary_key()
            .ok_or_else(|| ModelError::Validation(format!("{} has no primary key", Self::table_name())))?;

        let delete_sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            Self::table_name(),
            Self::primary_key_name()
        );

        sqlx::query(&delete_sql)
            .bind(pk.to_string())
            .execute(pool)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to delete {}: {}", Self::table_name(), e)))?;

        Ok(())
    }
}

impl<T: Model> CrudOperations for T {}

/// Bind a JSON field value with the closest SQLite type
fn bind_json_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
    }
}
