//! Core Model Trait - Base definition for database entities
//!
//! Defines the Model trait: table metadata, primary key handling and the
//! row/field conversion contract used by the CRUD operations.

use std::collections::HashMap;
use std::fmt::Debug;

use sqlx::sqlite::SqliteRow;

use crate::error::ModelResult;
use crate::schema::Table;

/// Core trait for database models with standard ORM operations
pub trait Model: Send + Sync + Debug {
    /// The type used for this model's primary key
    type PrimaryKey: Clone + Send + Sync + Debug + std::fmt::Display;

    /// Table name for this model
    fn table_name() -> &'static str;

    /// Declared table, as contributed to the owning module's metadata
    fn table() -> Table;

    /// Primary key field name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Get the primary key value for this model instance
    fn primary_key(&self) -> Option<Self::PrimaryKey>;

    /// Set the primary key value for this model instance
    fn set_primary_key(&mut self, key: Self::PrimaryKey);

    /// Create a model instance from a database row
    fn from_row(row: &SqliteRow) -> ModelResult<Self>
    where
        Self: Sized;

    /// Convert model to field-value pairs for database operations
    ///
    /// The primary key is left out while it is unset so the database assigns it.
    fn to_fields(&self) -> HashMap<String, serde_json::Value>;
}
