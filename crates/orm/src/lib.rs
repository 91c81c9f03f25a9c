//! # lineage-orm: Database layer for lineage
//!
//! SQLite connections, declared table metadata and reflection, a small model
//! layer, and the migration system: file-based revision lineages, each
//! tracked in its own version table so that several modules can migrate one
//! database independently.

pub mod database;
pub mod environment;
pub mod error;
pub mod migrations;
pub mod model;
pub mod schema;

pub use database::{connect, connect_url, DatabaseConfig};
pub use environment::{MigrationContext, ModuleEnvironment, ModuleRegistry};
pub use error::*;
pub use migrations::*;
pub use model::{CrudOperations, Model};
pub use schema::{Column, ColumnType, Inspector, MetaData, SchemaBuilder, Table, TableBuilder};
