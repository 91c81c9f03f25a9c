//! Schema definitions
//!
//! Declared table metadata owned by a module, a DDL builder, and reflection
//! of the live SQLite schema.

pub mod builder;
pub mod inspector;
pub mod types;

pub use builder::{SchemaBuilder, TableBuilder};
pub use inspector::Inspector;
pub use types::{Column, ColumnType, MetaData, Table};
