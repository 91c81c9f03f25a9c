//! Model System - model trait and CRUD operations for SQLite-backed entities
//!
//! - `core_trait`: Core Model trait definition
//! - `crud_operations`: Create, Read, Update, Delete operations

pub mod core_trait;
pub mod crud_operations;

pub use core_trait::Model;
pub use crud_operations::CrudOperations;
