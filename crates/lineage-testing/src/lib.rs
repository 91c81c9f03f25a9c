//! # lineage-testing
//!
//! Test support for the lineage workspace:
//!
//! - **TestDatabase**: a throwaway SQLite database file with query helpers
//! - **TestProject**: a temporary project directory with a `lineage.toml`
//!   and per-module `versions/` directories

pub mod database;
pub mod project;

pub use database::TestDatabase;
pub use project::TestProject;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{TestDatabase, TestError, TestProject, TestResult};
}

#[derive(thiserror::Error, Debug)]
pub enum TestError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Test setup error: {0}")]
    Setup(String),
}

pub type TestResult<T> = Result<T, TestError>;
