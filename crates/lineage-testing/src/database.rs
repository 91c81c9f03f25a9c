//! Database testing utilities
//!
//! Every [`TestDatabase`] is a fresh SQLite file inside its own temporary
//! directory, removed when the value is dropped. Other pools (such as the
//! ones opened by a migration runner) can connect to the same file through
//! [`TestDatabase::url`].

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tempfile::TempDir;

use crate::TestResult;

/// Temporary SQLite database
pub struct TestDatabase {
    _dir: TempDir,
    path: PathBuf,
    url: String,
    pool: SqlitePool,
}

impl TestDatabase {
    /// Create an empty database file
    pub async fn new() -> TestResult<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test.db");
        let url = format!("sqlite://{}", path.display());

        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self {
            _dir: dir,
            path,
            url,
            pool,
        })
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// `sqlite://` URL of the database file
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a raw SQL statement (for test setup)
    pub async fn execute(&self, sql: &str) -> TestResult<()> {
        sqlx::query(sql).execute(&self.pool).await?;
        Ok(())
    }

    /// User table names, sorted
    pub async fn table_names(&self) -> TestResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get::<String, _>("name")).collect())
    }

    pub async fn has_table(&self, table: &str) -> TestResult<bool> {
        Ok(self.table_names().await?.iter().any(|name| name == table))
    }

    /// Rows of a version table; empty when the table does not exist
    pub async fn versions_in(&self, table: &str) -> TestResult<Vec<String>> {
        if !self.has_table(table).await? {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!("SELECT version_num FROM {}", table))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get::<String, _>("version_num")).collect())
    }

    /// The single revision recorded in a version table, if any
    pub async fn version_of(&self, table: &str) -> TestResult<Option<String>> {
        Ok(self.versions_in(table).await?.into_iter().next())
    }

    /// Count records in a table
    pub async fn count_records(&self, table: &str) -> TestResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Column names of a table, in declaration order
    pub async fn column_names(&self, table: &str) -> TestResult<Vec<String>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", table))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get::<String, _>("name")).collect())
    }
}
