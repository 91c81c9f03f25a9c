//! Database connectivity
//!
//! Opens the shared SQLite database file. Migration runs use a single
//! connection so that one transaction covers the whole invocation.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ModelError, ModelResult};

/// Connection settings for the shared database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite://app.db`
    pub url: String,
    /// Maximum pool size
    pub max_connections: u32,
    /// Seconds to wait on a locked database before failing
    pub busy_timeout: u64,
    /// Create the database file if it does not exist
    pub create_if_missing: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 1,
            busy_timeout: 5,
            create_if_missing: true,
        }
    }

    /// Allow more than one connection (for model CRUD rather than migrations)
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    fn connect_options(&self) -> ModelResult<SqliteConnectOptions> {
        if !self.url.starts_with("sqlite:") {
            return Err(ModelError::Configuration(format!(
                "Unsupported database URL '{}': only sqlite:// URLs are supported",
                self.url
            )));
        }

        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(|e| ModelError::Configuration(format!("Invalid database URL '{}': {}", self.url, e)))?
            .create_if_missing(self.create_if_missing)
            .busy_timeout(Duration::from_secs(self.busy_timeout));

        Ok(options)
    }
}

/// Open a pool for the configured database
pub async fn connect(config: &DatabaseConfig) -> ModelResult<SqlitePool> {
    let options = config.connect_options()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(|e| ModelError::Connection(format!("Failed to connect to {}: {}", config.url, e)))?;

    tracing::debug!(url = %config.url, "Connected to database");
    Ok(pool)
}

/// Shorthand for [`connect`] with default settings
pub async fn connect_url(url: &str) -> ModelResult<SqlitePool> {
    connect(&DatabaseConfig::new(url)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_sqlite_urls() {
        let config = DatabaseConfig::new("postgres://localhost/app");
        let err = config.connect_options().unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn test_max_connections_floor() {
        assert_eq!(DatabaseConfig::new("sqlite::memory:").with_max_connections(0).max_connections, 1);
    }

    #[tokio::test]
    async fn test_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");
        let url = format!("sqlite://{}", path.display());

        let pool = connect_url(&url).await.unwrap();
        sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        pool.close().await;

        assert!(path.exists());
    }
}
