use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used across the workspace's outer layers
pub type LineageResult<T> = Result<T, LineageError>;

#[derive(Debug, Error)]
pub enum LineageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown module '{name}'. Known modules: {known}")]
    UnknownModule { name: String, known: String },

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Check failed: {0}")]
    Check(String),
}

impl LineageError {
    /// Build an unknown-module error listing the names that do exist
    pub fn unknown_module<I, S>(name: impl Into<String>, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known: Vec<String> = known.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::UnknownModule {
            name: name.into(),
            known: if known.is_empty() {
                "(none)".to_string()
            } else {
                known.join(", ")
            },
        }
    }
}
