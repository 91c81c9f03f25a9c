//! Error types for the ORM and migration toolkit

use std::fmt;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Model not found in database
    NotFound(String),
    /// Model validation failed
    Validation(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Migration error
    Migration(String),
    /// Connection error
    Connection(String),
    /// Schema error
    Schema(String),
    /// Configuration error
    Configuration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::NotFound(what) => write!(f, "Record not found: {}", what),
            ModelError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Migration(msg) => write!(f, "Migration error: {}", msg),
            ModelError::Connection(msg) => write!(f, "Connection error: {}", msg),
            ModelError::Schema(msg) => write!(f, "Schema error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<lineage_core::ConfigError> for ModelError {
    fn from(err: lineage_core::ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

impl From<ModelError> for lineage_core::LineageError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Database(msg) | ModelError::Connection(msg) => {
                lineage_core::LineageError::Database(msg)
            }
            ModelError::Migration(msg) => lineage_core::LineageError::Migration(msg),
            ModelError::Configuration(msg) => {
                lineage_core::LineageError::Config(lineage_core::ConfigError::validation_failed(msg))
            }
            other => lineage_core::LineageError::Migration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            ModelError::Migration("Multiple heads".to_string()).to_string(),
            "Migration error: Multiple heads"
        );
        assert_eq!(
            ModelError::NotFound("books(7)".to_string()).to_string(),
            "Record not found: books(7)"
        );
    }

    #[test]
    fn test_into_lineage_error() {
        let err: lineage_core::LineageError = ModelError::Database("locked".to_string()).into();
        assert!(matches!(err, lineage_core::LineageError::Database(_)));

        let err: lineage_core::LineageError = ModelError::Schema("bad".to_string()).into();
        assert!(matches!(err, lineage_core::LineageError::Migration(_)));

        let err: lineage_core::LineageError = ModelError::Migration("Multiple heads".to_string()).into();
        assert_eq!(err.to_string(), "Migration error: Multiple heads");

        let err: lineage_core::LineageError = ModelError::Configuration("bad table".to_string()).into();
        assert!(matches!(err, lineage_core::LineageError::Config(_)));
    }
}
