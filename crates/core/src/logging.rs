//! Structured logging setup shared by the CLI and tests

use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Environment filter (supports filters like "lineage_orm=debug,sqlx=warn")
    pub env_filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
            env_filter: Some("sqlx=warn".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Plain text logging at the given level
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Switch to JSON lines
    pub fn json(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Filter directive handed to `EnvFilter` when `RUST_LOG` is unset
    pub fn directive(&self) -> String {
        match &self.env_filter {
            Some(extra) if !extra.is_empty() => format!("{},{}", self.level, extra),
            _ => self.level.clone(),
        }
    }
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.directive()))?;

    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .json(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                Layer::new()
                    .with_writer(io::stderr)
                    .with_file(config.include_location)
                    .with_line_number(config.include_location)
                    .with_target(false),
            )
            .try_init()?;
    }

    tracing::debug!(level = %config.level, json = config.json_format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_combines_level_and_filter() {
        let config = LoggingConfig::with_level("debug");
        assert_eq!(config.directive(), "debug,sqlx=warn");

        let config = LoggingConfig {
            env_filter: None,
            ..LoggingConfig::with_level("warn")
        };
        assert_eq!(config.directive(), "warn");
    }

    #[test]
    fn test_json_toggle() {
        assert!(LoggingConfig::default().json(true).json_format);
        assert!(!LoggingConfig::default().json_format);
    }
}
