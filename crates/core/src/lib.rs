//! # lineage-core
//!
//! Shared foundation for the lineage workspace: the named-section migrations
//! configuration file, configuration validation errors, the top-level error
//! type and structured logging setup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ConfigError, ConfigSource, MigrationsFile, ModuleSection, CONFIG_ENV_VAR};
pub use error::{LineageError, LineageResult};
pub use logging::{init_logging, LoggingConfig};

