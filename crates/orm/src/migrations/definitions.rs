//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the fundamental types used throughout the migration system including
//! Migration, MigrationConfig and the revision targets accepted by upgrade and
//! downgrade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ModelError;

/// Version table used when a module does not bind its own
pub const DEFAULT_VERSION_TABLE: &str = "alembic_version";

/// Length of generated revision identifiers
pub const REVISION_ID_LEN: usize = 12;

/// Represents one migration script of a module's lineage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    /// Unique revision identifier
    pub revision: String,
    /// Parent revision, `None` for the first migration of the lineage
    pub down_revision: Option<String>,
    /// Human-readable message
    pub message: String,
    /// SQL statements to apply the migration
    pub up_sql: String,
    /// SQL statements to rollback the migration
    pub down_sql: String,
    /// When the migration was created
    pub created_at: DateTime<Utc>,
    /// File the migration was loaded from
    pub path: PathBuf,
}

impl Migration {
    /// `rev -> rev (message)` style line used by history output
    pub fn summary(&self) -> String {
        format!(
            "{} -> {}, {}",
            self.down_revision.as_deref().unwrap_or("<base>"),
            self.revision,
            self.message
        )
    }
}

/// Configuration for one module's migration lineage
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Module script directory
    pub script_location: PathBuf,
    /// Directory where revision files are stored
    pub version_location: PathBuf,
    /// Table name for tracking the applied revision
    pub version_table: String,
}

impl MigrationConfig {
    /// Config rooted at `script_location` with revisions under `versions/`
    pub fn new(script_location: impl Into<PathBuf>) -> Self {
        let script_location = script_location.into();
        Self {
            version_location: script_location.join("versions"),
            script_location,
            version_table: DEFAULT_VERSION_TABLE.to_string(),
        }
    }

    pub fn with_version_table(mut self, table: impl Into<String>) -> Self {
        self.version_table = table.into();
        self
    }

    pub fn with_version_location(mut self, dir: impl Into<PathBuf>) -> Self {
        self.version_location = dir.into();
        self
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::new("migrations")
    }
}

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationRunResult {
    /// Number of migrations that were applied
    pub applied_count: usize,
    /// Revisions that were applied, in order
    pub applied_migrations: Vec<String>,
    /// Revision recorded before the run
    pub from_revision: Option<String>,
    /// Revision recorded after the run
    pub to_revision: Option<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl MigrationRunResult {
    /// True when the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.applied_count == 0
    }
}

/// Result of rolling back migrations
#[derive(Debug)]
pub struct RollbackResult {
    /// Number of migrations that were rolled back
    pub rolled_back_count: usize,
    /// Revisions that were rolled back, newest first
    pub rolled_back_migrations: Vec<String>,
    /// Revision recorded after the run
    pub to_revision: Option<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Apply the migration (run UP statements)
    Up,
    /// Rollback the migration (run DOWN statements)
    Down,
}

/// Migration status relative to the recorded version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied,
    /// Migration is the currently recorded version
    Current,
}

/// Where an upgrade or downgrade should end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionTarget {
    /// Newest revision of the lineage
    Head,
    /// State before the first revision
    Base,
    /// Specific revision, by full id or unique prefix
    Revision(String),
    /// Steps relative to the current revision (`+2`, `-1`)
    Relative(i64),
}

impl FromStr for RevisionTarget {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "" => Err(ModelError::Migration("Empty revision target".to_string())),
            "head" | "heads" => Ok(RevisionTarget::Head),
            "base" => Ok(RevisionTarget::Base),
            _ if s.starts_with('+') || s.starts_with('-') => s
                .parse::<i64>()
                .map(RevisionTarget::Relative)
                .map_err(|_| ModelError::Migration(format!("Invalid relative revision '{}'", s))),
            _ => {
                if s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    Ok(RevisionTarget::Revision(s.to_string()))
                } else {
                    Err(ModelError::Migration(format!("Invalid revision '{}'", s)))
                }
            }
        }
    }
}

impl fmt::Display for RevisionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevisionTarget::Head => write!(f, "head"),
            RevisionTarget::Base => write!(f, "base"),
            RevisionTarget::Revision(rev) => write!(f, "{}", rev),
            RevisionTarget::Relative(n) => write!(f, "{:+}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_target_parsing() {
        assert_eq!("head".parse::<RevisionTarget>().unwrap(), RevisionTarget::Head);
        assert_eq!("base".parse::<RevisionTarget>().unwrap(), RevisionTarget::Base);
        assert_eq!("-1".parse::<RevisionTarget>().unwrap(), RevisionTarget::Relative(-1));
        assert_eq!("+2".parse::<RevisionTarget>().unwrap(), RevisionTarget::Relative(2));
        assert_eq!(
            "ae10".parse::<RevisionTarget>().unwrap(),
            RevisionTarget::Revision("ae10".to_string())
        );
        assert!("+x".parse::<RevisionTarget>().is_err());
        assert!("a;b".parse::<RevisionTarget>().is_err());
        assert_eq!(RevisionTarget::Relative(-1).to_string(), "-1");
    }

    #[test]
    fn test_config_defaults() {
        let config = MigrationConfig::new("one").with_version_table("alembic_version_one");
        assert_eq!(config.version_location, PathBuf::from("one/versions"));
        assert_eq!(config.version_table, "alembic_version_one");
        assert_eq!(MigrationConfig::default().version_table, DEFAULT_VERSION_TABLE);
    }
}
