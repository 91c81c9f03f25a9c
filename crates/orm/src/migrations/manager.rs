//! Migration Manager - File system operations for migrations
//!
//! Handles creating, loading, and parsing a module's revision files.
//!
//! A revision file looks like:
//!
//! ```sql
//! -- Migration: create books table
//! -- Revision: 3f1c0a9be2d4
//! -- Revises:
//! -- Create Date: 2024-01-01 12:00:00 UTC
//!
//! -- Up migration
//! CREATE TABLE books (id INTEGER NOT NULL, PRIMARY KEY (id));
//!
//! -- Down migration
//! DROP TABLE books;
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::definitions::{Migration, MigrationConfig, REVISION_ID_LEN};
use super::revisions::RevisionMap;
use crate::error::{OrmError, OrmResult};

const CREATE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(PartialEq)]
enum Section {
    Header,
    Up,
    Down,
}

/// Migration manager for creating and loading one module's revisions
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Create a new revision file on top of the current head
    ///
    /// Empty SQL bodies produce the usual placeholder comments.
    pub fn create_migration(
        &self,
        message: &str,
        up_sql: &str,
        down_sql: &str,
    ) -> OrmResult<Migration> {
        let revisions = self.load_revisions()?;
        let down_revision = match revisions.heads().as_slice() {
            [] => None,
            [head] => Some(head.revision.clone()),
            heads => {
                return Err(OrmError::Migration(format!(
                    "Multiple heads present ({}); cannot create a new revision",
                    heads
                        .iter()
                        .map(|m| m.revision.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        };

        fs::create_dir_all(&self.config.version_location).map_err(|e| {
            OrmError::Migration(format!("Failed to create versions directory: {}", e))
        })?;

        let revision = generate_revision_id();
        let filename = format!("{}_{}.sql", revision, slugify(message));
        let filepath = self.config.version_location.join(&filename);
        let created_at = Utc::now();

        let template = self.create_migration_template(
            message,
            &revision,
            down_revision.as_deref(),
            created_at,
            up_sql,
            down_sql,
        );

        fs::write(&filepath, template)
            .map_err(|e| OrmError::Migration(format!("Failed to write migration file: {}", e)))?;

        tracing::info!(revision = %revision, file = %filepath.display(), "Generated revision");

        Ok(Migration {
            revision,
            down_revision,
            message: message.to_string(),
            up_sql: up_sql.trim().to_string(),
            down_sql: down_sql.trim().to_string(),
            created_at,
            path: filepath,
        })
    }

    /// Load all revision files, in file-name order
    pub fn load_migrations(&self) -> OrmResult<Vec<Migration>> {
        let dir = &self.config.version_location;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let entries = fs::read_dir(dir)
            .map_err(|e| OrmError::Migration(format!("Failed to read versions directory: {}", e)))?;

        for entry in entries {
            let entry = entry
                .map_err(|e| OrmError::Migration(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "sql") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut seen = HashSet::new();
        let mut migrations = Vec::with_capacity(paths.len());
        for path in paths {
            let migration = self.parse_migration_file(&path)?;
            if !seen.insert(migration.revision.clone()) {
                return Err(OrmError::Migration(format!(
                    "Duplicate revision {} in {}",
                    migration.revision,
                    path.display()
                )));
            }
            migrations.push(migration);
        }

        Ok(migrations)
    }

    /// Load revisions and link them into the module's lineage
    pub fn load_revisions(&self) -> OrmResult<RevisionMap> {
        RevisionMap::new(self.load_migrations()?)
    }

    /// Parse a revision file into a Migration struct
    pub fn parse_migration_file(&self, path: &Path) -> OrmResult<Migration> {
        let content = fs::read_to_string(path)
            .map_err(|e| OrmError::Migration(format!("Failed to read migration file: {}", e)))?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| OrmError::Migration("Invalid migration filename".to_string()))?;

        let mut migration = self.parse_migration_content(&content)?;
        migration.path = path.to_path_buf();

        if migration.revision.is_empty() {
            // Fall back to the filename prefix: <revision>_<slug>.sql
            migration.revision = stem.split('_').next().unwrap_or(stem).to_string();
        }
        if migration.revision.is_empty() {
            return Err(OrmError::Migration(format!(
                "Migration file {} has no revision id",
                path.display()
            )));
        }
        if migration.message.is_empty() {
            migration.message = stem
                .split_once('_')
                .map(|(_, slug)| slug.replace('_', " "))
                .unwrap_or_default();
        }

        Ok(migration)
    }

    /// Parse header fields plus UP and DOWN sections
    fn parse_migration_content(&self, content: &str) -> OrmResult<Migration> {
        let mut migration = Migration {
            revision: String::new(),
            down_revision: None,
            message: String::new(),
            up_sql: String::new(),
            down_sql: String::new(),
            created_at: Utc::now(),
            path: Default::default(),
        };

        let mut up_sql = Vec::new();
        let mut down_sql = Vec::new();
        let mut current_section = Section::Header;

        for line in content.lines() {
            let trimmed = line.trim();
            let lowered = trimmed.to_lowercase();

            if lowered == "-- up migration" || lowered == "-- up" {
                current_section = Section::Up;
                continue;
            } else if lowered == "-- down migration" || lowered == "-- down" {
                current_section = Section::Down;
                continue;
            }

            if current_section == Section::Header {
                if let Some((key, value)) = trimmed
                    .strip_prefix("--")
                    .and_then(|rest| rest.split_once(':'))
                {
                    let value = value.trim();
                    match key.trim().to_lowercase().as_str() {
                        "migration" => migration.message = value.to_string(),
                        "revision" => migration.revision = value.to_string(),
                        "revises" => {
                            migration.down_revision = match value {
                                "" | "None" | "none" | "<base>" => None,
                                rev => Some(rev.to_string()),
                            }
                        }
                        "create date" => {
                            if let Ok(created) = parse_create_date(value) {
                                migration.created_at = created;
                            }
                        }
                        _ => {}
                    }
                }
                continue;
            }

            // Skip comment lines and empty lines
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }

            match current_section {
                Section::Up => up_sql.push(line),
                Section::Down => down_sql.push(line),
                Section::Header => {}
            }
        }

        migration.up_sql = up_sql.join("\n").trim().to_string();
        migration.down_sql = down_sql.join("\n").trim().to_string();
        Ok(migration)
    }

    /// Create revision file content
    fn create_migration_template(
        &self,
        message: &str,
        revision: &str,
        down_revision: Option<&str>,
        created_at: DateTime<Utc>,
        up_sql: &str,
        down_sql: &str,
    ) -> String {
        let up = if up_sql.trim().is_empty() {
            "-- Add your schema changes here".to_string()
        } else {
            up_sql.trim().to_string()
        };
        let down = if down_sql.trim().is_empty() {
            "-- Add rollback statements here".to_string()
        } else {
            down_sql.trim().to_string()
        };

        format!(
            "-- Migration: {}\n\
             -- Revision: {}\n\
             -- Revises: {}\n\
             -- Create Date: {} UTC\n\n\
             -- Up migration\n\
             {}\n\n\
             -- Down migration\n\
             {}\n",
            message,
            revision,
            down_revision.unwrap_or(""),
            created_at.format(CREATE_DATE_FORMAT),
            up,
            down
        )
    }

    /// Split SQL statements for execution using proper SQL parsing
    pub fn split_sql_statements(&self, sql: &str) -> OrmResult<Vec<String>> {
        split_sql_statements(sql)
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Split SQL into individual statements, falling back to `;` splitting
pub fn split_sql_statements(sql: &str) -> OrmResult<Vec<String>> {
    if sql.trim().is_empty() {
        return Ok(Vec::new());
    }

    let dialect = SQLiteDialect {};
    match Parser::parse_sql(&dialect, sql) {
        Ok(parsed_statements) => Ok(parsed_statements
            .into_iter()
            .map(|stmt| format!("{};", stmt))
            .collect()),
        Err(e) => {
            tracing::warn!("SQL parsing failed, using naive semicolon splitting: {}", e);
            Ok(sql
                .split(';')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| format!("{};", s))
                .collect())
        }
    }
}

/// Random 12-hex-digit revision id
pub fn generate_revision_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..REVISION_ID_LEN].to_string()
}

/// Filename-safe form of a revision message
pub fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    let mut last_underscore = true;
    for c in message.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            slug.push('_');
            last_underscore = true;
        }
        if slug.len() >= 40 {
            break;
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() {
        "revision".to_string()
    } else {
        slug
    }
}

fn parse_create_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim_end_matches("UTC").trim();
    let naive = NaiveDateTime::parse_from_str(value, CREATE_DATE_FORMAT)?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> MigrationManager {
        MigrationManager::with_config(
            MigrationConfig::new(dir.path().join("one")).with_version_table("alembic_version_one"),
        )
    }

    #[test]
    fn test_create_migration_chains_onto_head() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let first = manager
            .create_migration("create books table", "CREATE TABLE books (id INTEGER);", "DROP TABLE books;")
            .unwrap();
        assert_eq!(first.revision.len(), REVISION_ID_LEN);
        assert_eq!(first.down_revision, None);
        assert!(first.path.exists());
        assert!(first
            .path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_create_books_table.sql"));

        let second = manager.create_migration("add isbn", "", "").unwrap();
        assert_eq!(second.down_revision.as_deref(), Some(first.revision.as_str()));

        let content = fs::read_to_string(&second.path).unwrap();
        assert!(content.contains("-- Migration: add isbn"));
        assert!(content.contains("-- Up migration"));
        assert!(content.contains("-- Down migration"));
        assert!(content.contains("-- Add your schema changes here"));

        let loaded = manager.load_revisions().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.heads()[0].revision, second.revision);
    }

    #[test]
    fn test_load_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let versions = &manager.config().version_location;
        fs::create_dir_all(versions).unwrap();

        let first = "-- Migration: create books\n-- Revision: aaa111\n-- Revises:\n-- Create Date: 2024-01-01 12:00:00 UTC\n\n-- Up migration\nCREATE TABLE books (id INTEGER);\n\n-- Down migration\nDROP TABLE books;\n";
        let second = "-- Migration: setup migration marker\n-- Revision: bbb222\n-- Revises: aaa111\n\n-- Up migration\n-- comment only\nALTER TABLE books ADD COLUMN title VARCHAR(30);\n-- Down migration\nALTER TABLE books DROP COLUMN title;\n";

        fs::write(versions.join("aaa111_create_books.sql"), first).unwrap();
        fs::write(versions.join("bbb222_add_title.sql"), second).unwrap();
        fs::write(versions.join("README.txt"), "ignored").unwrap();

        let migrations = manager.load_migrations().unwrap();
        assert_eq!(migrations.len(), 2);
        assert_eq!(migrations[0].revision, "aaa111");
        assert_eq!(migrations[0].message, "create books");
        assert_eq!(migrations[0].created_at.format("%Y-%m-%d").to_string(), "2024-01-01");
        assert!(migrations[0].up_sql.contains("CREATE TABLE books"));
        assert!(migrations[0].down_sql.contains("DROP TABLE books"));

        assert_eq!(migrations[1].down_revision.as_deref(), Some("aaa111"));
        assert_eq!(migrations[1].message, "setup migration marker");
        assert_eq!(migrations[1].up_sql, "ALTER TABLE books ADD COLUMN title VARCHAR(30);");
    }

    #[test]
    fn test_revision_falls_back_to_filename() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let versions = &manager.config().version_location;
        fs::create_dir_all(versions).unwrap();
        let path = versions.join("c0ffee_create_users.sql");
        fs::write(&path, "-- Up migration\nCREATE TABLE users (id INTEGER);\n").unwrap();

        let migration = manager.parse_migration_file(&path).unwrap();
        assert_eq!(migration.revision, "c0ffee");
        assert_eq!(migration.message, "create users");
        assert_eq!(migration.down_sql, "");
    }

    #[test]
    fn test_duplicate_revisions_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        let versions = &manager.config().version_location;
        fs::create_dir_all(versions).unwrap();
        fs::write(versions.join("a_one.sql"), "-- Revision: same\n-- Up migration\n").unwrap();
        fs::write(versions.join("b_two.sql"), "-- Revision: same\n-- Up migration\n").unwrap();

        let err = manager.load_migrations().unwrap_err();
        assert!(err.to_string().contains("Duplicate revision same"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        assert!(manager.load_migrations().unwrap().is_empty());
    }

    #[test]
    fn test_split_sql_statements() {
        let statements = split_sql_statements(
            "CREATE TABLE books (id INTEGER NOT NULL, title VARCHAR(30), PRIMARY KEY (id));\nDROP TABLE users;",
        )
        .unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements[0].starts_with("CREATE TABLE books"));
        assert!(statements[1].ends_with(';'));
        assert!(split_sql_statements("  ").unwrap().is_empty());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Create Books table!"), "create_books_table");
        assert_eq!(slugify("  ??  "), "revision");
        assert!(slugify(&"x".repeat(100)).len() <= 40);
    }
}
