//! Offline mode - render a migration run as a SQL script
//!
//! No database connection is made, so the starting revision has to be given
//! by the caller (`base` for a fresh database).

use super::definitions::{Migration, MigrationDirection};
use super::revisions::RevisionMap;
use super::version_table::VersionTable;
use crate::error::OrmResult;

/// Renders upgrade and downgrade scripts for one module
pub struct OfflineScript<'a> {
    revisions: &'a RevisionMap,
    version_table: VersionTable,
}

impl<'a> OfflineScript<'a> {
    pub fn new(revisions: &'a RevisionMap, version_table: impl Into<String>) -> Self {
        Self {
            revisions,
            version_table: VersionTable::new(version_table),
        }
    }

    /// Script moving the database from `from` up to `to`
    pub fn upgrade_sql(&self, from: Option<&str>, to: Option<&str>) -> OrmResult<String> {
        let path = self.revisions.upgrade_path(from, to)?;

        let mut out = String::from("BEGIN TRANSACTION;\n\n");
        out.push_str(&self.version_table.create_sql());
        out.push_str("\n\n");

        let mut position = from.map(str::to_string);
        for migration in path {
            push_step(&mut out, migration, MigrationDirection::Up, position.as_deref());
            if let Some(sql) = self
                .version_table
                .transition_sql(position.as_deref(), Some(&migration.revision))
            {
                out.push_str(&sql);
                out.push_str("\n\n");
            }
            position = Some(migration.revision.clone());
        }

        out.push_str("COMMIT;\n");
        Ok(out)
    }

    /// Script moving the database from `from` down to `to`
    pub fn downgrade_sql(&self, from: Option<&str>, to: Option<&str>) -> OrmResult<String> {
        let path = self.revisions.downgrade_path(from, to)?;

        let mut out = String::from("BEGIN TRANSACTION;\n\n");
        for migration in path {
            push_step(
                &mut out,
                migration,
                MigrationDirection::Down,
                migration.down_revision.as_deref(),
            );
            if let Some(sql) = self.version_table.transition_sql(
                Some(&migration.revision),
                migration.down_revision.as_deref(),
            ) {
                out.push_str(&sql);
                out.push_str("\n\n");
            }
        }

        out.push_str("COMMIT;\n");
        Ok(out)
    }
}

fn push_step(out: &mut String, migration: &Migration, direction: MigrationDirection, other: Option<&str>) {
    let (label, sql) = match direction {
        MigrationDirection::Up => (
            format!(
                "-- Running upgrade {} -> {}",
                other.unwrap_or(""),
                migration.revision
            ),
            &migration.up_sql,
        ),
        MigrationDirection::Down => (
            format!(
                "-- Running downgrade {} -> {}",
                migration.revision,
                other.unwrap_or("")
            ),
            &migration.down_sql,
        ),
    };

    out.push_str(&label);
    out.push('\n');
    let sql = sql.trim();
    if !sql.is_empty() {
        out.push_str(sql);
        if !sql.ends_with(';') {
            out.push(';');
        }
        out.push_str("\n\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn revisions() -> RevisionMap {
        let create = Migration {
            revision: "aaa".to_string(),
            down_revision: None,
            message: "create books".to_string(),
            up_sql: "CREATE TABLE books (id INTEGER NOT NULL, PRIMARY KEY (id));".to_string(),
            down_sql: "DROP TABLE books".to_string(),
            created_at: Utc::now(),
            path: Default::default(),
        };
        let alter = Migration {
            revision: "bbb".to_string(),
            down_revision: Some("aaa".to_string()),
            message: "add title".to_string(),
            up_sql: "ALTER TABLE books ADD COLUMN title VARCHAR(30);".to_string(),
            down_sql: "ALTER TABLE books DROP COLUMN title;".to_string(),
            created_at: Utc::now(),
            path: Default::default(),
        };
        RevisionMap::new(vec![create, alter]).unwrap()
    }

    #[test]
    fn test_upgrade_script_from_base() {
        let revisions = revisions();
        let script = OfflineScript::new(&revisions, "alembic_version_one");
        let sql = script.upgrade_sql(None, Some("bbb")).unwrap();

        assert!(sql.starts_with("BEGIN TRANSACTION;"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS alembic_version_one"));
        assert!(sql.contains("-- Running upgrade  -> aaa"));
        assert!(sql.contains("INSERT INTO alembic_version_one (version_num) VALUES ('aaa');"));
        assert!(sql.contains("-- Running upgrade aaa -> bbb"));
        assert!(sql.contains("UPDATE alembic_version_one SET version_num='bbb'"));
        assert!(sql.trim_end().ends_with("COMMIT;"));
        assert!(!sql.contains("alembic_version_two"));

        let create = sql.find("CREATE TABLE books").unwrap();
        let alter = sql.find("ALTER TABLE books ADD COLUMN").unwrap();
        assert!(create < alter);
    }

    #[test]
    fn test_downgrade_script() {
        let revisions = revisions();
        let script = OfflineScript::new(&revisions, "alembic_version_one");
        let sql = script.downgrade_sql(Some("bbb"), None).unwrap();

        assert!(sql.contains("-- Running downgrade bbb -> aaa"));
        assert!(sql.contains("DROP TABLE books;"));
        assert!(sql.contains("DELETE FROM alembic_version_one"));
        let drop_column = sql.find("DROP COLUMN title").unwrap();
        let drop_table = sql.find("DROP TABLE books").unwrap();
        assert!(drop_column < drop_table);
    }

    #[test]
    fn test_noop_range() {
        let revisions = revisions();
        let script = OfflineScript::new(&revisions, "alembic_version_one");
        let sql = script.upgrade_sql(Some("bbb"), Some("bbb")).unwrap();
        assert!(!sql.contains("Running upgrade"));
    }
}
