//! Version table - single-row record of a module's applied revision
//!
//! Every module tracks its position in its own table, so one module's runs
//! never read or write another module's version.

use sqlx::{Row, Sqlite, Transaction};

use crate::error::{OrmError, OrmResult};

/// SQL for one module's version table
#[derive(Debug, Clone)]
pub struct VersionTable {
    name: String,
}

impl VersionTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// SQL to create the version tracking table
    pub fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                version_num VARCHAR(32) NOT NULL,\n    \
                CONSTRAINT {}_pkc PRIMARY KEY (version_num)\n\
            );",
            self.name, self.name
        )
    }

    /// SQL to read the recorded revision
    pub fn select_sql(&self) -> String {
        format!("SELECT version_num FROM {}", self.name)
    }

    /// SQL to record the first revision
    pub fn insert_sql(&self, revision: &str) -> String {
        format!(
            "INSERT INTO {} (version_num) VALUES ('{}');",
            self.name,
            escape(revision)
        )
    }

    /// SQL to move the recorded revision
    pub fn update_sql(&self, from: &str, to: &str) -> String {
        format!(
            "UPDATE {} SET version_num='{}' WHERE {}.version_num = '{}';",
            self.name,
            escape(to),
            self.name,
            escape(from)
        )
    }

    /// SQL to clear the recorded revision (back to base)
    pub fn delete_sql(&self, revision: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {}.version_num = '{}';",
            self.name,
            self.name,
            escape(revision)
        )
    }

    /// Statement moving the record from `from` to `to`, if any change is needed
    pub fn transition_sql(&self, from: Option<&str>, to: Option<&str>) -> Option<String> {
        match (from, to) {
            (None, None) => None,
            (None, Some(to)) => Some(self.insert_sql(to)),
            (Some(from), Some(to)) if from == to => None,
            (Some(from), Some(to)) => Some(self.update_sql(from, to)),
            (Some(from), None) => Some(self.delete_sql(from)),
        }
    }

    /// Create the table inside the given transaction
    pub async fn ensure(&self, tx: &mut Transaction<'_, Sqlite>) -> OrmResult<()> {
        sqlx::query(&self.create_sql())
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                OrmError::Migration(format!(
                    "Failed to create version table {}: {}",
                    self.name, e
                ))
            })?;
        Ok(())
    }

    /// Read the recorded revision; a missing table reads as base
    pub async fn current(&self, tx: &mut Transaction<'_, Sqlite>) -> OrmResult<Option<String>> {
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(&self.name)
            .fetch_optional(&mut **tx)
            .await?
            .is_some();
        if !exists {
            return Ok(None);
        }

        let rows = sqlx::query(&self.select_sql())
            .fetch_all(&mut **tx)
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to read {}: {}", self.name, e)))?;

        match rows.as_slice() {
            [] => Ok(None),
            [row] => Ok(Some(row.try_get::<String, _>("version_num").map_err(|e| {
                OrmError::Migration(format!("Failed to read version_num: {}", e))
            })?)),
            _ => Err(OrmError::Migration(format!(
                "Version table {} holds {} rows; expected at most one",
                self.name,
                rows.len()
            ))),
        }
    }

    /// Move the recorded revision inside the given transaction
    pub async fn set(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        from: Option<&str>,
        to: Option<&str>,
    ) -> OrmResult<()> {
        if let Some(sql) = self.transition_sql(from, to) {
            tracing::debug!(table = %self.name, sql = %sql, "Updating version table");
            sqlx::query(&sql).execute(&mut **tx).await.map_err(|e| {
                OrmError::Migration(format!("Failed to update {}: {}", self.name, e))
            })?;
        }
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::connect_url;

    #[test]
    fn test_sql_generation() {
        let table = VersionTable::new("alembic_version_one");
        let create = table.create_sql();
        assert!(create.contains("CREATE TABLE IF NOT EXISTS alembic_version_one"));
        assert!(create.contains("version_num VARCHAR(32) NOT NULL"));
        assert!(create.contains("CONSTRAINT alembic_version_one_pkc PRIMARY KEY (version_num)"));

        assert_eq!(
            table.transition_sql(None, Some("aaa")).unwrap(),
            "INSERT INTO alembic_version_one (version_num) VALUES ('aaa');"
        );
        assert_eq!(
            table.transition_sql(Some("aaa"), Some("bbb")).unwrap(),
            "UPDATE alembic_version_one SET version_num='bbb' WHERE alembic_version_one.version_num = 'aaa';"
        );
        assert_eq!(
            table.transition_sql(Some("bbb"), None).unwrap(),
            "DELETE FROM alembic_version_one WHERE alembic_version_one.version_num = 'bbb';"
        );
        assert!(table.transition_sql(Some("aaa"), Some("aaa")).is_none());
        assert!(table.transition_sql(None, None).is_none());
    }

    #[tokio::test]
    async fn test_round_trip_in_transaction() {
        let pool = connect_url("sqlite::memory:").await.unwrap();
        let table = VersionTable::new("alembic_version_two");

        let mut tx = pool.begin().await.unwrap();
        assert_eq!(table.current(&mut tx).await.unwrap(), None);

        table.ensure(&mut tx).await.unwrap();
        table.set(&mut tx, None, Some("aaa")).await.unwrap();
        table.set(&mut tx, Some("aaa"), Some("bbb")).await.unwrap();
        assert_eq!(table.current(&mut tx).await.unwrap().as_deref(), Some("bbb"));

        table.set(&mut tx, Some("bbb"), None).await.unwrap();
        assert_eq!(table.current(&mut tx).await.unwrap(), None);
        tx.commit().await.unwrap();
    }
}
