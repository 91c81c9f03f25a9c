//! Migration Runner - Executes migrations against the database
//!
//! Handles the online execution path: moving a module's lineage up to a
//! target revision inside a single transaction, reading the recorded
//! version, listing history and stamping.

use sqlx::{Sqlite, SqlitePool, Transaction};
use std::time::Instant;

use super::definitions::{
    Migration, MigrationDirection, MigrationRunResult, MigrationStatus, RevisionTarget,
};
use super::manager::{split_sql_statements, MigrationManager};
use super::revisions::RevisionMap;
use super::version_table::VersionTable;
use crate::database::connect_url;
use crate::error::{OrmError, OrmResult};

/// Migration runner that executes one module's migrations against a database
pub struct MigrationRunner {
    manager: MigrationManager,
    pool: SqlitePool,
    version_table: VersionTable,
}

impl MigrationRunner {
    /// Create a new migration runner
    pub fn new(manager: MigrationManager, pool: SqlitePool) -> Self {
        let version_table = VersionTable::new(manager.config().version_table.clone());
        Self {
            manager,
            pool,
            version_table,
        }
    }

    /// Create a new migration runner from database URL
    pub async fn from_url(manager: MigrationManager, database_url: &str) -> OrmResult<Self> {
        let pool = connect_url(database_url).await?;
        Ok(Self::new(manager, pool))
    }

    /// Get the database pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    /// Get the module's version table
    pub fn version_table(&self) -> &VersionTable {
        &self.version_table
    }

    pub(crate) async fn begin(&self) -> OrmResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to start transaction: {}", e)))
    }

    /// Upgrade the module to `target`, applying every pending revision in one transaction
    pub async fn upgrade(&self, target: &RevisionTarget) -> OrmResult<MigrationRunResult> {
        let start_time = Instant::now();
        let revisions = self.manager.load_revisions()?;

        let mut transaction = self.begin().await?;
        self.version_table.ensure(&mut transaction).await?;

        let current = self.version_table.current(&mut transaction).await?;
        if let Some(rev) = &current {
            revisions.lookup(rev)?;
        }
        let target_rev = revisions.resolve(target, current.as_deref())?;

        let path = revisions.upgrade_path(current.as_deref(), target_rev.as_deref())?;
        let mut applied_migration_ids = Vec::with_capacity(path.len());
        let mut position = current.clone();

        for migration in path {
            tracing::info!(
                table = %self.version_table.name(),
                "Running upgrade {} -> {}, {}",
                position.as_deref().unwrap_or(""),
                migration.revision,
                migration.message
            );

            execute_migration(&mut transaction, migration, MigrationDirection::Up).await?;
            self.version_table
                .set(
                    &mut transaction,
                    position.as_deref(),
                    Some(migration.revision.as_str()),
                )
                .await?;

            position = Some(migration.revision.clone());
            applied_migration_ids.push(migration.revision.clone());
        }

        transaction
            .commit()
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to commit migration: {}", e)))?;

        if applied_migration_ids.is_empty() {
            tracing::info!(
                table = %self.version_table.name(),
                "Already at {}",
                position.as_deref().unwrap_or("base")
            );
        }

        Ok(MigrationRunResult {
            applied_count: applied_migration_ids.len(),
            applied_migrations: applied_migration_ids,
            from_revision: current,
            to_revision: position,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Revision recorded in the module's version table
    pub async fn current(&self) -> OrmResult<Option<String>> {
        let mut transaction = self.begin().await?;
        let current = self.version_table.current(&mut transaction).await?;
        transaction.rollback().await?;
        Ok(current)
    }

    /// Every revision of the lineage, base first, with its status
    pub async fn history(&self) -> OrmResult<Vec<(Migration, MigrationStatus)>> {
        let revisions = self.manager.load_revisions()?;
        let current = self.current().await?;
        history_with_status(&revisions, current.as_deref())
    }

    /// Record `target` as the current revision without running any SQL
    pub async fn stamp(&self, target: &RevisionTarget) -> OrmResult<Option<String>> {
        let revisions = self.manager.load_revisions()?;

        let mut transaction = self.begin().await?;
        self.version_table.ensure(&mut transaction).await?;
        let current = self.version_table.current(&mut transaction).await?;
        let target_rev = revisions.resolve(target, current.as_deref())?;

        self.version_table
            .set(&mut transaction, current.as_deref(), target_rev.as_deref())
            .await?;
        transaction
            .commit()
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to commit stamp: {}", e)))?;

        tracing::info!(
            table = %self.version_table.name(),
            "Stamped {} -> {}",
            current.as_deref().unwrap_or("base"),
            target_rev.as_deref().unwrap_or("base")
        );
        Ok(target_rev)
    }
}

/// Pair each revision with its status relative to `current`
pub fn history_with_status(
    revisions: &RevisionMap,
    current: Option<&str>,
) -> OrmResult<Vec<(Migration, MigrationStatus)>> {
    let applied: Vec<String> = revisions
        .downgrade_path(current, None)?
        .into_iter()
        .map(|m| m.revision.clone())
        .collect();

    Ok(revisions
        .iter()
        .map(|migration| {
            let status = if Some(migration.revision.as_str()) == current {
                MigrationStatus::Current
            } else if applied.contains(&migration.revision) {
                MigrationStatus::Applied
            } else {
                MigrationStatus::Pending
            };
            (migration.clone(), status)
        })
        .collect())
}

/// Run one direction of a migration inside the transaction
pub(crate) async fn execute_migration(
    transaction: &mut Transaction<'_, Sqlite>,
    migration: &Migration,
    direction: MigrationDirection,
) -> OrmResult<()> {
    let sql = match direction {
        MigrationDirection::Up => &migration.up_sql,
        MigrationDirection::Down => &migration.down_sql,
    };

    for statement in split_sql_statements(sql)? {
        if statement.trim().is_empty() {
            continue;
        }
        tracing::debug!(revision = %migration.revision, sql = %statement, "Executing statement");
        sqlx::query(&statement)
            .execute(&mut **transaction)
            .await
            .map_err(|e| {
                OrmError::Migration(format!(
                    "Failed to execute migration {}: {}",
                    migration.revision, e
                ))
            })?;
    }

    Ok(())
}
