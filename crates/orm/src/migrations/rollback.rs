//! Migration Rollback - Handles rolling back applied migrations
//!
//! Provides downgrade to a target revision, executing DOWN statements in
//! reverse order inside one transaction.

use std::time::Instant;

use super::definitions::{MigrationDirection, RevisionTarget, RollbackResult};
use super::runner::{execute_migration, MigrationRunner};
use crate::error::{OrmError, OrmResult};

/// Extension trait for MigrationRunner to add rollback functionality
#[allow(async_fn_in_trait)]
pub trait MigrationRollback {
    /// Downgrade to `target` (`base`, a revision, or `-N`)
    async fn downgrade(&self, target: &RevisionTarget) -> OrmResult<RollbackResult>;

    /// Rollback the most recently applied migration
    async fn rollback_last(&self) -> OrmResult<RollbackResult> {
        self.downgrade(&RevisionTarget::Relative(-1)).await
    }

    /// Rollback all applied migrations of the module
    async fn rollback_all(&self) -> OrmResult<RollbackResult> {
        self.downgrade(&RevisionTarget::Base).await
    }
}

impl MigrationRollback for MigrationRunner {
    async fn downgrade(&self, target: &RevisionTarget) -> OrmResult<RollbackResult> {
        let start_time = Instant::now();
        let revisions = self.manager().load_revisions()?;

        let mut transaction = self.begin().await?;
        let current = self.version_table().current(&mut transaction).await?;
        if let Some(rev) = &current {
            revisions.lookup(rev)?;
        }

        if matches!(target, RevisionTarget::Relative(steps) if *steps > 0) {
            return Err(OrmError::Migration(format!(
                "Relative downgrade target must be negative, got {}",
                target
            )));
        }
        let target_rev = revisions.resolve(target, current.as_deref())?;

        let path = revisions.downgrade_path(current.as_deref(), target_rev.as_deref())?;
        let mut rolled_back_migrations = Vec::with_capacity(path.len());

        for migration in path {
            tracing::info!(
                table = %self.version_table().name(),
                "Running downgrade {} -> {}, {}",
                migration.revision,
                migration.down_revision.as_deref().unwrap_or(""),
                migration.message
            );

            execute_migration(&mut transaction, migration, MigrationDirection::Down).await?;
            self.version_table()
                .set(
                    &mut transaction,
                    Some(migration.revision.as_str()),
                    migration.down_revision.as_deref(),
                )
                .await?;

            rolled_back_migrations.push(migration.revision.clone());
        }

        transaction
            .commit()
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to commit rollback: {}", e)))?;

        Ok(RollbackResult {
            rolled_back_count: rolled_back_migrations.len(),
            rolled_back_migrations,
            to_revision: target_rev,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }
}
