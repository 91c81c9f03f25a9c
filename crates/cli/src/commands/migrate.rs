use lineage_core::LineageError;
use lineage_orm::MigrationContext;

use super::{display_revision, parse_target};

pub async fn upgrade(context: &MigrationContext, target: &str) -> Result<(), LineageError> {
    let target = parse_target(target)?;
    let result = context.upgrade(&target).await?;

    if result.is_noop() {
        println!(
            "✅ {} is already at {}",
            context.module(),
            display_revision(result.to_revision.as_deref())
        );
        return Ok(());
    }

    println!(
        "✅ Upgraded {} {} -> {} ({} migration(s), {}ms)",
        context.module(),
        display_revision(result.from_revision.as_deref()),
        display_revision(result.to_revision.as_deref()),
        result.applied_count,
        result.execution_time_ms
    );
    for revision in &result.applied_migrations {
        println!("   ↑ {}", revision);
    }
    Ok(())
}

pub async fn downgrade(context: &MigrationContext, target: &str) -> Result<(), LineageError> {
    let target = parse_target(target)?;
    let result = context.downgrade(&target).await?;

    if result.rolled_back_count == 0 {
        println!(
            "✅ {} is already at {}",
            context.module(),
            display_revision(result.to_revision.as_deref())
        );
        return Ok(());
    }

    println!(
        "✅ Downgraded {} to {} ({} migration(s), {}ms)",
        context.module(),
        display_revision(result.to_revision.as_deref()),
        result.rolled_back_count,
        result.execution_time_ms
    );
    for revision in &result.rolled_back_migrations {
        println!("   ↓ {}", revision);
    }
    Ok(())
}

pub async fn stamp(context: &MigrationContext, target: &str) -> Result<(), LineageError> {
    let target = parse_target(target)?;
    let stamped = context.stamp(&target).await?;
    println!(
        "✅ Stamped {} ({}) at {}",
        context.module(),
        context.version_table(),
        display_revision(stamped.as_deref())
    );
    Ok(())
}
