use lineage_core::{ConfigSource, LineageError};
use lineage_orm::{MigrationContext, MigrationStatus};

use super::{display_revision, Project};

pub async fn current(context: &MigrationContext) -> Result<(), LineageError> {
    let current = context.current().await?;
    let heads = context.heads()?;
    let is_head = heads
        .iter()
        .any(|m| Some(m.revision.as_str()) == current.as_deref());

    match current {
        Some(revision) if is_head => println!("{} (head)", revision),
        Some(revision) => println!("{}", revision),
        None => println!("{}", display_revision(None)),
    }
    Ok(())
}

pub async fn history(context: &MigrationContext) -> Result<(), LineageError> {
    let history = context.history().await?;

    println!("📋 {} ({})", context.module(), context.version_table());
    if history.is_empty() {
        println!("   No revisions found");
        return Ok(());
    }

    for (migration, status) in history.iter().rev() {
        let marker = match status {
            MigrationStatus::Current => "➡️ ",
            MigrationStatus::Applied => "✅",
            MigrationStatus::Pending => "⏳",
        };
        println!("   {} {}", marker, migration.summary());
    }
    println!("\n➡️  = current, ✅ = applied, ⏳ = pending");
    Ok(())
}

pub fn heads(context: &MigrationContext) -> Result<(), LineageError> {
    for head in context.heads()? {
        println!("{} (head)", head.revision);
    }
    Ok(())
}

pub fn list(project: &Project) -> Result<(), LineageError> {
    println!("📋 Modules in {}", project.file().path().display());
    for section in project.file().sections() {
        let Some(env) = project.registry().get(&section.name) else {
            println!("   {:<12} ⚠️  no registered environment", section.name);
            continue;
        };

        let (version_table, table_source) = match &section.version_table {
            Some(table) => (table.clone(), ConfigSource::File(section.name.clone())),
            None => (
                env.version_table().to_string(),
                ConfigSource::Module(section.name.clone()),
            ),
        };

        println!(
            "   {:<12} {:<24} {}",
            section.name,
            version_table,
            section.script_location.display()
        );
        println!("   {:<12} version table from {}", "", table_source);
        println!("   {:<12} url from {}", "", section.url_source);
    }
    Ok(())
}
