use lineage_core::LineageError;
use lineage_orm::MigrationContext;

pub async fn create(context: &MigrationContext, message: &str, autogenerate: bool) -> Result<(), LineageError> {
    let (migration, ops) = context.revision(message, autogenerate).await?;

    if autogenerate {
        if ops.is_empty() {
            println!("ℹ️  No changes detected for {}", context.module());
        }
        for op in &ops {
            println!("   {}", op.describe());
        }
    }

    println!(
        "✅ Generating {} ... done",
        migration.path.display()
    );
    Ok(())
}

pub async fn check(context: &MigrationContext) -> Result<(), LineageError> {
    match context.check().await {
        Ok(_) => {
            println!("✅ No new upgrade operations detected for {}", context.module());
            Ok(())
        }
        Err(lineage_orm::ModelError::Migration(message)) => Err(LineageError::Check(message)),
        Err(e) => Err(e.into()),
    }
}
