//! Module environments
//!
//! A [`ModuleEnvironment`] binds one module's declared metadata, its version
//! table and its include-object filter. A [`MigrationContext`] joins an
//! environment with the module's configuration section and drives the
//! online and offline migration paths.

use lineage_core::config::is_valid_identifier;
use lineage_core::{ConfigError, MigrationsFile, ModuleSection};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::database::connect_url;
use crate::error::{OrmError, OrmResult};
use crate::migrations::{
    compare_metadata, include_object, render_downgrade, render_upgrade, IncludeObject,
    Migration, MigrationConfig, MigrationManager, MigrationRollback, MigrationRunResult,
    MigrationRunner, MigrationStatus, ObjectKind, OfflineScript, RevisionTarget,
    RollbackResult, SchemaObject, SchemaOp, DEFAULT_VERSION_TABLE,
};
use crate::schema::{Inspector, MetaData};

/// One module's binding of metadata, version table and filter
#[derive(Clone)]
pub struct ModuleEnvironment {
    name: String,
    metadata: MetaData,
    version_table: String,
    include_object: IncludeObject,
}

impl ModuleEnvironment {
    /// Environment using the default version table and foreign-table filter
    pub fn new(name: impl Into<String>, metadata: MetaData) -> Self {
        Self {
            name: name.into(),
            metadata,
            version_table: DEFAULT_VERSION_TABLE.to_string(),
            include_object: Arc::new(include_object),
        }
    }

    pub fn with_version_table(mut self, table: impl Into<String>) -> Self {
        self.version_table = table.into();
        self
    }

    /// Replace the include-object filter
    pub fn with_include_object<F>(mut self, filter: F) -> Self
    where
        F: Fn(&SchemaObject<'_>, &str, ObjectKind, bool, Option<&SchemaObject<'_>>) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.include_object = Arc::new(filter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    pub fn version_table(&self) -> &str {
        &self.version_table
    }

    pub fn include_object(&self) -> &IncludeObject {
        &self.include_object
    }
}

impl fmt::Debug for ModuleEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleEnvironment")
            .field("name", &self.name)
            .field("tables", &self.metadata.table_names())
            .field("version_table", &self.version_table)
            .finish()
    }
}

/// Registered module environments, by name
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleEnvironment>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an environment; names and version tables must be unique
    pub fn register(&mut self, env: ModuleEnvironment) -> OrmResult<&mut Self> {
        if self.modules.contains_key(env.name()) {
            return Err(OrmError::Configuration(format!(
                "Module '{}' is already registered",
                env.name()
            )));
        }
        if let Some(other) = self
            .modules
            .values()
            .find(|m| m.version_table() == env.version_table())
        {
            return Err(OrmError::Configuration(format!(
                "Modules '{}' and '{}' share version table {}",
                other.name(),
                env.name(),
                env.version_table()
            )));
        }
        self.modules.insert(env.name().to_string(), env);
        Ok(self)
    }

    /// Version table a section's module writes to: the section override, else the environment's
    pub fn effective_version_table<'a>(&'a self, section: &'a ModuleSection) -> Option<&'a str> {
        let env = self.get(&section.name)?;
        Some(section.version_table.as_deref().unwrap_or(env.version_table()))
    }

    /// Reject configuration that would point two modules at one version table
    pub fn validate_sections(&self, file: &MigrationsFile) -> Result<(), ConfigError> {
        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for section in file.sections() {
            let Some(table) = self.effective_version_table(section) else {
                continue;
            };
            if let Some(other) = owners.insert(table, section.name.as_str()) {
                return Err(ConfigError::invalid_value(
                    format!("{}.version_table", section.name),
                    table,
                    format!("a version table not already used by module '{}'", other),
                ));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModuleEnvironment> {
        self.modules.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A configuration section bound to its module environment
#[derive(Debug)]
pub struct MigrationContext {
    url: String,
    env: ModuleEnvironment,
    config: MigrationConfig,
}

impl MigrationContext {
    /// Join a section with an environment; the section may override the version table
    pub fn configure(section: &ModuleSection, env: &ModuleEnvironment) -> OrmResult<Self> {
        let version_table = section
            .version_table
            .clone()
            .unwrap_or_else(|| env.version_table().to_string());

        if !is_valid_identifier(&version_table) {
            return Err(OrmError::Configuration(format!(
                "Invalid version table name '{}'",
                version_table
            )));
        }

        let config = MigrationConfig::new(section.script_location.clone())
            .with_version_location(section.version_location.clone())
            .with_version_table(version_table);

        tracing::debug!(
            module = %env.name(),
            version_table = %config.version_table,
            versions = %config.version_location.display(),
            "Configured migration context"
        );

        Ok(Self {
            url: section.url.clone(),
            env: env.clone(),
            config,
        })
    }

    pub fn module(&self) -> &str {
        self.env.name()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn environment(&self) -> &ModuleEnvironment {
        &self.env
    }

    pub fn version_table(&self) -> &str {
        &self.config.version_table
    }

    pub fn manager(&self) -> MigrationManager {
        MigrationManager::with_config(self.config.clone())
    }

    /// Open the database and build a runner for this module
    pub async fn connect(&self) -> OrmResult<MigrationRunner> {
        MigrationRunner::from_url(self.manager(), &self.url).await
    }

    pub async fn upgrade(&self, target: &RevisionTarget) -> OrmResult<MigrationRunResult> {
        let runner = self.connect().await?;
        let result = runner.upgrade(target).await;
        runner.pool().close().await;
        result
    }

    pub async fn downgrade(&self, target: &RevisionTarget) -> OrmResult<RollbackResult> {
        let runner = self.connect().await?;
        let result = runner.downgrade(target).await;
        runner.pool().close().await;
        result
    }

    pub async fn current(&self) -> OrmResult<Option<String>> {
        let runner = self.connect().await?;
        let result = runner.current().await;
        runner.pool().close().await;
        result
    }

    pub async fn history(&self) -> OrmResult<Vec<(Migration, MigrationStatus)>> {
        let runner = self.connect().await?;
        let result = runner.history().await;
        runner.pool().close().await;
        result
    }

    pub async fn stamp(&self, target: &RevisionTarget) -> OrmResult<Option<String>> {
        let runner = self.connect().await?;
        let result = runner.stamp(target).await;
        runner.pool().close().await;
        result
    }

    /// Heads of the module's lineage
    pub fn heads(&self) -> OrmResult<Vec<Migration>> {
        let revisions = self.manager().load_revisions()?;
        Ok(revisions.heads().into_iter().cloned().collect())
    }

    /// Differences between the module's metadata and the live database
    pub async fn compare(&self) -> OrmResult<Vec<SchemaOp>> {
        let pool = connect_url(&self.url).await?;
        let reflected = Inspector::new(&pool).reflect().await;
        pool.close().await;

        let filter = self.env.include_object();
        Ok(compare_metadata(
            &reflected?,
            self.env.metadata(),
            self.version_table(),
            |object, name, kind, reflected, compare_to| filter(object, name, kind, reflected, compare_to),
        ))
    }

    /// Fail if autogenerate would produce any operations
    pub async fn check(&self) -> OrmResult<Vec<SchemaOp>> {
        self.ensure_up_to_date().await?;
        let ops = self.compare().await?;
        if ops.is_empty() {
            Ok(ops)
        } else {
            Err(OrmError::Migration(format!(
                "New upgrade operations detected: {}",
                ops.iter().map(SchemaOp::describe).collect::<Vec<_>>().join("; ")
            )))
        }
    }

    /// Create a new revision, optionally filled from autogenerate
    pub async fn revision(&self, message: &str, autogenerate: bool) -> OrmResult<(Migration, Vec<SchemaOp>)> {
        let ops = if autogenerate {
            self.ensure_up_to_date().await?;
            let ops = self.compare().await?;
            for op in &ops {
                tracing::info!(module = %self.module(), "{}", op.describe());
            }
            ops
        } else {
            Vec::new()
        };

        let migration = self.manager().create_migration(
            message,
            &render_upgrade(&ops),
            &render_downgrade(&ops),
        )?;
        Ok((migration, ops))
    }

    /// Offline upgrade script from `from` to `to`
    pub fn upgrade_sql(&self, from: &RevisionTarget, to: &RevisionTarget) -> OrmResult<String> {
        let revisions = self.manager().load_revisions()?;
        let start = revisions.resolve(from, None)?;
        let end = revisions.resolve(to, start.as_deref())?;
        OfflineScript::new(&revisions, self.version_table()).upgrade_sql(start.as_deref(), end.as_deref())
    }

    /// Offline downgrade script from `from` to `to`
    pub fn downgrade_sql(&self, from: &RevisionTarget, to: &RevisionTarget) -> OrmResult<String> {
        let revisions = self.manager().load_revisions()?;
        let start = revisions.resolve(from, None)?;
        let end = revisions.resolve(to, start.as_deref())?;
        OfflineScript::new(&revisions, self.version_table())
            .downgrade_sql(start.as_deref(), end.as_deref())
    }

    /// Autogenerate against an outdated database would re-propose applied changes
    async fn ensure_up_to_date(&self) -> OrmResult<()> {
        let head = self
            .manager()
            .load_revisions()?
            .head()?
            .map(|m| m.revision.clone());
        let current = self.current().await?;
        if current != head {
            return Err(OrmError::Migration(format!(
                "Target database is not up to date (current {}, head {})",
                current.as_deref().unwrap_or("base"),
                head.as_deref().unwrap_or("base")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType, Table};
    use lineage_core::ConfigSource;
    use std::path::PathBuf;

    fn metadata(table: &str) -> MetaData {
        MetaData::new()
            .with_table(Table::new(table).column(Column::new("id", ColumnType::Integer).primary_key()))
    }

    fn section(version_table: Option<&str>) -> ModuleSection {
        ModuleSection {
            name: "one".to_string(),
            url: "sqlite::memory:".to_string(),
            url_source: ConfigSource::File("one".to_string()),
            script_location: PathBuf::from("one"),
            version_location: PathBuf::from("one/versions"),
            version_table: version_table.map(str::to_string),
        }
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleEnvironment::new("one", metadata("books")).with_version_table("v_one"))
            .unwrap();

        let same_name = ModuleEnvironment::new("one", metadata("books")).with_version_table("v_x");
        assert!(registry.register(same_name).is_err());

        let same_table = ModuleEnvironment::new("two", metadata("users")).with_version_table("v_one");
        assert!(registry.register(same_table).is_err());

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["one"]);
    }

    #[test]
    fn test_sections_cannot_share_version_tables() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(ModuleEnvironment::new("one", metadata("books")).with_version_table("v_one"))
            .unwrap()
            .register(ModuleEnvironment::new("two", metadata("users")).with_version_table("v_two"))
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineage.toml");
        let write = |contents: &str| {
            std::fs::write(&path, contents).unwrap();
            MigrationsFile::load(&path).unwrap()
        };

        let defaults = write(
            "[one]\nurl = \"sqlite://app.db\"\nscript_location = \"one\"\n\n\
             [two]\nurl = \"sqlite://app.db\"\nscript_location = \"two\"\n",
        );
        registry.validate_sections(&defaults).unwrap();
        let one = defaults.section("one").unwrap();
        assert_eq!(registry.effective_version_table(one), Some("v_one"));

        let clash = write(
            "[one]\nurl = \"sqlite://app.db\"\nscript_location = \"one\"\nversion_table = \"v_two\"\n\n\
             [two]\nurl = \"sqlite://app.db\"\nscript_location = \"two\"\n",
        );
        let err = registry.validate_sections(&clash).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("v_two"));

        let renamed = write(
            "[one]\nurl = \"sqlite://app.db\"\nscript_location = \"one\"\nversion_table = \"v_books\"\n\n\
             [two]\nurl = \"sqlite://app.db\"\nscript_location = \"two\"\n",
        );
        registry.validate_sections(&renamed).unwrap();
    }

    #[test]
    fn test_context_uses_environment_version_table() {
        let env = ModuleEnvironment::new("one", metadata("books")).with_version_table("alembic_version_one");
        let context = MigrationContext::configure(&section(None), &env).unwrap();
        assert_eq!(context.version_table(), "alembic_version_one");
        assert_eq!(context.config().version_location, PathBuf::from("one/versions"));
        assert_eq!(context.module(), "one");
    }

    #[test]
    fn test_section_overrides_version_table() {
        let env = ModuleEnvironment::new("one", metadata("books")).with_version_table("alembic_version_one");
        let context = MigrationContext::configure(&section(Some("one_versions")), &env).unwrap();
        assert_eq!(context.version_table(), "one_versions");

        let bad = MigrationContext::configure(&section(Some("bad name")), &env);
        assert!(bad.is_err());
    }

    #[test]
    fn test_custom_filter_is_used() {
        let env = ModuleEnvironment::new("one", metadata("books"))
            .with_include_object(|_, name, _, _, _| name != "books");
        let table = Table::new("books");
        let filter = env.include_object();
        assert!(!filter(&SchemaObject::Table(&table), "books", ObjectKind::Table, false, None));
    }
}
