pub mod migrate;
pub mod offline;
pub mod revision;
pub mod status;

use lineage_core::{ConfigError, LineageError, LineageResult, MigrationsFile};
use lineage_orm::{MigrationContext, ModuleRegistry, RevisionTarget};
use std::path::Path;

/// Loaded configuration file plus the registered plugin environments
pub struct Project {
    file: MigrationsFile,
    registry: ModuleRegistry,
}

impl Project {
    pub fn load(config: Option<&Path>) -> LineageResult<Self> {
        let path = MigrationsFile::locate(config);
        tracing::debug!(config = %path.display(), "Loading configuration");
        Self::new(MigrationsFile::load(&path)?, lineage_plugins::registry()?)
    }

    pub fn new(file: MigrationsFile, registry: ModuleRegistry) -> LineageResult<Self> {
        registry.validate_sections(&file)?;
        Ok(Self { file, registry })
    }

    pub fn file(&self) -> &MigrationsFile {
        &self.file
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Migration context for the module selected with `--name`
    pub fn context(&self, name: Option<&str>) -> LineageResult<MigrationContext> {
        let name = name.ok_or_else(|| {
            ConfigError::missing_required(
                "--name",
                format!(
                    "Pick a module: {}",
                    self.file.module_names().collect::<Vec<_>>().join(", ")
                ),
            )
        })?;

        let section = self
            .file
            .section(name)
            .map_err(|_| LineageError::unknown_module(name, self.file.module_names()))?;
        let env = self
            .registry
            .get(name)
            .ok_or_else(|| LineageError::unknown_module(name, self.registry.names()))?;

        Ok(MigrationContext::configure(section, env)?)
    }
}

pub(crate) fn parse_target(value: &str) -> LineageResult<RevisionTarget> {
    Ok(value.parse::<RevisionTarget>()?)
}

pub(crate) fn display_revision(revision: Option<&str>) -> &str {
    revision.unwrap_or("<base>")
}
