//! Named-section migrations configuration
//!
//! One file describes every module sharing the database. Each top-level
//! table is a module section:
//!
//! ```toml
//! [one]
//! url = "sqlite://app.db"
//! script_location = "one"
//!
//! [two]
//! url = "sqlite://app.db"
//! script_location = "two"
//! version_table = "alembic_version_two"
//! ```
//!
//! Relative paths (including relative SQLite database paths) are resolved
//! against the directory holding the configuration file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::sources::ConfigSource;
use super::validation::{is_valid_identifier, ConfigError};

/// Environment variable naming the configuration file when `--config` is absent
pub const CONFIG_ENV_VAR: &str = "LINEAGE_CONFIG";

/// Environment variable used for sections that omit `url`
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";

/// File looked up in the working directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = "lineage.toml";

/// Sub-directory of `script_location` holding revision files
pub const DEFAULT_VERSIONS_DIR: &str = "versions";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSection {
    url: Option<String>,
    script_location: Option<String>,
    version_locations: Option<String>,
    version_table: Option<String>,
}

/// A fully resolved module section
#[derive(Debug, Clone)]
pub struct ModuleSection {
    /// Section (module) name
    pub name: String,
    /// Database URL
    pub url: String,
    /// Where `url` came from
    pub url_source: ConfigSource,
    /// Module script directory
    pub script_location: PathBuf,
    /// Directory holding the module's revision files
    pub version_location: PathBuf,
    /// Optional override of the version table bound by the module environment
    pub version_table: Option<String>,
}

/// Parsed configuration file holding one section per module
#[derive(Debug, Clone)]
pub struct MigrationsFile {
    path: PathBuf,
    sections: BTreeMap<String, ModuleSection>,
}

impl MigrationsFile {
    /// Pick the configuration path: explicit flag, then `LINEAGE_CONFIG`, then `lineage.toml`
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }

    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::FileSystemError {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self::parse(&contents, path, &base_dir)
    }

    /// Parse configuration text; `path` is only used for messages
    pub fn parse(contents: &str, path: &Path, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: BTreeMap<String, RawSection> = toml::from_str(contents)?;

        if raw.is_empty() {
            return Err(ConfigError::validation_failed(format!(
                "{} defines no module sections",
                path.display()
            )));
        }

        let mut sections = BTreeMap::new();
        for (name, section) in raw {
            let resolved = resolve_section(&name, section, base_dir)?;
            tracing::debug!(
                module = %name,
                script_location = %resolved.script_location.display(),
                "Loaded module section"
            );
            sections.insert(name, resolved);
        }

        Ok(Self {
            path: path.to_path_buf(),
            sections,
        })
    }

    /// Path the configuration was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the section for a module
    pub fn section(&self, name: &str) -> Result<&ModuleSection, ConfigError> {
        self.sections
            .get(name)
            .ok_or_else(|| ConfigError::MissingSection {
                name: name.to_string(),
                path: self.path.display().to_string(),
            })
    }

    /// Names of all configured modules, sorted
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// All sections, sorted by module name
    pub fn sections(&self) -> impl Iterator<Item = &ModuleSection> {
        self.sections.values()
    }
}

fn resolve_section(
    name: &str,
    raw: RawSection,
    base_dir: &Path,
) -> Result<ModuleSection, ConfigError> {
    if !is_valid_identifier(name) {
        return Err(ConfigError::invalid_value(
            "section",
            name,
            "letters, digits and underscores",
        ));
    }

    let (url, url_source) = match raw.url {
        Some(url) if !url.trim().is_empty() => (url, ConfigSource::File(name.to_string())),
        _ => match env::var(DATABASE_URL_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => {
                (url, ConfigSource::EnvVar(DATABASE_URL_ENV_VAR.to_string()))
            }
            _ => {
                return Err(ConfigError::missing_required(
                    format!("{}.url", name),
                    format!("Set `url` in [{}] or export {}", name, DATABASE_URL_ENV_VAR),
                ))
            }
        },
    };

    let script_location = raw
        .script_location
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ConfigError::missing_required(
                format!("{}.script_location", name),
                "Point it at the module's migration directory",
            )
        })?;
    let script_location = resolve_path(base_dir, &script_location);

    let version_location = match raw.version_locations {
        Some(dir) if !dir.trim().is_empty() => resolve_path(base_dir, dir.trim()),
        _ => script_location.join(DEFAULT_VERSIONS_DIR),
    };

    if let Some(table) = &raw.version_table {
        if !is_valid_identifier(table) {
            return Err(ConfigError::invalid_value(
                format!("{}.version_table", name),
                table,
                "a plain SQL identifier",
            ));
        }
    }

    Ok(ModuleSection {
        name: name.to_string(),
        url: resolve_sqlite_url(base_dir, &url),
        url_source,
        script_location,
        version_location,
        version_table: raw.version_table,
    })
}

fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Anchor a relative `sqlite://` database path at the configuration directory
pub fn resolve_sqlite_url(base_dir: &Path, url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite://") else {
        return url.to_string();
    };

    let (file, query) = match rest.split_once('?') {
        Some((file, query)) => (file, Some(query)),
        None => (rest, None),
    };

    if file.is_empty() || file == ":memory:" || Path::new(file).is_absolute() {
        return url.to_string();
    }

    let anchored = base_dir.join(file);
    match query {
        Some(query) => format!("sqlite://{}?{}", anchored.display(), query),
        None => format!("sqlite://{}", anchored.display()),
    }
}
