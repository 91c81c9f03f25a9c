//! # lineage-plugins
//!
//! Two independent plugins that share one database. Each declares its own
//! tables and binds its own version table:
//!
//! | module | tables  | version table         |
//! |--------|---------|-----------------------|
//! | `one`  | `books` | `alembic_version_one` |
//! | `two`  | `users` | `alembic_version_two` |

use lineage_orm::{ModelResult, ModuleRegistry};

pub mod one;
pub mod two;

/// Registry holding every plugin's environment
pub fn registry() -> ModelResult<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    registry.register(one::environment())?;
    registry.register(two::environment())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_both_plugins() {
        let registry = registry().unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["one", "two"]);
        assert_eq!(registry.get("one").unwrap().version_table(), "alembic_version_one");
        assert_eq!(registry.get("two").unwrap().version_table(), "alembic_version_two");
    }
}
