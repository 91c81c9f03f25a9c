//! Migration System
//!
//! File-based revision lineages with a per-module, single-row version table,
//! online and offline execution, and autogenerate.

pub mod autogenerate;
pub mod definitions;
pub mod manager;
pub mod offline;
pub mod revisions;
pub mod rollback;
pub mod runner;
pub mod version_table;

pub use autogenerate::{
    compare_metadata, include_object, render_downgrade, render_upgrade, IncludeObject, ObjectKind,
    SchemaObject, SchemaOp,
};
pub use definitions::*;
pub use manager::MigrationManager;
pub use offline::OfflineScript;
pub use revisions::RevisionMap;
pub use rollback::MigrationRollback;
pub use runner::{history_with_status, MigrationRunner};
pub use version_table::VersionTable;
