//! Plugin `one`: a small book catalogue

mod book;

pub use book::Book;

use lineage_orm::{MetaData, Model, ModuleEnvironment};

pub const MODULE_NAME: &str = "one";
pub const VERSION_TABLE: &str = "alembic_version_one";

/// Tables declared by this plugin
pub fn metadata() -> MetaData {
    MetaData::new().with_table(Book::table())
}

pub fn environment() -> ModuleEnvironment {
    ModuleEnvironment::new(MODULE_NAME, metadata()).with_version_table(VERSION_TABLE)
}
