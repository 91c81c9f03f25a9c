//! Plugin `two`: user accounts

mod user;

pub use user::User;

use lineage_orm::{MetaData, Model, ModuleEnvironment};

pub const MODULE_NAME: &str = "two";
pub const VERSION_TABLE: &str = "alembic_version_two";

pub fn metadata() -> MetaData {
    MetaData::new().with_table(User::table())
}

pub fn environment() -> ModuleEnvironment {
    ModuleEnvironment::new(MODULE_NAME, metadata()).with_version_table(VERSION_TABLE)
}
