pub mod migrations_file;
pub mod sources;
pub mod validation;

pub use migrations_file::*;
pub use sources::*;
pub use validation::*;
