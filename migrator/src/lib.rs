//! Run-once MongoDB changesets for the customs declarations (exports) document store.

pub mod cli;
pub mod core;
pub mod countries;
pub mod error;
pub mod migration;
pub mod scripts;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod tests;

// Re-export commonly used item
pub use error::{MigratorError, MigratorResult};
