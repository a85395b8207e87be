use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::lock::LockError;
use crate::countries::CountryError;
use crate::migration::MigrationError;

/// Result type for migrator operations
pub type MigratorResult<T> = Result<T, MigratorError>;

/// Error types for the migrator
#[derive(Error, Debug)]
pub enum MigratorError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Lock error: {0}")]
    LockError(#[from] LockError),

    #[error("Migration error: {0}")]
    MigrationError(#[from] MigrationError),

    #[error("Country list error: {0}")]
    CountryError(#[from] CountryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid database URI
    #[error("Invalid database URI: {0}")]
    DatabaseInvalidURIError(String),

    #[error("Logging setup error: {0}")]
    LoggingError(String),
}
