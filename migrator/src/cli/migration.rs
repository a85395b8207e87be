use clap::Args;

use crate::core::client::database::constant::{CHANGE_LOG_COLLECTION, LEGACY_CHANGE_LOG_COLLECTION};
use crate::core::client::lock::constant::{DEFAULT_LOCK_EXPIRY_SECONDS, LOCKS_COLLECTION};
use std::path::PathBuf;

/// Collections holding the change history and the migration lock.
#[derive(Debug, Clone, Args)]
pub struct CollectionCliArgs {
    /// Collection recording executed changesets.
    #[arg(env = "EXPORTS_MIGRATOR_CHANGE_LOG_COLLECTION", long, default_value = CHANGE_LOG_COLLECTION)]
    pub change_log_collection: String,

    /// Collection where Mongobee recorded the declarations change log. Read only.
    #[arg(
        env = "EXPORTS_MIGRATOR_LEGACY_CHANGE_LOG_COLLECTION",
        long,
        default_value = LEGACY_CHANGE_LOG_COLLECTION
    )]
    pub legacy_change_log_collection: String,

    /// Collection holding the migration lock.
    #[arg(env = "EXPORTS_MIGRATOR_LOCK_COLLECTION", long, default_value = LOCKS_COLLECTION)]
    pub lock_collection: String,
}

/// Parameters controlling how changesets are tracked and executed.
#[derive(Debug, Clone, Args)]
pub struct MigrationCliArgs {
    #[clap(flatten)]
    pub collection_args: CollectionCliArgs,

    /// How long the migration lock stays valid without being extended, in seconds.
    #[arg(env = "EXPORTS_MIGRATOR_LOCK_EXPIRY_SECONDS", long, default_value_t = DEFAULT_LOCK_EXPIRY_SECONDS)]
    pub lock_expiry_seconds: u64,

    /// JSON file with `countryName`/`countryCode` pairs replacing the embedded list.
    #[arg(env = "EXPORTS_MIGRATOR_COUNTRIES_FILE", long, value_name = "PATH")]
    pub countries_file: Option<PathBuf>,

    /// Compute and log every update without writing anything.
    #[arg(env = "EXPORTS_MIGRATOR_DRY_RUN", long, default_value_t = false)]
    pub dry_run: bool,
}
