use crate::cli::migration::{CollectionCliArgs, MigrationCliArgs};
use crate::core::client::lock::constant::DEFAULT_LOCK_EXPIRY_SECONDS;
use crate::error::{MigratorError, MigratorResult};
use std::path::PathBuf;

/// Validated parameters of a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationParams {
    pub change_log_collection: String,
    pub legacy_change_log_collection: String,
    pub lock_collection: String,
    pub lock_expiry_seconds: u64,
    pub countries_file: Option<PathBuf>,
    pub dry_run: bool,
}

impl MigrationParams {
    /// Parameters for commands that only read the change history, such as `status`.
    pub fn read_only(args: CollectionCliArgs) -> MigratorResult<Self> {
        validate_collections(&args)?;
        Ok(Self {
            change_log_collection: args.change_log_collection,
            legacy_change_log_collection: args.legacy_change_log_collection,
            lock_collection: args.lock_collection,
            lock_expiry_seconds: DEFAULT_LOCK_EXPIRY_SECONDS,
            countries_file: None,
            dry_run: true,
        })
    }
}

impl TryFrom<MigrationCliArgs> for MigrationParams {
    type Error = MigratorError;

    fn try_from(args: MigrationCliArgs) -> MigratorResult<Self> {
        validate_collections(&args.collection_args)?;
        if args.lock_expiry_seconds == 0 {
            return Err(MigratorError::ConfigError("Lock expiry must be at least one second".to_string()));
        }
        let collections = args.collection_args;
        Ok(Self {
            change_log_collection: collections.change_log_collection,
            legacy_change_log_collection: collections.legacy_change_log_collection,
            lock_collection: collections.lock_collection,
            lock_expiry_seconds: args.lock_expiry_seconds,
            countries_file: args.countries_file,
            dry_run: args.dry_run,
        })
    }
}

fn validate_collections(args: &CollectionCliArgs) -> MigratorResult<()> {
    if args.change_log_collection.trim().is_empty() {
        return Err(MigratorError::ConfigError("Change log collection name must not be empty".to_string()));
    }
    if args.legacy_change_log_collection.trim().is_empty() {
        return Err(MigratorError::ConfigError("Legacy change log collection name must not be empty".to_string()));
    }
    if args.lock_collection.trim().is_empty() {
        return Err(MigratorError::ConfigError("Lock collection name must not be empty".to_string()));
    }
    if args.change_log_collection == args.lock_collection || args.legacy_change_log_collection == args.lock_collection
    {
        return Err(MigratorError::ConfigError(format!(
            "Change logs and lock must use different collections, lock set to '{}'",
            args.lock_collection
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::*;

    #[fixture]
    fn collection_args() -> CollectionCliArgs {
        CollectionCliArgs {
            change_log_collection: "mongockChangeLog".to_string(),
            legacy_change_log_collection: "dbchangelog".to_string(),
            lock_collection: "mongockLock".to_string(),
        }
    }

    #[fixture]
    fn cli_args(collection_args: CollectionCliArgs) -> MigrationCliArgs {
        MigrationCliArgs { collection_args, lock_expiry_seconds: 600, countries_file: None, dry_run: false }
    }

    #[rstest]
    fn valid_args_are_accepted(cli_args: MigrationCliArgs) {
        let params = MigrationParams::try_from(cli_args).unwrap();
        assert_eq!(params.change_log_collection, "mongockChangeLog");
        assert_eq!(params.legacy_change_log_collection, "dbchangelog");
        assert_eq!(params.lock_expiry_seconds, 600);
    }

    #[rstest]
    #[case::empty_change_log("", "dbchangelog", "mongockLock", 600)]
    #[case::empty_legacy_change_log("mongockChangeLog", "", "mongockLock", 600)]
    #[case::empty_lock("mongockChangeLog", "dbchangelog", " ", 600)]
    #[case::same_collection("migrations", "dbchangelog", "migrations", 600)]
    #[case::legacy_is_lock("mongockChangeLog", "locks", "locks", 600)]
    #[case::zero_expiry("mongockChangeLog", "dbchangelog", "mongockLock", 0)]
    fn invalid_args_are_rejected(
        mut cli_args: MigrationCliArgs,
        #[case] change_log: &str,
        #[case] legacy_change_log: &str,
        #[case] lock: &str,
        #[case] expiry: u64,
    ) {
        cli_args.collection_args.change_log_collection = change_log.to_string();
        cli_args.collection_args.legacy_change_log_collection = legacy_change_log.to_string();
        cli_args.collection_args.lock_collection = lock.to_string();
        cli_args.lock_expiry_seconds = expiry;
        assert_matches!(MigrationParams::try_from(cli_args), Err(MigratorError::ConfigError(_)));
    }

    #[rstest]
    fn read_only_params_never_write(collection_args: CollectionCliArgs) {
        let params = MigrationParams::read_only(collection_args).unwrap();
        assert!(params.dry_run);
        assert_eq!(params.countries_file, None);
        assert_eq!(params.legacy_change_log_collection, "dbchangelog");
    }

    #[rstest]
    fn read_only_params_validate_collections(mut collection_args: CollectionCliArgs) {
        collection_args.lock_collection = collection_args.change_log_collection.clone();
        assert_matches!(MigrationParams::read_only(collection_args), Err(MigratorError::ConfigError(_)));
    }
}
