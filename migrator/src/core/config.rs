use std::sync::Arc;

use mongodb::Database;
use tracing::{debug, info};

use crate::cli::{RunCmd, StatusCmd};
use crate::core::client::{DatabaseClient, LockClient, MongoDbClient, MongoLockClient};
use crate::countries::CountryCatalogue;
use crate::types::params::{DatabaseArgs, MigrationParams};
use crate::MigratorResult;

/// Everything a migration run needs, built once from the command line.
pub struct Config {
    /// Validated run parameters
    params: MigrationParams,
    /// The database client
    database: Box<dyn DatabaseClient>,
    /// Migration lock
    lock: Box<dyn LockClient>,
    /// Country names and codes
    countries: CountryCatalogue,
}

impl Config {
    /// Connect to MongoDB and load the country list
    pub async fn setup(run_cmd: &RunCmd) -> MigratorResult<Self> {
        let db_args = DatabaseArgs::try_from(run_cmd.mongodb_args.clone())?;
        let params = MigrationParams::try_from(run_cmd.migration_args.clone())?;

        let mongo = MongoDbClient::new(&db_args).await?;
        mongo.health_check().await?;
        let lock = Self::build_lock_client(mongo.database(), &params);
        let database = Self::build_database_client(mongo);
        let countries = CountryCatalogue::load(params.countries_file.as_deref())?;

        info!(
            database = %db_args.database_name,
            change_log_collection = %params.change_log_collection,
            legacy_change_log_collection = %params.legacy_change_log_collection,
            countries = countries.len(),
            dry_run = params.dry_run,
            "Configuration loaded"
        );

        Ok(Self { params, database, lock, countries })
    }

    /// Connect to MongoDB for reading the change history; no country file is read.
    pub async fn setup_status(status_cmd: &StatusCmd) -> MigratorResult<Self> {
        let db_args = DatabaseArgs::try_from(status_cmd.mongodb_args.clone())?;
        let params = MigrationParams::read_only(status_cmd.collection_args.clone())?;

        let mongo = MongoDbClient::new(&db_args).await?;
        mongo.health_check().await?;
        let lock = Self::build_lock_client(mongo.database(), &params);
        let database = Self::build_database_client(mongo);
        let countries = CountryCatalogue::embedded()?;

        debug!(
            database = %db_args.database_name,
            change_log_collection = %params.change_log_collection,
            legacy_change_log_collection = %params.legacy_change_log_collection,
            "Status configuration loaded"
        );

        Ok(Self { params, database, lock, countries })
    }

    pub fn new(
        params: MigrationParams,
        database: Box<dyn DatabaseClient>,
        lock: Box<dyn LockClient>,
        countries: CountryCatalogue,
    ) -> Self {
        Self { params, database, lock, countries }
    }

    fn build_database_client(client: MongoDbClient) -> Box<dyn DatabaseClient> {
        Box::new(client)
    }

    fn build_lock_client(database: Arc<Database>, params: &MigrationParams) -> Box<dyn LockClient> {
        Box::new(MongoLockClient::new(database, params.lock_collection.clone()))
    }

    pub fn params(&self) -> &MigrationParams {
        &self.params
    }

    pub fn database(&self) -> &dyn DatabaseClient {
        self.database.as_ref()
    }

    pub fn lock(&self) -> &dyn LockClient {
        self.lock.as_ref()
    }

    pub fn countries(&self) -> &CountryCatalogue {
        &self.countries
    }
}
