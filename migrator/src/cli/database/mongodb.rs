use clap::Args;

/// Parameters used to config MongoDB.
#[derive(Debug, Clone, Args)]
pub struct MongoDBCliArgs {
    /// The connection string to the MongoDB server.
    #[arg(env = "EXPORTS_MIGRATOR_MONGODB_CONNECTION_URL", long, default_value = Some("mongodb://localhost:27017"))]
    pub mongodb_connection_url: Option<String>,

    /// The name of the database.
    #[arg(env = "EXPORTS_MIGRATOR_DATABASE_NAME", long, default_value = Some("customs-declare-exports"))]
    pub mongodb_database_name: Option<String>,
}
