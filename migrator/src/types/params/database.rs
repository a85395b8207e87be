use crate::cli::database::mongodb::MongoDBCliArgs;
use crate::error::{MigratorError, MigratorResult};

/// Validated MongoDB parameters
#[derive(Debug, Clone)]
pub struct DatabaseArgs {
    pub connection_uri: String,
    pub database_name: String,
}

impl TryFrom<MongoDBCliArgs> for DatabaseArgs {
    type Error = MigratorError;

    fn try_from(args: MongoDBCliArgs) -> MigratorResult<Self> {
        let connection_uri = args
            .mongodb_connection_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| MigratorError::ConfigError("MongoDB connection url is required".to_string()))?;
        if !connection_uri.starts_with("mongodb://") && !connection_uri.starts_with("mongodb+srv://") {
            return Err(MigratorError::DatabaseInvalidURIError(connection_uri));
        }
        let database_name = args
            .mongodb_database_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| MigratorError::ConfigError("MongoDB database name is required".to_string()))?;
        Ok(Self { connection_uri, database_name })
    }
}
