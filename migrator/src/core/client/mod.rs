pub mod database;
pub mod lock;

pub use database::mongodb::MongoDbClient;
pub use database::DatabaseClient;
pub use lock::mongodb::MongoLockClient;
pub use lock::LockClient;
