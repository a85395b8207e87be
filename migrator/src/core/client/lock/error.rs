use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Lock '{key}' is not held by '{owner}'")]
    LockNotOwned { key: String, owner: String },

    #[error("Invalid lock expiry: {0} seconds")]
    InvalidExpiry(u64),

    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),
}
