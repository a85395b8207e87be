pub mod constant;
pub mod error;
pub mod mongodb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use error::LockError;
use serde::{Deserialize, Serialize};

/// Lock document as stored in the lock collection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LockInfo {
    pub _id: String, // Lock key
    pub owner: String,
    #[serde(with = "::mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

/// Result of lock operations
#[derive(Debug, Clone, PartialEq)]
pub enum LockResult {
    Acquired,
    AlreadyHeld(String), // Contains current owner
    Extended,
    Released,
    NotFound,
}

/// Distributed lock guarding a migration run against concurrent runners
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Acquire `key` for `owner` unless another owner holds an unexpired lock
    async fn acquire_lock(&self, key: &str, owner: &str, expiry_seconds: u64) -> Result<LockResult, LockError>;

    /// Release `key` if it is held by `owner`
    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError>;

    /// Push the expiry of a lock held by `owner` further out
    async fn extend_lock(&self, key: &str, owner: &str, expiry_seconds: u64) -> Result<LockResult, LockError>;

    /// Current owner of an unexpired lock, if any
    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError>;
}
