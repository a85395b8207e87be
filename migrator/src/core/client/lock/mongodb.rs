use super::error::LockError;
use super::{LockClient, LockInfo, LockResult};
use crate::core::client::database::constant::DUPLICATE_KEY_ERROR_CODE;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::UpdateOptions;
use mongodb::{Collection, Database};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lock client backed by a MongoDB collection.
///
/// Each lock is a single document keyed by the lock name. Acquisition is an upsert
/// filtered on "expired or already mine": when another owner holds a live lock the
/// upsert collides with the existing `_id` and the driver reports a duplicate key.
pub struct MongoLockClient {
    database: Arc<Database>,
    collection_name: String,
}

impl MongoLockClient {
    pub fn new(database: Arc<Database>, collection_name: impl Into<String>) -> Self {
        Self { database, collection_name: collection_name.into() }
    }

    fn collection(&self) -> Collection<LockInfo> {
        self.database.collection(&self.collection_name)
    }

    fn expiry_from_now(expiry_seconds: u64) -> Result<DateTime<Utc>, LockError> {
        let seconds = i64::try_from(expiry_seconds).map_err(|_| LockError::InvalidExpiry(expiry_seconds))?;
        let duration = chrono::Duration::try_seconds(seconds).ok_or(LockError::InvalidExpiry(expiry_seconds))?;
        Utc::now().checked_add_signed(duration).ok_or(LockError::InvalidExpiry(expiry_seconds))
    }
}

fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_ERROR_CODE,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_ERROR_CODE,
        _ => false,
    }
}

#[async_trait]
impl LockClient for MongoLockClient {
    async fn acquire_lock(&self, key: &str, owner: &str, expiry_seconds: u64) -> Result<LockResult, LockError> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let expires_at = bson::DateTime::from_chrono(Self::expiry_from_now(expiry_seconds)?);

        let filter = doc! {
            "_id": key,
            "$or": [
                { "expires_at": { "$lte": now } },
                { "owner": owner },
            ]
        };
        let update = doc! { "$set": { "owner": owner, "expires_at": expires_at } };
        let options = UpdateOptions::builder().upsert(true).build();

        match self.collection().update_one(filter, update, options).await {
            Ok(_) => {
                debug!(key = %key, owner = %owner, expiry_seconds, "Lock acquired");
                Ok(LockResult::Acquired)
            }
            Err(err) if is_duplicate_key_error(&err) => {
                let current_owner = self.get_lock_owner(key).await?.unwrap_or_default();
                warn!(key = %key, owner = %owner, current_owner = %current_owner, "Lock already held");
                Ok(LockResult::AlreadyHeld(current_owner))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError> {
        let result = self.collection().delete_one(doc! { "_id": key, "owner": owner }, None).await?;
        if result.deleted_count == 0 {
            debug!(key = %key, owner = %owner, "No lock to release");
            return Ok(LockResult::NotFound);
        }
        debug!(key = %key, owner = %owner, "Lock released");
        Ok(LockResult::Released)
    }

    async fn extend_lock(&self, key: &str, owner: &str, expiry_seconds: u64) -> Result<LockResult, LockError> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let expires_at = bson::DateTime::from_chrono(Self::expiry_from_now(expiry_seconds)?);
        let result = self
            .collection()
            .update_one(
                doc! { "_id": key, "owner": owner, "expires_at": { "$gt": now } },
                doc! { "$set": { "expires_at": expires_at } },
                None,
            )
            .await?;
        if result.matched_count == 0 {
            return Ok(LockResult::NotFound);
        }
        Ok(LockResult::Extended)
    }

    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError> {
        let now = bson::DateTime::from_chrono(Utc::now());
        let lock = self.collection().find_one(doc! { "_id": key, "expires_at": { "$gt": now } }, None).await?;
        Ok(lock.map(|lock| lock.owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn expiry_is_relative_to_now() {
        let before = Utc::now();
        let expires_at = MongoLockClient::expiry_from_now(600).unwrap();
        let seconds = (expires_at - before).num_seconds();
        assert!((599..=601).contains(&seconds), "unexpected expiry {seconds}s");
    }

    #[test]
    fn unrepresentable_expiry_is_rejected() {
        assert_matches!(MongoLockClient::expiry_from_now(u64::MAX), Err(LockError::InvalidExpiry(u64::MAX)));
    }
}
