pub mod constant;
pub mod error;
pub mod mongodb;

use crate::types::change_entry::ChangeEntry;
use ::mongodb::bson::Document;
use async_trait::async_trait;
pub use error::DatabaseError;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Result of an update operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Trait defining the database operations the changesets and the runner rely on.
///
/// Changesets work on raw BSON documents because the declaration shape is exactly
/// what they change; only the change log is typed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// count_documents - Number of documents of `collection` matching `filter`
    async fn count_documents(&self, collection: &str, filter: Document) -> Result<u64, DatabaseError>;

    /// stream_documents - Documents of `collection` matching `filter`, read from the cursor as they are polled
    async fn stream_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<BoxStream<'static, Result<Document, DatabaseError>>, DatabaseError>;

    /// update_one - Apply `update` to the first document matching `filter`
    async fn update_one(&self, collection: &str, filter: Document, update: Document)
        -> Result<UpdateResult, DatabaseError>;

    /// update_many - Apply `update` to every document matching `filter`
    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DatabaseError>;

    /// get_change_entries - Read the whole change log, oldest first
    async fn get_change_entries(&self, collection: &str) -> Result<Vec<ChangeEntry>, DatabaseError>;

    /// insert_change_entry - Append an entry to the change log
    async fn insert_change_entry(&self, collection: &str, entry: ChangeEntry) -> Result<(), DatabaseError>;

    /// health_check - Ping the database
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
