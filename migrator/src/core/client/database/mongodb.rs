use super::error::DatabaseError;
use super::{DatabaseClient, UpdateResult};
use crate::types::change_entry::ChangeEntry;
use crate::types::params::database::DatabaseArgs;
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::{self, doc, Document};
use mongodb::options::FindOptions;
use mongodb::{Client, Collection, Database};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// MongoDB client implementation
pub struct MongoDbClient {
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &DatabaseArgs) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.connection_uri).await?;
        let database = Arc::new(client.database(&config.database_name));
        Ok(Self { database })
    }

    pub fn database(&self) -> Arc<Database> {
        self.database.clone()
    }

    pub fn get_collection<T>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }
}

#[async_trait]
impl DatabaseClient for MongoDbClient {
    async fn count_documents(&self, collection: &str, filter: Document) -> Result<u64, DatabaseError> {
        let start = Instant::now();
        let count = self.get_collection::<Document>(collection).count_documents(filter, None).await?;
        debug!(
            collection = %collection,
            count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Counted documents"
        );
        Ok(count)
    }

    async fn stream_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> Result<BoxStream<'static, Result<Document, DatabaseError>>, DatabaseError> {
        trace!(collection = %collection, filter = %filter, "Opening cursor");
        let cursor = self.get_collection::<Document>(collection).find(filter, None).await?;
        Ok(cursor.map_err(DatabaseError::from).boxed())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DatabaseError> {
        trace!(collection = %collection, filter = %filter, update = %update, "Updating one document");
        let result = self.get_collection::<Document>(collection).update_one(filter, update, None).await?;
        Ok(UpdateResult { matched_count: result.matched_count, modified_count: result.modified_count })
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, DatabaseError> {
        trace!(collection = %collection, filter = %filter, update = %update, "Updating many documents");
        let result = self.get_collection::<Document>(collection).update_many(filter, update, None).await?;
        Ok(UpdateResult { matched_count: result.matched_count, modified_count: result.modified_count })
    }

    async fn get_change_entries(&self, collection: &str) -> Result<Vec<ChangeEntry>, DatabaseError> {
        let options = FindOptions::builder().sort(doc! { "timestamp": 1 }).build();
        let cursor = self.get_collection::<Document>(collection).find(doc! {}, options).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        let entries = documents.into_iter().map(bson::from_document::<ChangeEntry>).collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn insert_change_entry(&self, collection: &str, entry: ChangeEntry) -> Result<(), DatabaseError> {
        let document = bson::to_document(&entry)?;
        self.get_collection::<Document>(collection).insert_one(document, None).await?;
        debug!(collection = %collection, change_id = %entry.change_id, state = %entry.state, "Recorded change entry");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
