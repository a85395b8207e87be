use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Failed to serialize document: {0}")]
    FailedToSerializeDocument(String),

    #[error("Failed to deserialize document: {0}")]
    FailedToDeserializeDocument(String),
}

impl From<bson::ser::Error> for DatabaseError {
    fn from(err: bson::ser::Error) -> Self {
        DatabaseError::FailedToSerializeDocument(err.to_string())
    }
}

impl From<bson::de::Error> for DatabaseError {
    fn from(err: bson::de::Error) -> Self {
        DatabaseError::FailedToDeserializeDocument(err.to_string())
    }
}
