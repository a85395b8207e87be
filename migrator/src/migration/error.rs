use crate::core::client::database::DatabaseError;
use crate::core::client::lock::LockError;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration lock '{key}' is held by '{owner}' - another migration may be in progress")]
    MigrationInProgress { key: String, owner: String },

    #[error("Change log '{change_log}' is empty or has no name")]
    EmptyChangeLog { change_log: String },

    #[error("Change log '{change_log}' declares order '{order}' after '{previous}'; orders must be strictly ascending")]
    OrderNotAscending { change_log: String, order: String, previous: String },

    #[error("Changeset '{id}' by '{author}' is registered more than once")]
    DuplicateChangeSet { id: String, author: String },

    #[error("Changeset '{id}' ({change_log} #{order}) failed: {message}")]
    ChangeSetFailed { change_log: String, order: String, id: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    #[error("Migration aborted")]
    Aborted,
}
