use crate::migration::registry::ChangeSet;
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use async_trait::async_trait;
use tracing::info;

/// Marks the point from which the exports cache is tracked. Changes nothing.
pub struct DbBaseline;

#[async_trait]
impl ChangeSet for DbBaseline {
    async fn execute(&self, _ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        info!("Exports database baseline: no-op");
        Ok(ChangeSetReport::default())
    }
}
