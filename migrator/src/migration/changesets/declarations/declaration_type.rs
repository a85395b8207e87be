use crate::core::client::database::constant::DECLARATIONS_COLLECTION;
use crate::migration::registry::ChangeSet;
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration::{ADDITIONAL_DECLARATION_TYPE, DECLARATION_TYPE};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use tracing::info;

const STANDARD_TYPE: &str = "STANDARD";
const APPLES_TYPE: &str = "APPLES";

/// Every STANDARD declaration gets the APPLES additional declaration type.
pub struct UpdateDeclarationTypeToApples;

impl UpdateDeclarationTypeToApples {
    fn filter() -> Document {
        doc! { DECLARATION_TYPE: STANDARD_TYPE }
    }

    /// STANDARD declarations the update would actually change.
    fn not_yet_apples_filter() -> Document {
        let mut filter = Self::filter();
        filter.insert(ADDITIONAL_DECLARATION_TYPE, doc! { "$ne": APPLES_TYPE });
        filter
    }

    fn update() -> Document {
        doc! { "$set": { ADDITIONAL_DECLARATION_TYPE: APPLES_TYPE } }
    }
}

#[async_trait]
impl ChangeSet for UpdateDeclarationTypeToApples {
    async fn execute(&self, ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        if ctx.is_dry_run() {
            let matched = ctx.database().count_documents(DECLARATIONS_COLLECTION, Self::filter()).await?;
            let modified = ctx.database().count_documents(DECLARATIONS_COLLECTION, Self::not_yet_apples_filter()).await?;
            info!(matched, modified, "Dry run, not updating declaration types");
            return Ok(ChangeSetReport { matched, modified, skipped: matched.saturating_sub(modified) });
        }

        let result = ctx.database().update_many(DECLARATIONS_COLLECTION, Self::filter(), Self::update()).await?;
        info!(matched = result.matched_count, modified = result.modified_count, "Updated declaration types");
        Ok(ChangeSetReport {
            matched: result.matched_count,
            modified: result.modified_count,
            skipped: result.matched_count.saturating_sub(result.modified_count),
        })
    }
}
