use crate::migration::changesets::{rewrite_each, DocumentUpdate};
use crate::migration::registry::ChangeSet;
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration::{self, CONSIGNMENT_REFERENCES_LRN, LRN};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};

/// `consignmentReferences.lrn` moves to the root `lrn` field.
pub struct MoveLrnToRootOfDocument;

impl MoveLrnToRootOfDocument {
    fn filter() -> Document {
        doc! { CONSIGNMENT_REFERENCES_LRN: { "$exists": true } }
    }
}

/// Update moving the nested LRN of `document` to its root, addressed by `_id`.
pub fn plan_move_lrn(document: &Document) -> Option<DocumentUpdate> {
    let lrn = declaration::get_path(document, CONSIGNMENT_REFERENCES_LRN)?.clone();
    let filter = declaration::mongo_id_filter(document)?;
    Some(DocumentUpdate { filter, update: doc! { "$set": { LRN: lrn }, "$unset": { CONSIGNMENT_REFERENCES_LRN: "" } } })
}

#[async_trait]
impl ChangeSet for MoveLrnToRootOfDocument {
    async fn execute(&self, ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        rewrite_each(ctx, Self::filter(), plan_move_lrn).await
    }
}
