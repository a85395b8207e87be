use crate::migration::changesets::{rewrite_each, DocumentUpdate};
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration::{self, CONSIGNMENT_REFERENCES_LRN, EORI};
use mongodb::bson::{doc, Document};
use tracing::info;

/// Update giving one declaration `new_lrn`, addressed by its `_id`.
///
/// Declarations whose LRN is not `current_lrn` are left alone.
pub fn plan_reassign_lrn(document: &Document, current_lrn: &str, new_lrn: &str) -> Option<DocumentUpdate> {
    if declaration::get_str_path(document, CONSIGNMENT_REFERENCES_LRN) != Some(current_lrn) {
        return None;
    }
    let filter = declaration::mongo_id_filter(document)?;
    Some(DocumentUpdate { filter, update: doc! { "$set": { CONSIGNMENT_REFERENCES_LRN: new_lrn } } })
}

/// Replace `current_lrn` by `new_lrn` on every declaration owned by `eori`.
pub async fn reassign_lrn(
    ctx: &MigrationContext<'_>,
    eori: &str,
    current_lrn: &str,
    new_lrn: &str,
) -> Result<ChangeSetReport, MigrationError> {
    info!(eori = %eori, current_lrn = %current_lrn, new_lrn = %new_lrn, "Reassigning LRN");
    let filter = doc! { EORI: eori, CONSIGNMENT_REFERENCES_LRN: current_lrn };
    let report = rewrite_each(ctx, filter, |document| plan_reassign_lrn(document, current_lrn, new_lrn)).await?;
    info!(matched = report.matched, modified = report.modified, "LRN reassigned");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::database::{MockDatabaseClient, UpdateResult};
    use crate::countries::CountryCatalogue;
    use crate::migration::changesets::test_support::database_streaming;
    use futures::stream::{self, StreamExt};
    use mongodb::bson::oid::ObjectId;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn declaration(mongo_id: ObjectId, lrn: &str) -> Document {
        doc! {
            "_id": mongo_id,
            "id": "dec-1",
            "eori": "GB072071145000",
            "consignmentReferences": { "lrn": lrn, "ducr": { "ducr": "8GB123456789012-1234" } },
        }
    }

    #[test]
    fn matching_lrn_is_replaced_by_mongo_id() {
        let mongo_id = ObjectId::new();
        let planned = plan_reassign_lrn(&declaration(mongo_id, "QSLRN6499100"), "QSLRN6499100", "NEWLRN").unwrap();

        assert_eq!(planned.filter, doc! { "_id": mongo_id });
        assert_eq!(planned.update, doc! { "$set": { "consignmentReferences.lrn": "NEWLRN" } });
    }

    #[test]
    fn other_lrns_are_left_alone() {
        assert_eq!(plan_reassign_lrn(&declaration(ObjectId::new(), "OTHER"), "QSLRN6499100", "NEWLRN"), None);
    }

    #[tokio::test]
    async fn reassign_lrn_queries_by_owner_and_current_lrn() {
        let mongo_id = ObjectId::new();
        let mut database = MockDatabaseClient::new();
        database.expect_count_documents().returning(|_, _| Ok(1));
        database
            .expect_stream_documents()
            .withf(|collection, filter| {
                collection == "declarations"
                    && *filter == doc! { "eori": "GB072071145000", "consignmentReferences.lrn": "QSLRN6499100" }
            })
            .times(1)
            .returning(move |_, _| Ok(stream::iter(vec![Ok(declaration(mongo_id, "QSLRN6499100"))]).boxed()));
        database
            .expect_update_one()
            .withf(move |_, filter, update| {
                *filter == doc! { "_id": mongo_id }
                    && *update == doc! { "$set": { "consignmentReferences.lrn": "NEWLRN1234567" } }
            })
            .times(1)
            .returning(|_, _, _| Ok(UpdateResult { matched_count: 1, modified_count: 1 }));
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(false)));

        let report = reassign_lrn(&ctx, "GB072071145000", "QSLRN6499100", "NEWLRN1234567").await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 1, modified: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn dry_run_does_not_update() {
        let mut database = database_streaming(vec![declaration(ObjectId::new(), "QSLRN6499100")]);
        database.expect_update_one().never();
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, true, Arc::new(AtomicBool::new(false)));

        let report = reassign_lrn(&ctx, "GB072071145000", "QSLRN6499100", "NEWLRN1234567").await.unwrap();

        assert_eq!(report.modified, 1);
    }
}
