//! Changeset bodies, grouped by the change log that declares them.
//!
//! Most changesets follow the same shape: select declarations with a filter, derive
//! one update per document, then write it. The derivation is a pure function of the
//! document so it can be exercised without a database.

pub mod declarations;
pub mod exports_cache;

use super::{MigrationContext, MigrationError, MigrationProgress};
use crate::core::client::database::constant::DECLARATIONS_COLLECTION;
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration;
use futures::TryStreamExt;
use mongodb::bson::Document;
use tracing::{debug, info};

/// Progress is reported every this many documents.
const PROGRESS_INTERVAL: usize = 100;

/// Update of a single document: which one, and what to change.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentUpdate {
    pub filter: Document,
    pub update: Document,
}

/// Apply `plan` to every declaration matching `filter` and write the updates it yields.
///
/// Declarations are read from the cursor one at a time; each update is written before
/// the next document is fetched. Documents for which `plan` returns `None` are counted
/// as skipped.
pub async fn rewrite_each<F>(
    ctx: &MigrationContext<'_>,
    filter: Document,
    plan: F,
) -> Result<ChangeSetReport, MigrationError>
where
    F: Fn(&Document) -> Option<DocumentUpdate> + Send + Sync,
{
    // Only used for progress, documents may be inserted while the cursor is open
    let expected = ctx.database().count_documents(DECLARATIONS_COLLECTION, filter.clone()).await? as usize;
    let mut documents = ctx.database().stream_documents(DECLARATIONS_COLLECTION, filter).await?;
    let mut report = ChangeSetReport::default();
    let mut processed = 0;

    while let Some(document) = documents.try_next().await? {
        if ctx.should_abort() {
            return Err(MigrationError::Aborted);
        }
        report.matched += 1;

        let document_id = document_label(&document);
        match plan(&document) {
            None => {
                debug!(document_id = %document_id, "Nothing to update");
                report.skipped += 1;
            }
            Some(DocumentUpdate { filter, update }) if ctx.is_dry_run() => {
                info!(document_id = %document_id, filter = %filter, update = %update, "Dry run, not updating");
                report.modified += 1;
            }
            Some(DocumentUpdate { filter, update }) => {
                info!(document_id = %document_id, update = %update, "Updating declaration");
                let result = ctx.database().update_one(DECLARATIONS_COLLECTION, filter, update).await?;
                if result.modified_count > 0 {
                    report.modified += 1;
                } else {
                    report.skipped += 1;
                }
            }
        }

        processed += 1;
        if processed % PROGRESS_INTERVAL == 0 {
            ctx.report_progress(MigrationProgress::new(processed, expected.max(processed), "declarations processed"));
        }
    }
    if processed % PROGRESS_INTERVAL != 0 {
        ctx.report_progress(MigrationProgress::new(processed, expected.max(processed), "declarations processed"));
    }

    Ok(report)
}

/// Identifier used in log lines: the declaration id, else the Mongo `_id`.
fn document_label(document: &Document) -> String {
    match document.get_str(declaration::ID) {
        Ok(id) => id.to_string(),
        Err(_) => document.get(declaration::MONGO_ID).map_or_else(|| "-".to_string(), |id| id.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{database_returning, database_streaming};
    use super::*;
    use crate::core::client::database::{MockDatabaseClient, UpdateResult};
    use crate::countries::CountryCatalogue;
    use futures::stream::{self, StreamExt};
    use mongodb::bson::doc;
    use std::sync::atomic::AtomicBool;
    use std::sync::{Arc, Mutex};

    fn touch_every_other(document: &Document) -> Option<DocumentUpdate> {
        let n = document.get_i32("n").ok()?;
        (n % 2 == 0).then(|| DocumentUpdate { filter: doc! { "n": n }, update: doc! { "$set": { "even": true } } })
    }

    #[tokio::test]
    async fn rewrite_each_counts_updates_and_skips() {
        let (database, updates) = database_returning(vec![doc! { "n": 1 }, doc! { "n": 2 }, doc! { "n": 4 }]);
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(false)));

        let report = rewrite_each(&ctx, doc! {}, touch_every_other).await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 3, modified: 2, skipped: 1 });
        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].0, doc! { "n": 2 });
        assert_eq!(updates[1].0, doc! { "n": 4 });
    }

    #[tokio::test]
    async fn rewrite_each_does_not_write_on_dry_run() {
        let (database, updates) = database_returning(vec![doc! { "n": 2 }, doc! { "n": 3 }]);
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, true, Arc::new(AtomicBool::new(false)));

        let report = rewrite_each(&ctx, doc! {}, touch_every_other).await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 2, modified: 1, skipped: 1 });
        assert!(updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewrite_each_stops_when_aborted() {
        let (database, updates) = database_returning(vec![doc! { "n": 2 }]);
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(true)));

        let result = rewrite_each(&ctx, doc! {}, touch_every_other).await;

        assert!(matches!(result, Err(MigrationError::Aborted)));
        assert!(updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewrite_each_writes_before_reading_the_next_document() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (read_log, write_log) = (events.clone(), events.clone());
        let mut database = MockDatabaseClient::new();
        database.expect_count_documents().returning(|_, _| Ok(2));
        database.expect_stream_documents().times(1).returning(move |_, _| {
            let read_log = read_log.clone();
            let documents = stream::iter(vec![doc! { "n": 2 }, doc! { "n": 4 }])
                .inspect(move |document| read_log.lock().unwrap().push(format!("read {}", document)))
                .map(Ok);
            Ok(documents.boxed())
        });
        database.expect_update_one().returning(move |_, filter, _| {
            write_log.lock().unwrap().push(format!("write {}", filter));
            Ok(UpdateResult { matched_count: 1, modified_count: 1 })
        });
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(false)));

        let report = rewrite_each(&ctx, doc! {}, touch_every_other).await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 2, modified: 2, skipped: 0 });
        let expected: Vec<String> = [doc! { "n": 2 }, doc! { "n": 4 }]
            .iter()
            .flat_map(|document| [format!("read {}", document), format!("write {}", document)])
            .collect();
        assert_eq!(*events.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn rewrite_each_reports_progress_once_for_a_short_run() {
        let database = database_streaming(vec![doc! { "n": 1 }, doc! { "n": 3 }, doc! { "n": 5 }]);
        let countries = CountryCatalogue::embedded().unwrap();
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = reported.clone();
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(false)))
            .with_progress_callback(Box::new(move |progress| {
                sink.lock().unwrap().push((progress.current_step, progress.total_steps));
            }));

        let report = rewrite_each(&ctx, doc! {}, touch_every_other).await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 3, modified: 0, skipped: 3 });
        assert_eq!(*reported.lock().unwrap(), vec![(3, 3)]);
    }

    #[test]
    fn document_label_prefers_declaration_id() {
        assert_eq!(document_label(&doc! { "id": "dec-1", "_id": 5 }), "dec-1");
        assert_eq!(document_label(&doc! { "_id": 5 }), "5");
        assert_eq!(document_label(&doc! {}), "-");
    }
}
