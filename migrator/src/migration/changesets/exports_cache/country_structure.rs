use crate::migration::changesets::{rewrite_each, DocumentUpdate};
use crate::migration::registry::ChangeSet;
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration::{self, COUNTRY_CODE};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};

/// A bare country string at `path` becomes `{ code: <string> }`.
///
/// Used for both the origination and the destination country.
pub struct WrapCountryInCodeObject {
    path: &'static str,
}

impl WrapCountryInCodeObject {
    pub fn new(path: &'static str) -> Self {
        Self { path }
    }

    fn filter(&self) -> Document {
        doc! {
            "$and": [
                { self.path: { "$exists": true } },
                { self.path: { "$type": "string" } },
                { self.path: { "$ne": "" } },
            ]
        }
    }
}

/// Update wrapping the country string at `path` into a code object, addressed by `id` and `eori`.
pub fn plan_wrap_country(document: &Document, path: &str) -> Option<DocumentUpdate> {
    let country = declaration::get_str_path(document, path).filter(|country| !country.is_empty())?;
    let filter = declaration::owner_filter(document)?;
    Some(DocumentUpdate { filter, update: doc! { "$set": { path: { COUNTRY_CODE: country } } } })
}

#[async_trait]
impl ChangeSet for WrapCountryInCodeObject {
    async fn execute(&self, ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        let path = self.path;
        rewrite_each(ctx, self.filter(), move |document| plan_wrap_country(document, path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countries::CountryCatalogue;
    use crate::migration::changesets::test_support::database_returning;
    use crate::types::declaration::{DESTINATION_COUNTRY, ORIGINATION_COUNTRY};
    use rstest::rstest;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn declaration(locations: Document) -> Document {
        doc! { "id": "dec-1", "eori": "GB072071145000", "locations": locations }
    }

    #[rstest]
    #[case(ORIGINATION_COUNTRY, doc! { "originationCountry": "PL" })]
    #[case(DESTINATION_COUNTRY, doc! { "destinationCountry": "PL" })]
    fn string_is_wrapped_into_code_object(#[case] path: &str, #[case] locations: Document) {
        let planned = plan_wrap_country(&declaration(locations), path).unwrap();

        assert_eq!(planned.filter, doc! { "id": "dec-1", "eori": "GB072071145000" });
        assert_eq!(planned.update, doc! { "$set": { path: { "code": "PL" } } });
    }

    #[rstest]
    #[case::already_wrapped(doc! { "originationCountry": { "code": "PL" } })]
    #[case::empty(doc! { "originationCountry": "" })]
    #[case::missing(doc! { "destinationCountry": "PL" })]
    fn other_shapes_produce_no_update(#[case] locations: Document) {
        assert_eq!(plan_wrap_country(&declaration(locations), ORIGINATION_COUNTRY), None);
    }

    #[test]
    fn filter_selects_non_empty_strings_only() {
        let filter = WrapCountryInCodeObject::new(DESTINATION_COUNTRY).filter();
        assert_eq!(
            filter,
            doc! {
                "$and": [
                    { "locations.destinationCountry": { "$exists": true } },
                    { "locations.destinationCountry": { "$type": "string" } },
                    { "locations.destinationCountry": { "$ne": "" } },
                ]
            }
        );
    }

    #[tokio::test]
    async fn execute_wraps_destination_countries() {
        let (database, updates) = database_returning(vec![
            declaration(doc! { "destinationCountry": "FR" }),
            doc! { "id": "orphan", "locations": { "destinationCountry": "DE" } },
        ]);
        let countries = CountryCatalogue::embedded().unwrap();
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(false)));

        let report = WrapCountryInCodeObject::new(DESTINATION_COUNTRY).execute(&ctx).await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 2, modified: 1, skipped: 1 });
        let updates = updates.lock().unwrap();
        assert_eq!(updates[0].1, doc! { "$set": { "locations.destinationCountry": { "code": "FR" } } });
    }
}
