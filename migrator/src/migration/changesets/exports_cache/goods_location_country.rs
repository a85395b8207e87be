use crate::countries::CountryCatalogue;
use crate::migration::changesets::{rewrite_each, DocumentUpdate};
use crate::migration::registry::ChangeSet;
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration::{self, GOODS_LOCATION_COUNTRY};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use tracing::info;

/// Values shorter than this are already country codes.
const MIN_COUNTRY_NAME_LENGTH: usize = 3;

/// The goods location stores a country code instead of the country name.
pub struct CountryNameToCodeForLocationPage;

impl CountryNameToCodeForLocationPage {
    fn filter() -> Document {
        doc! {
            "$and": [
                { GOODS_LOCATION_COUNTRY: { "$exists": true } },
                { GOODS_LOCATION_COUNTRY: { "$type": "string" } },
                { GOODS_LOCATION_COUNTRY: { "$ne": "" } },
                { GOODS_LOCATION_COUNTRY: { "$regex": "^.{3,}$" } },
            ]
        }
    }
}

/// Update replacing the goods location country name with its code, addressed by `id` and `eori`.
///
/// Names missing from the catalogue are kept as they are, so no update is produced for them.
pub fn plan_goods_location_country(document: &Document, countries: &CountryCatalogue) -> Option<DocumentUpdate> {
    let country_name = declaration::get_str_path(document, GOODS_LOCATION_COUNTRY)?;
    if country_name.chars().count() < MIN_COUNTRY_NAME_LENGTH {
        return None;
    }
    let country_code = countries.find_country_code_or_return_name(country_name);
    if country_code == country_name {
        info!(country = %country_name, "No country code found, keeping the name");
        return None;
    }
    let filter = declaration::owner_filter(document)?;
    Some(DocumentUpdate { filter, update: doc! { "$set": { GOODS_LOCATION_COUNTRY: country_code } } })
}

#[async_trait]
impl ChangeSet for CountryNameToCodeForLocationPage {
    async fn execute(&self, ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        let countries = ctx.countries();
        rewrite_each(ctx, Self::filter(), |document| plan_goods_location_country(document, countries)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::changesets::test_support::database_returning;
    use rstest::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[fixture]
    fn countries() -> CountryCatalogue {
        CountryCatalogue::embedded().unwrap()
    }

    fn declaration_with_country(country: &str) -> Document {
        doc! {
            "id": "dec-1",
            "eori": "GB072071145000",
            "locations": { "goodsLocation": { "country": country, "city": "Leeds" } },
        }
    }

    #[rstest]
    #[case("Poland", "PL")]
    #[case("United Kingdom", "GB")]
    fn country_name_is_replaced_by_code(countries: CountryCatalogue, #[case] name: &str, #[case] code: &str) {
        let planned = plan_goods_location_country(&declaration_with_country(name), &countries).unwrap();

        assert_eq!(planned.filter, doc! { "id": "dec-1", "eori": "GB072071145000" });
        assert_eq!(planned.update, doc! { "$set": { "locations.goodsLocation.country": code } });
    }

    #[rstest]
    #[case::already_a_code("PL")]
    #[case::unknown_name("Narnia")]
    #[case::empty("")]
    fn other_values_produce_no_update(countries: CountryCatalogue, #[case] value: &str) {
        assert_eq!(plan_goods_location_country(&declaration_with_country(value), &countries), None);
    }

    #[rstest]
    fn declarations_without_owner_keys_are_skipped(countries: CountryCatalogue) {
        let mut document = declaration_with_country("Poland");
        document.remove("eori");
        assert_eq!(plan_goods_location_country(&document, &countries), None);
    }

    #[rstest]
    fn non_string_countries_are_ignored(countries: CountryCatalogue) {
        let document = doc! { "id": "dec-1", "eori": "GB1", "locations": { "goodsLocation": { "country": { "code": "PL" } } } };
        assert_eq!(plan_goods_location_country(&document, &countries), None);
    }

    #[rstest]
    #[tokio::test]
    async fn execute_rewrites_matching_declarations(countries: CountryCatalogue) {
        let mut unknown = declaration_with_country("Narnia");
        unknown.insert("id", "dec-2");
        let (database, updates) = database_returning(vec![declaration_with_country("Germany"), unknown]);
        let ctx = MigrationContext::new(&database, &countries, false, Arc::new(AtomicBool::new(false)));

        let report = CountryNameToCodeForLocationPage.execute(&ctx).await.unwrap();

        assert_eq!(report, ChangeSetReport { matched: 2, modified: 1, skipped: 1 });
        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, doc! { "$set": { "locations.goodsLocation.country": "DE" } });
    }
}
