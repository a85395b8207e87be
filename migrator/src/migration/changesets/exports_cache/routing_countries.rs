use crate::migration::changesets::{rewrite_each, DocumentUpdate};
use crate::migration::registry::ChangeSet;
use crate::migration::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use crate::types::declaration::{self, COUNTRY_CODE, ROUTING_COUNTRIES};
use async_trait::async_trait;
use mongodb::bson::{doc, Bson, Document};
use tracing::warn;

/// Routing countries become a list of `{ code }` objects instead of a list of strings.
pub struct RoutingCountriesToCodeObjects;

impl RoutingCountriesToCodeObjects {
    fn filter() -> Document {
        doc! {
            "$and": [
                { ROUTING_COUNTRIES: { "$not": { "$elemMatch": { COUNTRY_CODE: { "$exists": true } } } } },
                { ROUTING_COUNTRIES: { "$exists": true } },
                { ROUTING_COUNTRIES: { "$type": "array" } },
            ]
        }
    }
}

fn has_code(country: &Bson) -> bool {
    country.as_document().is_some_and(|country| country.contains_key(COUNTRY_CODE))
}

/// Update turning each routing country string into a code object, addressed by `id` and `eori`.
///
/// Lists already holding a code object, and empty lists, are left alone.
pub fn plan_routing_countries(document: &Document) -> Option<DocumentUpdate> {
    let countries = declaration::get_path(document, ROUTING_COUNTRIES)?.as_array()?;
    if countries.is_empty() || countries.iter().any(has_code) {
        return None;
    }

    let wrapped: Vec<Bson> = countries
        .iter()
        .map(|country| match country {
            Bson::String(code) => Bson::Document(doc! { COUNTRY_CODE: code.as_str() }),
            other => {
                warn!(value = %other, "Routing country is not a string, keeping it unchanged");
                other.clone()
            }
        })
        .collect();

    let filter = declaration::owner_filter(document)?;
    Some(DocumentUpdate { filter, update: doc! { "$set": { ROUTING_COUNTRIES: wrapped } } })
}

#[async_trait]
impl ChangeSet for RoutingCountriesToCodeObjects {
    async fn execute(&self, ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        rewrite_each(ctx, Self::filter(), plan_routing_countries).await
    }
}
