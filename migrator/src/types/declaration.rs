//! Field paths of the declaration document and helpers to read them from raw BSON.
//!
//! Declarations are handled as untyped documents: the changesets exist precisely
//! because the stored shape differs from one schema version to the next.

use mongodb::bson::{doc, Bson, Document};
use tracing::warn;

pub const ID: &str = "id";
pub const EORI: &str = "eori";
pub const MONGO_ID: &str = "_id";

pub const DECLARATION_TYPE: &str = "type";
pub const ADDITIONAL_DECLARATION_TYPE: &str = "additionalDeclarationType";

pub const LRN: &str = "lrn";
pub const CONSIGNMENT_REFERENCES_LRN: &str = "consignmentReferences.lrn";

pub const GOODS_LOCATION_COUNTRY: &str = "locations.goodsLocation.country";
pub const ORIGINATION_COUNTRY: &str = "locations.originationCountry";
pub const DESTINATION_COUNTRY: &str = "locations.destinationCountry";
pub const ROUTING_COUNTRIES: &str = "locations.routingCountries";

/// Key of the object a bare country string is wrapped into.
pub const COUNTRY_CODE: &str = "code";

/// Resolve a dotted path (`a.b.c`) through nested sub-documents.
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

pub fn get_str_path<'a>(document: &'a Document, path: &str) -> Option<&'a str> {
    get_path(document, path).and_then(Bson::as_str)
}

/// Filter selecting a single declaration by its `id` and owning `eori`.
///
/// Returns `None`, with a warning, when either key is missing or not a string.
pub fn owner_filter(document: &Document) -> Option<Document> {
    match (document.get_str(ID), document.get_str(EORI)) {
        (Ok(id), Ok(eori)) => Some(doc! { ID: id, EORI: eori }),
        _ => {
            warn!(mongo_id = ?document.get(MONGO_ID), "Declaration has no string id or eori, skipping");
            None
        }
    }
}

/// Filter selecting a single document by its MongoDB `_id`.
pub fn mongo_id_filter(document: &Document) -> Option<Document> {
    document.get(MONGO_ID).map(|id| doc! { MONGO_ID: id.clone() })
}
