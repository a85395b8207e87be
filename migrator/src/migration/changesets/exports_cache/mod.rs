//! Change log of the exports cache, started from a baseline of the existing data.

mod baseline;
mod country_structure;
mod goods_location_country;
mod routing_countries;

pub use baseline::DbBaseline;
pub use country_structure::{plan_wrap_country, WrapCountryInCodeObject};
pub use goods_location_country::{plan_goods_location_country, CountryNameToCodeForLocationPage};
pub use routing_countries::{plan_routing_countries, RoutingCountriesToCodeObjects};

use crate::migration::registry::{ChangeLog, ChangeSetDefinition};
use crate::types::declaration::{DESTINATION_COUNTRY, ORIGINATION_COUNTRY};

pub const CHANGE_LOG_NAME: &str = "exports-cache";

pub fn change_log() -> ChangeLog {
    ChangeLog {
        name: CHANGE_LOG_NAME,
        legacy_history: false,
        change_sets: vec![
            ChangeSetDefinition::new("001", "Exports DB Baseline", "Paulo Monteiro", DbBaseline),
            ChangeSetDefinition::new(
                "002",
                "CEDS-2231 Change country name to country code for location page",
                "Patryk Rudnicki",
                CountryNameToCodeForLocationPage,
            ),
            ChangeSetDefinition::new(
                "003",
                "CEDS-2247 Change origination country structure",
                "Patryk Rudnicki",
                WrapCountryInCodeObject::new(ORIGINATION_COUNTRY),
            ),
            ChangeSetDefinition::new(
                "004",
                "CEDS-2247 Change destination country structure",
                "Patryk Rudnicki",
                WrapCountryInCodeObject::new(DESTINATION_COUNTRY),
            ),
            ChangeSetDefinition::new(
                "005",
                "CEDS-2247 Change routing countries structure",
                "Patryk Rudnicki",
                RoutingCountriesToCodeObjects,
            ),
        ],
    }
}
