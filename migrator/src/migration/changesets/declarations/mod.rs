//! Legacy change log of the declarations collection.
//!
//! It was first run by Mongobee, which recorded its runs in a collection of its own.

mod declaration_type;
mod move_lrn;

pub use declaration_type::UpdateDeclarationTypeToApples;
pub use move_lrn::{plan_move_lrn, MoveLrnToRootOfDocument};

use crate::migration::registry::{ChangeLog, ChangeSetDefinition};

pub const CHANGE_LOG_NAME: &str = "declarations";

pub fn change_log() -> ChangeLog {
    ChangeLog {
        name: CHANGE_LOG_NAME,
        legacy_history: true,
        change_sets: vec![
            ChangeSetDefinition::new(
                "001",
                "CEDS-2111 Change declaration types to APPLES",
                "Paulo Monteiro",
                UpdateDeclarationTypeToApples,
            ),
            ChangeSetDefinition::new(
                "002",
                "CEDS-2111 Move LRN to root of document",
                "Paulo Monteiro",
                MoveLrnToRootOfDocument,
            ),
        ],
    }
}
