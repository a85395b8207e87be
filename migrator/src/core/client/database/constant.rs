/// Collection holding the declaration documents the changesets rewrite.
pub const DECLARATIONS_COLLECTION: &str = "declarations";

/// Default collection recording which changesets have been executed.
pub const CHANGE_LOG_COLLECTION: &str = "mongockChangeLog";

/// Default collection where Mongobee recorded the runs of the declarations change log.
pub const LEGACY_CHANGE_LOG_COLLECTION: &str = "dbchangelog";

/// MongoDB error code returned when a unique index rejects a write.
pub const DUPLICATE_KEY_ERROR_CODE: i32 = 11000;
