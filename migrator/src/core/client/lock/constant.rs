/// Default collection holding migration locks.
pub const LOCKS_COLLECTION: &str = "mongockLock";

/// Key of the lock taken for the whole migration run.
pub const MIGRATION_LOCK_KEY: &str = "exports-migration";

/// Default lifetime of the migration lock, in seconds.
pub const DEFAULT_LOCK_EXPIRY_SECONDS: u64 = 10 * 60;
