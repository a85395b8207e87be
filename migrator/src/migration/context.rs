//! Migration context provided to each changeset.

use crate::core::client::database::DatabaseClient;
use crate::countries::CountryCatalogue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MigrationProgress {
    pub current_step: usize,
    pub total_steps: usize,
    pub message: String,
}

impl MigrationProgress {
    pub fn new(current_step: usize, total_steps: usize, message: impl Into<String>) -> Self {
        debug_assert!(current_step <= total_steps);
        Self { current_step, total_steps, message: message.into() }
    }
}

pub type ProgressCallback = Box<dyn Fn(MigrationProgress) + Send + Sync>;

/// Context provided to each changeset.
pub struct MigrationContext<'a> {
    database: &'a dyn DatabaseClient,
    countries: &'a CountryCatalogue,
    dry_run: bool,
    progress_callback: Option<ProgressCallback>,
    abort_flag: Arc<AtomicBool>,
}

impl<'a> MigrationContext<'a> {
    pub fn new(
        database: &'a dyn DatabaseClient,
        countries: &'a CountryCatalogue,
        dry_run: bool,
        abort_flag: Arc<AtomicBool>,
    ) -> Self {
        Self { database, countries, dry_run, progress_callback: None, abort_flag }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn database(&self) -> &dyn DatabaseClient {
        self.database
    }

    pub fn countries(&self) -> &CountryCatalogue {
        self.countries
    }

    /// Changesets must not write when this is set.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn report_progress(&self, progress: MigrationProgress) {
        if let Some(ref callback) = self.progress_callback {
            callback(progress);
        }
    }

    pub fn should_abort(&self) -> bool {
        self.abort_flag.load(Ordering::Relaxed)
    }
}
