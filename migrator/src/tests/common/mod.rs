use crate::core::client::database::{DatabaseError, MockDatabaseClient};
use crate::core::client::lock::{LockResult, MockLockClient};
use crate::core::config::Config;
use crate::countries::CountryCatalogue;
use crate::migration::{ChangeLog, ChangeSet, ChangeSetDefinition, MigrationContext, MigrationError};
use crate::types::change_entry::{ChangeEntry, ChangeSetReport, ChangeState};
use crate::types::params::MigrationParams;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use rstest::*;
use std::sync::{Arc, Mutex};

pub const TEST_CHANGE_LOG: &str = "test-log";
pub const TEST_AUTHOR: &str = "Tester";

#[fixture]
pub fn migration_params(#[default(false)] dry_run: bool) -> MigrationParams {
    MigrationParams {
        change_log_collection: "mongockChangeLog".to_string(),
        legacy_change_log_collection: "dbchangelog".to_string(),
        lock_collection: "mongockLock".to_string(),
        lock_expiry_seconds: 600,
        countries_file: None,
        dry_run,
    }
}

#[fixture]
pub fn countries() -> CountryCatalogue {
    CountryCatalogue::embedded().expect("embedded country list")
}

pub fn change_entry(change_id: &str, author: &str, state: ChangeState) -> ChangeEntry {
    ChangeEntry {
        execution_id: "previous-run".to_string(),
        change_id: change_id.to_string(),
        author: author.to_string(),
        change_log: TEST_CHANGE_LOG.to_string(),
        order: "001".to_string(),
        state,
        executed_at: Utc::now().round_subsecs(3),
        execution_millis: 5,
        report: ChangeSetReport::default(),
    }
}

/// Changeset appending its id to a shared journal, optionally failing.
pub struct JournalChangeSet {
    pub id: &'static str,
    pub journal: Arc<Mutex<Vec<&'static str>>>,
    pub fail: bool,
}

#[async_trait]
impl ChangeSet for JournalChangeSet {
    async fn execute(&self, _ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError> {
        self.journal.lock().unwrap().push(self.id);
        if self.fail {
            return Err(DatabaseError::FailedToDeserializeDocument(format!("{} exploded", self.id)).into());
        }
        Ok(ChangeSetReport { matched: 1, modified: 1, skipped: 0 })
    }
}

/// Change log of journal changesets `(order, id, fail)`.
pub fn journal_change_log(
    journal: &Arc<Mutex<Vec<&'static str>>>,
    change_sets: &[(&'static str, &'static str, bool)],
) -> ChangeLog {
    ChangeLog {
        name: TEST_CHANGE_LOG,
        legacy_history: false,
        change_sets: change_sets
            .iter()
            .map(|&(order, id, fail)| {
                ChangeSetDefinition::new(order, id, TEST_AUTHOR, JournalChangeSet { id, journal: journal.clone(), fail })
            })
            .collect(),
    }
}

/// Lock mock that grants, extends and releases the migration lock.
pub fn cooperative_lock() -> MockLockClient {
    let mut lock = MockLockClient::new();
    lock.expect_acquire_lock().times(1).returning(|_, _, _| Ok(LockResult::Acquired));
    lock.expect_extend_lock().returning(|_, _, _| Ok(LockResult::Extended));
    lock.expect_release_lock().times(1).returning(|_, _| Ok(LockResult::Released));
    lock
}

pub fn build_config(
    params: MigrationParams,
    database: MockDatabaseClient,
    lock: MockLockClient,
    countries: CountryCatalogue,
) -> Arc<Config> {
    Arc::new(Config::new(params, Box::new(database), Box::new(lock), countries))
}
