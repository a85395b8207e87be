//! Run-once execution of the exports changesets.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MigrationRunner                            │
//! │  - Reads the change log to find pending changesets              │
//! │  - Holds the migration lock while writing                       │
//! │  - Executes changesets sequentially and records each outcome    │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Registry                                   │
//! │  - Ordered change logs ("declarations", "exports-cache")        │
//! │  - Validates orders and identities                              │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Changesets                                 │
//! │  - One filter + one per-document rewrite each                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A changeset is applied when the change-log collection holds an `EXECUTED` entry
//! for its `(changeId, author)`. For the legacy declarations log, an entry in the
//! Mongobee collection counts as well; that collection is never written. A failed
//! changeset is recorded as `FAILED`, stops the run, and is attempted again on the
//! next one.

pub mod changesets;
mod context;
mod error;
pub mod registry;

pub use context::{MigrationContext, MigrationProgress, ProgressCallback};
pub use error::MigrationError;
pub use registry::{get_change_logs, validate_registry, ChangeLog, ChangeSet, ChangeSetDefinition};

use crate::core::config::Config;
use crate::core::client::lock::constant::MIGRATION_LOCK_KEY;
use crate::core::client::lock::{LockError, LockResult};
use crate::types::change_entry::{ChangeEntry, ChangeSetReport, ChangeState};
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Identity of a registered changeset, with its execution time once applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetStatus {
    pub change_log: &'static str,
    pub order: &'static str,
    pub id: &'static str,
    pub author: &'static str,
    pub executed_at: Option<DateTime<Utc>>,
}

/// Applied and pending changesets, each in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    pub applied: Vec<ChangeSetStatus>,
    pub pending: Vec<ChangeSetStatus>,
    /// Execution id of a run currently holding the migration lock
    pub lock_owner: Option<String>,
}

/// Changeset executed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedChangeSet {
    pub change_log: &'static str,
    pub id: &'static str,
    pub report: ChangeSetReport,
}

/// Outcome of [`MigrationRunner::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    pub executed: Vec<ExecutedChangeSet>,
    pub already_applied: usize,
    pub dry_run: bool,
}

impl MigrationSummary {
    /// Counts of every executed changeset added together.
    pub fn total(&self) -> ChangeSetReport {
        self.executed.iter().fold(ChangeSetReport::default(), |mut total, change_set| {
            total.merge(change_set.report);
            total
        })
    }
}

/// Change history read at the start of a run or status check.
struct ChangeHistory {
    entries: Vec<ChangeEntry>,
    /// Entries of the legacy collection, consulted for change logs with `legacy_history` only
    legacy_entries: Vec<ChangeEntry>,
}

impl ChangeHistory {
    /// Latest execution of `definition`, if it has been applied.
    fn executed_at(&self, change_log: &ChangeLog, definition: &ChangeSetDefinition) -> Option<DateTime<Utc>> {
        let legacy: &[ChangeEntry] = if change_log.legacy_history { &self.legacy_entries } else { &[] };
        self.entries
            .iter()
            .chain(legacy)
            .filter(|entry| entry.is_executed(definition.id, definition.author))
            .map(|entry| entry.executed_at)
            .max()
    }
}

/// Main migration orchestrator.
pub struct MigrationRunner {
    config: Arc<Config>,
    change_logs: Vec<ChangeLog>,
    /// Owner of the migration lock and id of the change-log entries written by this run
    execution_id: String,
    abort_flag: Arc<AtomicBool>,
}

impl MigrationRunner {
    /// Runner over the shipped change logs.
    pub fn new(config: Arc<Config>) -> Self {
        Self::with_change_logs(config, get_change_logs())
    }

    pub fn with_change_logs(config: Arc<Config>, change_logs: Vec<ChangeLog>) -> Self {
        Self {
            config,
            change_logs,
            execution_id: uuid::Uuid::new_v4().to_string(),
            abort_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    /// Set the abort flag to signal the run should stop at the next document.
    pub fn abort(&self) {
        self.abort_flag.store(true, Ordering::Relaxed);
    }

    /// Shared flag, for signal handlers.
    pub fn abort_flag(&self) -> Arc<AtomicBool> {
        self.abort_flag.clone()
    }

    /// Compare the registry with the change-log collection without running anything.
    pub async fn check_status(&self) -> Result<MigrationStatus, MigrationError> {
        let history = self.read_history().await?;
        let mut status = self.status_from_history(&history);
        status.lock_owner = self.config.lock().get_lock_owner(MIGRATION_LOCK_KEY).await?;
        Ok(status)
    }

    async fn read_history(&self) -> Result<ChangeHistory, MigrationError> {
        let params = self.config.params();
        let database = self.config.database();
        let entries = database.get_change_entries(&params.change_log_collection).await?;
        let legacy_entries = if self.change_logs.iter().any(|change_log| change_log.legacy_history) {
            let legacy_entries = database.get_change_entries(&params.legacy_change_log_collection).await?;
            debug!(
                collection = %params.legacy_change_log_collection,
                entries = legacy_entries.len(),
                "Read legacy change log"
            );
            legacy_entries
        } else {
            vec![]
        };
        Ok(ChangeHistory { entries, legacy_entries })
    }

    fn status_from_history(&self, history: &ChangeHistory) -> MigrationStatus {
        let mut status = MigrationStatus::default();
        for change_log in &self.change_logs {
            for definition in &change_log.change_sets {
                let executed_at = history.executed_at(change_log, definition);
                let change_set = ChangeSetStatus {
                    change_log: change_log.name,
                    order: definition.order,
                    id: definition.id,
                    author: definition.author,
                    executed_at,
                };
                if change_set.executed_at.is_some() {
                    status.applied.push(change_set);
                } else {
                    status.pending.push(change_set);
                }
            }
        }
        status
    }

    /// Run pending changesets.
    ///
    /// This is the main entry point. It will:
    /// 1. Validate the registry
    /// 2. Acquire the migration lock (skipped on dry runs)
    /// 3. Execute pending changesets in order, recording each outcome
    /// 4. Release the lock, whether the run succeeded or not
    pub async fn run(&self) -> Result<MigrationSummary, MigrationError> {
        validate_registry(&self.change_logs)?;
        let params = self.config.params();

        if params.dry_run {
            info!("🔍 Dry run: changesets are evaluated but nothing is written");
            return self.execute_pending().await;
        }

        let lock = self.config.lock();
        match lock.acquire_lock(MIGRATION_LOCK_KEY, &self.execution_id, params.lock_expiry_seconds).await? {
            LockResult::Acquired => debug!(execution_id = %self.execution_id, "Migration lock acquired"),
            LockResult::AlreadyHeld(owner) => {
                return Err(MigrationError::MigrationInProgress { key: MIGRATION_LOCK_KEY.to_string(), owner });
            }
            other => {
                return Err(MigrationError::MigrationInProgress {
                    key: MIGRATION_LOCK_KEY.to_string(),
                    owner: format!("unknown ({:?})", other),
                });
            }
        }

        let result = self.execute_pending().await;

        match lock.release_lock(MIGRATION_LOCK_KEY, &self.execution_id).await {
            Ok(LockResult::Released) => debug!(execution_id = %self.execution_id, "Migration lock released"),
            Ok(other) => warn!(result = ?other, "Migration lock was not held at release"),
            Err(err) => {
                warn!(error = %err, "Failed to release migration lock");
                if result.is_ok() {
                    return Err(err.into());
                }
            }
        }

        result
    }

    async fn execute_pending(&self) -> Result<MigrationSummary, MigrationError> {
        let params = self.config.params();
        let history = self.read_history().await?;
        let status = self.status_from_history(&history);

        let mut summary =
            MigrationSummary { executed: vec![], already_applied: status.applied.len(), dry_run: params.dry_run };
        if status.pending.is_empty() {
            info!("✅ All {} changesets already applied", summary.already_applied);
            return Ok(summary);
        }

        info!(
            "🔄 Starting migration: {} pending, {} already applied",
            status.pending.len(),
            summary.already_applied
        );

        for change_log in &self.change_logs {
            for definition in &change_log.change_sets {
                if history.executed_at(change_log, definition).is_some() {
                    debug!(change_log = change_log.name, change_id = definition.id, "Already applied, skipping");
                    continue;
                }
                if self.abort_flag.load(Ordering::Relaxed) {
                    warn!("⚠️  Migration aborted before '{}'", definition.id);
                    return Err(MigrationError::Aborted);
                }
                if !params.dry_run {
                    self.extend_lock().await?;
                }

                let report = self.execute_change_set(change_log.name, definition).await?;
                summary.executed.push(ExecutedChangeSet { change_log: change_log.name, id: definition.id, report });
            }
        }

        info!("🎉 Migration completed: {} changeset(s) executed", summary.executed.len());
        Ok(summary)
    }

    /// The lock may have expired during a long changeset and been taken by another runner.
    async fn extend_lock(&self) -> Result<(), MigrationError> {
        let expiry_seconds = self.config.params().lock_expiry_seconds;
        match self.config.lock().extend_lock(MIGRATION_LOCK_KEY, &self.execution_id, expiry_seconds).await? {
            LockResult::Extended => Ok(()),
            _ => Err(LockError::LockNotOwned { key: MIGRATION_LOCK_KEY.to_string(), owner: self.execution_id.clone() }
                .into()),
        }
    }

    async fn execute_change_set(
        &self,
        change_log: &'static str,
        definition: &ChangeSetDefinition,
    ) -> Result<ChangeSetReport, MigrationError> {
        let params = self.config.params();
        let span =
            info_span!("change_set", change_log = change_log, order = definition.order, change_id = definition.id);
        info!(parent: &span, "📦 Applying '{}' ({} #{})", definition.id, change_log, definition.order);

        let ctx = MigrationContext::new(
            self.config.database(),
            self.config.countries(),
            params.dry_run,
            self.abort_flag.clone(),
        )
        .with_progress_callback(Box::new(|progress| {
            debug!("   Progress: [{}/{}] {}", progress.current_step, progress.total_steps, progress.message);
        }));

        let start_time = Instant::now();
        let outcome = definition.change_set.execute(&ctx).instrument(span.clone()).await;
        let execution_millis = start_time.elapsed().as_millis() as u64;

        match outcome {
            Ok(report) => {
                info!(
                    parent: &span,
                    matched = report.matched,
                    modified = report.modified,
                    skipped = report.skipped,
                    "✅ Applied '{}' in {}ms",
                    definition.id,
                    execution_millis
                );
                if !params.dry_run {
                    self.record(change_log, definition, ChangeState::Executed, execution_millis, report).await?;
                }
                Ok(report)
            }
            Err(MigrationError::Aborted) => {
                warn!(parent: &span, "⚠️  '{}' aborted, not recorded", definition.id);
                Err(MigrationError::Aborted)
            }
            Err(err) => {
                error!(parent: &span, error = %err, "❌ '{}' failed", definition.id);
                if !params.dry_run {
                    if let Err(record_err) = self
                        .record(change_log, definition, ChangeState::Failed, execution_millis, ChangeSetReport::default())
                        .await
                    {
                        warn!(error = %record_err, "Failed to record changeset failure");
                    }
                }
                Err(MigrationError::ChangeSetFailed {
                    change_log: change_log.to_string(),
                    order: definition.order.to_string(),
                    id: definition.id.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    async fn record(
        &self,
        change_log: &'static str,
        definition: &ChangeSetDefinition,
        state: ChangeState,
        execution_millis: u64,
        report: ChangeSetReport,
    ) -> Result<(), MigrationError> {
        let entry = ChangeEntry {
            execution_id: self.execution_id.clone(),
            change_id: definition.id.to_string(),
            author: definition.author.to_string(),
            change_log: change_log.to_string(),
            order: definition.order.to_string(),
            state,
            executed_at: Utc::now(),
            execution_millis,
            report,
        };
        self.config.database().insert_change_entry(&self.config.params().change_log_collection, entry).await?;
        Ok(())
    }
}
