//! Registry of change logs and the changesets they declare.

use super::changesets::{declarations, exports_cache};
use super::{MigrationContext, MigrationError};
use crate::types::change_entry::ChangeSetReport;
use async_trait::async_trait;
use std::collections::HashSet;

/// A single run-once mutation of the exports database.
#[async_trait]
pub trait ChangeSet: Send + Sync {
    async fn execute(&self, ctx: &MigrationContext<'_>) -> Result<ChangeSetReport, MigrationError>;
}

/// A changeset together with the identity it is recorded under.
pub struct ChangeSetDefinition {
    /// Position within the change log, compared as a string (`"001"`, `"002"`, ...).
    pub order: &'static str,
    pub id: &'static str,
    pub author: &'static str,
    pub change_set: Box<dyn ChangeSet>,
}

impl ChangeSetDefinition {
    pub fn new(order: &'static str, id: &'static str, author: &'static str, change_set: impl ChangeSet + 'static) -> Self {
        Self { order, id, author, change_set: Box::new(change_set) }
    }
}

/// Ordered group of changesets.
pub struct ChangeLog {
    pub name: &'static str,
    /// Runs recorded in the legacy change-log collection also count as applied.
    pub legacy_history: bool,
    pub change_sets: Vec<ChangeSetDefinition>,
}

/// All change logs, in execution order.
///
/// The legacy declarations log predates the baseline of the cache log and runs first.
pub fn get_change_logs() -> Vec<ChangeLog> {
    vec![declarations::change_log(), exports_cache::change_log()]
}

/// Orders must be strictly ascending within a log and `(id, author)` unique across logs.
pub fn validate_registry(change_logs: &[ChangeLog]) -> Result<(), MigrationError> {
    let mut seen = HashSet::new();
    for change_log in change_logs {
        if change_log.name.is_empty() || change_log.change_sets.is_empty() {
            return Err(MigrationError::EmptyChangeLog { change_log: change_log.name.to_string() });
        }

        let mut previous: Option<&str> = None;
        for definition in &change_log.change_sets {
            if let Some(previous) = previous {
                if definition.order <= previous {
                    return Err(MigrationError::OrderNotAscending {
                        change_log: change_log.name.to_string(),
                        order: definition.order.to_string(),
                        previous: previous.to_string(),
                    });
                }
            }
            previous = Some(definition.order);

            if !seen.insert((definition.id, definition.author)) {
                return Err(MigrationError::DuplicateChangeSet {
                    id: definition.id.to_string(),
                    author: definition.author.to_string(),
                });
            }
        }
    }
    Ok(())
}
