use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome recorded for a changeset execution.
///
/// Only `Executed` counts as applied. The other states are written by Mongock and read back as-is.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeState {
    #[default]
    Executed,
    Failed,
    Ignored,
    RolledBack,
    RollbackFailed,
}

impl fmt::Display for ChangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeState::Executed => write!(f, "EXECUTED"),
            ChangeState::Failed => write!(f, "FAILED"),
            ChangeState::Ignored => write!(f, "IGNORED"),
            ChangeState::RolledBack => write!(f, "ROLLED_BACK"),
            ChangeState::RollbackFailed => write!(f, "ROLLBACK_FAILED"),
        }
    }
}

/// Document counts produced by a changeset or script.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSetReport {
    /// Documents selected by the changeset's filter.
    pub matched: u64,
    /// Documents actually rewritten (or that would be, on a dry run).
    pub modified: u64,
    /// Documents selected but left untouched.
    pub skipped: u64,
}

impl ChangeSetReport {
    pub fn merge(&mut self, other: ChangeSetReport) {
        self.matched += other.matched;
        self.modified += other.modified;
        self.skipped += other.skipped;
    }
}

/// A row of the change-log collection.
///
/// Field names follow the layout already present in the exports database, so rows
/// written by Mongock, and by Mongobee in its own collection, decode too. Fields
/// missing from those older rows fall back to their defaults; a row without a
/// `state` was executed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    #[serde(default)]
    pub execution_id: String,
    pub change_id: String,
    pub author: String,
    #[serde(default)]
    pub change_log: String,
    #[serde(default)]
    pub order: String,
    #[serde(default)]
    pub state: ChangeState,
    #[serde(rename = "timestamp", with = "chrono_datetime_as_bson_datetime")]
    pub executed_at: DateTime<Utc>,
    #[serde(default)]
    pub execution_millis: u64,
    #[serde(default)]
    pub report: ChangeSetReport,
}

impl ChangeEntry {
    /// Whether this entry marks `(change_id, author)` as already applied.
    pub fn is_executed(&self, change_id: &str, author: &str) -> bool {
        self.state == ChangeState::Executed && self.change_id == change_id && self.author == author
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mongodb::bson::{self, doc, oid::ObjectId, Document};
    use rstest::*;

    fn executed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 3, 11, 9, 30, 0).unwrap()
    }

    #[fixture]
    fn mongock_v3_row() -> Document {
        doc! {
            "_id": ObjectId::new(),
            "changeId": "CEDS-2247 Change routing countries structure",
            "author": "Patryk Rudnicki",
            "timestamp": bson::DateTime::from_chrono(executed_at()),
            "changeLogClass": "uk.gov.hmrc.exports.mongock.changesets.ExportsCacheChangelog",
            "changeSetMethod": "changeRoutingCountriesStructure",
            "executionMillis": 1200_i64,
            "metadata": bson::Bson::Null,
        }
    }

    #[rstest]
    fn mongock_v3_row_reads_as_executed(mongock_v3_row: Document) {
        let entry: ChangeEntry = bson::from_document(mongock_v3_row).unwrap();

        assert_eq!(entry.state, ChangeState::Executed);
        assert_eq!(entry.executed_at, executed_at());
        assert_eq!(entry.execution_millis, 1200);
        assert_eq!(entry.execution_id, "");
        assert_eq!(entry.report, ChangeSetReport::default());
        assert!(entry.is_executed("CEDS-2247 Change routing countries structure", "Patryk Rudnicki"));
    }

    #[test]
    fn mongobee_row_reads_as_executed() {
        let row = doc! {
            "_id": ObjectId::new(),
            "changeId": "CEDS-2111 Move LRN to root of document",
            "author": "Paulo Monteiro",
            "timestamp": bson::DateTime::from_chrono(executed_at()),
            "changeLogClass": "uk.gov.hmrc.exports.mongobee.DeclarationsChangelog",
            "changeSetMethod": "moveLrnToRootOfDocument",
        };

        let entry: ChangeEntry = bson::from_document(row).unwrap();

        assert!(entry.is_executed("CEDS-2111 Move LRN to root of document", "Paulo Monteiro"));
    }

    #[rstest]
    #[case::ignored("IGNORED", ChangeState::Ignored)]
    #[case::rolled_back("ROLLED_BACK", ChangeState::RolledBack)]
    #[case::rollback_failed("ROLLBACK_FAILED", ChangeState::RollbackFailed)]
    #[case::failed("FAILED", ChangeState::Failed)]
    fn other_mongock_states_are_not_applied(
        mut mongock_v3_row: Document,
        #[case] state: &str,
        #[case] expected: ChangeState,
    ) {
        mongock_v3_row.insert("state", state);

        let entry: ChangeEntry = bson::from_document(mongock_v3_row).unwrap();

        assert_eq!(entry.state, expected);
        assert_eq!(entry.state.to_string(), state);
        assert!(!entry.is_executed("CEDS-2247 Change routing countries structure", "Patryk Rudnicki"));
    }

    #[test]
    fn written_entries_keep_the_mongock_layout() {
        let entry = ChangeEntry {
            execution_id: "run-1".to_string(),
            change_id: "Exports DB Baseline".to_string(),
            author: "Paulo Monteiro".to_string(),
            change_log: "exports-cache".to_string(),
            order: "001".to_string(),
            state: ChangeState::RolledBack,
            executed_at: executed_at(),
            execution_millis: 3,
            report: ChangeSetReport::default(),
        };

        let document = bson::to_document(&entry).unwrap();

        assert_eq!(document.get_str("state").unwrap(), "ROLLED_BACK");
        assert_eq!(document.get_str("changeId").unwrap(), "Exports DB Baseline");
        assert_eq!(document.get_datetime("timestamp").unwrap().to_chrono(), executed_at());
    }
}
