//! # Batch Outcomes
//!
//! Result structures for the commit and resubmission phases.
//!
//! Per-item failures are recorded here as data. A batch never aborts because
//! one document failed, so every summary can be classified:
//!
//! ```text
//!   ok == total        → FullSuccess
//!   0 < ok < total     → PartialSuccess
//!   ok == 0 < total    → FullFailure
//! ```
//!
//! `total` is the batch that was requested, so a cancelled run that left
//! documents untouched is never a full success.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocator::PreviewEntry;
use crate::types::{CounterUpdate, SubmissionStatus};

// =============================================================================
// Outcome Class
// =============================================================================

/// Summary classification shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    FullSuccess,
    PartialSuccess,
    FullFailure,
}

impl OutcomeClass {
    /// Classifies `succeeded` out of `total`. An empty batch counts as success.
    pub fn classify(succeeded: usize, total: usize) -> Self {
        if succeeded >= total {
            OutcomeClass::FullSuccess
        } else if succeeded > 0 {
            OutcomeClass::PartialSuccess
        } else {
            OutcomeClass::FullFailure
        }
    }
}

// =============================================================================
// Commit Outcome
// =============================================================================

/// A document the commit phase could not renumber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitError {
    pub document_id: String,
    pub old_number: String,
    pub error: String,
}

/// What the commit phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitOutcome {
    /// Entries in the preview handed to the commit phase.
    pub requested: usize,
    /// Entries that were written, in preview order.
    pub committed: Vec<PreviewEntry>,
    pub errors: Vec<CommitError>,
    /// Counter result, `None` when nothing committed or the update failed.
    pub counter: Option<CounterUpdate>,
    /// Why the counter update failed. Committed documents stay committed.
    pub counter_error: Option<String>,
    /// Set when cancellation stopped the loop before the last entry.
    pub cancelled: bool,
}

impl CommitOutcome {
    pub fn committed_count(&self) -> usize {
        self.committed.len()
    }

    /// Entries attempted (committed or failed).
    pub fn attempted(&self) -> usize {
        self.committed.len() + self.errors.len()
    }

    /// Highest correlative that actually landed.
    pub fn highest_committed(&self) -> Option<i64> {
        self.committed.iter().map(|e| e.new_correlative).max()
    }

    pub fn class(&self) -> OutcomeClass {
        OutcomeClass::classify(self.committed_count(), self.requested.max(self.attempted()))
    }
}

// =============================================================================
// Resubmission Outcome
// =============================================================================

/// Final per-item status of a resubmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResubmitItemStatus {
    Pending,
    Sending,
    Accepted,
    Rejected,
    /// The call (or the follow-up read) failed or timed out.
    Error,
}

impl From<SubmissionStatus> for ResubmitItemStatus {
    fn from(status: SubmissionStatus) -> Self {
        match status {
            SubmissionStatus::Pending => ResubmitItemStatus::Pending,
            SubmissionStatus::Sending => ResubmitItemStatus::Sending,
            SubmissionStatus::Accepted => ResubmitItemStatus::Accepted,
            SubmissionStatus::Rejected => ResubmitItemStatus::Rejected,
        }
    }
}

/// One row of the resubmission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResubmitItem {
    pub document_id: String,
    pub number: String,
    /// Whether the authority call itself returned success.
    pub success: bool,
    /// Authoritative status read back from the store after the call.
    pub status: ResubmitItemStatus,
    pub message: Option<String>,
}

/// Aggregated resubmission report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResubmitOutcome {
    /// Documents handed to the resubmission phase.
    pub requested: usize,
    pub items: Vec<ResubmitItem>,
    pub accepted: usize,
    pub rejected: usize,
    pub other: usize,
    pub cancelled: bool,
}

impl ResubmitOutcome {
    /// Builds the report and its counts from per-item results.
    ///
    /// Items a cancellation never reached are not counted in `other`.
    pub fn from_items(items: Vec<ResubmitItem>, requested: usize, cancelled: bool) -> Self {
        let accepted = items
            .iter()
            .filter(|i| i.status == ResubmitItemStatus::Accepted)
            .count();
        let rejected = items
            .iter()
            .filter(|i| i.status == ResubmitItemStatus::Rejected)
            .count();

        ResubmitOutcome {
            requested,
            other: items.len() - accepted - rejected,
            items,
            accepted,
            rejected,
            cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.requested.max(self.items.len())
    }

    pub fn class(&self) -> OutcomeClass {
        OutcomeClass::classify(self.accepted, self.total())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, status: ResubmitItemStatus) -> ResubmitItem {
        ResubmitItem {
            document_id: id.into(),
            number: format!("F002-0000005{}", id),
            success: status != ResubmitItemStatus::Error,
            status,
            message: None,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(OutcomeClass::classify(3, 3), OutcomeClass::FullSuccess);
        assert_eq!(OutcomeClass::classify(1, 3), OutcomeClass::PartialSuccess);
        assert_eq!(OutcomeClass::classify(0, 3), OutcomeClass::FullFailure);
        assert_eq!(OutcomeClass::classify(0, 0), OutcomeClass::FullSuccess);
    }

    #[test]
    fn test_resubmit_counts_errors_as_other() {
        let outcome = ResubmitOutcome::from_items(
            vec![
                item("1", ResubmitItemStatus::Accepted),
                item("2", ResubmitItemStatus::Error),
            ],
            2,
            false,
        );
        assert_eq!((outcome.accepted, outcome.rejected, outcome.other), (1, 0, 1));
        assert_eq!(outcome.class(), OutcomeClass::PartialSuccess);
    }

    #[test]
    fn test_resubmit_all_rejected_is_full_failure() {
        let outcome = ResubmitOutcome::from_items(
            vec![
                item("1", ResubmitItemStatus::Rejected),
                item("2", ResubmitItemStatus::Pending),
            ],
            2,
            false,
        );
        assert_eq!((outcome.accepted, outcome.rejected, outcome.other), (0, 1, 1));
        assert_eq!(outcome.class(), OutcomeClass::FullFailure);
    }

    #[test]
    fn test_commit_outcome_class() {
        let entry = PreviewEntry {
            document_id: "A".into(),
            old_number: "F001-00000001".into(),
            new_series: "F002".into(),
            new_correlative: 51,
            new_number: "F002-00000051".into(),
        };
        let error = CommitError {
            document_id: "B".into(),
            old_number: "F001-00000002".into(),
            error: "locked".into(),
        };

        let mut outcome = CommitOutcome {
            committed: vec![entry],
            ..Default::default()
        };
        assert_eq!(outcome.class(), OutcomeClass::FullSuccess);
        assert_eq!(outcome.highest_committed(), Some(51));

        outcome.errors.push(error.clone());
        assert_eq!(outcome.class(), OutcomeClass::PartialSuccess);

        let failed = CommitOutcome {
            errors: vec![error],
            ..Default::default()
        };
        assert_eq!(failed.class(), OutcomeClass::FullFailure);
        assert_eq!(failed.highest_committed(), None);
    }

    #[test]
    fn test_cancelled_batches_classify_against_requested() {
        let report = ResubmitOutcome::from_items(vec![item("1", ResubmitItemStatus::Accepted)], 3, true);
        assert_eq!(report.total(), 3);
        assert_eq!((report.accepted, report.rejected, report.other), (1, 0, 0));
        assert_eq!(report.class(), OutcomeClass::PartialSuccess);

        let untouched = ResubmitOutcome::from_items(vec![], 3, true);
        assert_eq!(untouched.class(), OutcomeClass::FullFailure);

        let commit = CommitOutcome {
            requested: 3,
            committed: vec![PreviewEntry {
                document_id: "A".into(),
                old_number: "F001-00000001".into(),
                new_series: "F002".into(),
                new_correlative: 51,
                new_number: "F002-00000051".into(),
            }],
            cancelled: true,
            ..Default::default()
        };
        assert_eq!(commit.class(), OutcomeClass::PartialSuccess);
    }
}
