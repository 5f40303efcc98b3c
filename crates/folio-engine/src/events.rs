//! # Renumbering Events
//!
//! Notifications for whatever sits in front of the engine (CLI, desktop
//! shell, report writer). Implement [`RenumberEventEmitter`] to receive them.
//!
//! ```text
//!   phase ──► progress × N ──► summary
//!
//!   "commit"    1/3, 2/3, 3/3  ──► CommitOutcome
//!   "resubmit"  1/3, 2/3, 3/3  ──► ResubmitOutcome (per-item table)
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use folio_core::{CommitOutcome, OutcomeClass, ResubmitOutcome};

/// Long-running phases that report progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Search,
    Preview,
    Commit,
    Resubmit,
    ResetStuck,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Search => write!(f, "search"),
            Phase::Preview => write!(f, "preview"),
            Phase::Commit => write!(f, "commit"),
            Phase::Resubmit => write!(f, "resubmit"),
            Phase::ResetStuck => write!(f, "reset_stuck"),
        }
    }
}

/// Progress through one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressEvent {
    pub phase: Phase,
    /// Items finished so far.
    pub current: usize,
    pub total: usize,
    /// Error messages collected so far in this phase.
    pub errors: Vec<String>,
}

/// Receiver of workflow notifications.
pub trait RenumberEventEmitter: Send + Sync {
    fn emit_phase(&self, phase: Phase);

    fn emit_progress(&self, event: &ProgressEvent);

    fn emit_commit_summary(&self, outcome: &CommitOutcome);

    fn emit_resubmit_report(&self, outcome: &ResubmitOutcome);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl RenumberEventEmitter for NoOpEmitter {
    fn emit_phase(&self, _phase: Phase) {}
    fn emit_progress(&self, _event: &ProgressEvent) {}
    fn emit_commit_summary(&self, _outcome: &CommitOutcome) {}
    fn emit_resubmit_report(&self, _outcome: &ResubmitOutcome) {}
}

/// Writes every event to the `tracing` subscriber.
pub struct TracingEmitter;

impl RenumberEventEmitter for TracingEmitter {
    fn emit_phase(&self, phase: Phase) {
        info!(phase = %phase, "Phase started");
    }

    fn emit_progress(&self, event: &ProgressEvent) {
        info!(
            phase = %event.phase,
            current = event.current,
            total = event.total,
            errors = event.errors.len(),
            "Progress"
        );
    }

    fn emit_commit_summary(&self, outcome: &CommitOutcome) {
        match outcome.class() {
            OutcomeClass::FullSuccess => info!(
                committed = outcome.committed_count(),
                counter = ?outcome.counter,
                "Renumbering fully succeeded"
            ),
            OutcomeClass::PartialSuccess => warn!(
                committed = outcome.committed_count(),
                errors = outcome.errors.len(),
                "Renumbering partially succeeded"
            ),
            OutcomeClass::FullFailure => warn!(errors = outcome.errors.len(), "Renumbering fully failed"),
        }

        for error in &outcome.errors {
            warn!(document = %error.old_number, error = %error.error, "Not renumbered");
        }
        if let Some(ref error) = outcome.counter_error {
            warn!(error = %error, "Counter update failed; renumbered documents were kept");
        }
        if outcome.cancelled {
            warn!("Commit was cancelled before the last document");
        }
    }

    fn emit_resubmit_report(&self, outcome: &ResubmitOutcome) {
        for item in &outcome.items {
            info!(
                number = %item.number,
                success = item.success,
                status = ?item.status,
                message = item.message.as_deref().unwrap_or(""),
                "Resubmission result"
            );
        }

        info!(
            class = ?outcome.class(),
            total = outcome.total(),
            accepted = outcome.accepted,
            rejected = outcome.rejected,
            other = outcome.other,
            cancelled = outcome.cancelled,
            "Resubmission finished"
        );
    }
}
