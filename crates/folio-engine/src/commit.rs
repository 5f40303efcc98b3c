//! # Batch Commit Executor
//!
//! Writes a preview to the store one document at a time, then raises the
//! series counter once.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for entry in preview (in order):                                      │
//! │      cancelled?  ──yes──► stop, outcome.cancelled = true               │
//! │      apply_renumber(entry)  (own transaction, bounded by timeout)      │
//! │          ok   ──► committed += entry                                   │
//! │          err  ──► errors += {old_number, error}, continue              │
//! │                                                                         │
//! │  if committed non-empty:                                               │
//! │      raise_counter(type, target, highest committed, policy)            │
//! │          err  ──► counter_error, documents stay renumbered             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no cross-document transaction. Each document commits on its own
//! and the counter write can fail after documents have moved.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use folio_core::{Allocation, CommitError, CommitOutcome, CounterPolicy};

use crate::cancel::CancelToken;
use crate::events::{Phase, ProgressEvent, RenumberEventEmitter};
use crate::store::{bounded, DocumentStore};

/// Applies an [`Allocation`] to the store.
pub struct CommitExecutor<'a> {
    store: &'a dyn DocumentStore,
    emitter: &'a dyn RenumberEventEmitter,
    counter_policy: CounterPolicy,
    store_timeout: Duration,
}

impl<'a> CommitExecutor<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        emitter: &'a dyn RenumberEventEmitter,
        counter_policy: CounterPolicy,
        store_timeout: Duration,
    ) -> Self {
        CommitExecutor {
            store,
            emitter,
            counter_policy,
            store_timeout,
        }
    }

    /// Commits every entry it can. Never fails as a whole.
    pub async fn run(&self, allocation: &Allocation, cancel: &CancelToken) -> CommitOutcome {
        let total = allocation.len();
        let mut outcome = CommitOutcome {
            requested: total,
            ..Default::default()
        };

        info!(
            target_series = %allocation.target_series,
            document_type = %allocation.document_type,
            documents = total,
            "Committing renumbering"
        );

        for (index, entry) in allocation.entries.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(done = index, total, "Commit cancelled");
                outcome.cancelled = true;
                break;
            }

            let result = bounded(
                "apply_renumber",
                self.store_timeout,
                self.store.apply_renumber(entry, Utc::now()),
            )
            .await;

            match result {
                Ok(_) => {
                    debug!(
                        document_id = %entry.document_id,
                        from = %entry.old_number,
                        to = %entry.new_number,
                        "Document renumbered"
                    );
                    outcome.committed.push(entry.clone());
                }
                Err(e) => {
                    warn!(document_id = %entry.document_id, number = %entry.old_number, error = %e, "Renumber failed");
                    outcome.errors.push(CommitError {
                        document_id: entry.document_id.clone(),
                        old_number: entry.old_number.clone(),
                        error: e.to_string(),
                    });
                }
            }

            self.emitter.emit_progress(&ProgressEvent {
                phase: Phase::Commit,
                current: index + 1,
                total,
                errors: outcome.errors.iter().map(|e| e.error.clone()).collect(),
            });
        }

        if let Some(highest) = outcome.highest_committed() {
            let result = bounded(
                "raise_counter",
                self.store_timeout,
                self.store.raise_counter(
                    allocation.document_type,
                    &allocation.target_series,
                    highest,
                    self.counter_policy,
                ),
            )
            .await;

            match result {
                Ok(update) => outcome.counter = Some(update),
                Err(e) => {
                    error!(
                        document_type = %allocation.document_type,
                        highest,
                        error = %e,
                        "Counter update failed after commit"
                    );
                    outcome.counter_error = Some(e.to_string());
                }
            }
        }

        info!(
            committed = outcome.committed_count(),
            errors = outcome.errors.len(),
            cancelled = outcome.cancelled,
            "Commit finished"
        );
        outcome
    }
}
