//! # Resubmission Orchestrator
//!
//! Sends renumbered documents back to the validation authority, strictly
//! one at a time and paced.
//!
//! ## Per-Item Lifecycle
//! ```text
//!   NOT_SENT ──► CALLING ──┬── call ok  ──► re-read store ──► ACCEPTED | REJECTED | (pending…)
//!                          └── call err ──► ERROR (message = error text)
//!
//!   sleep(delay) between consecutive items, interruptible by cancellation
//! ```
//!
//! The call result only says whether the authority took the request. The
//! status in the report is always the one read back from the store.

use std::time::Duration;
use tracing::{debug, info, warn};

use folio_core::{PreviewEntry, ResubmitItem, ResubmitItemStatus, ResubmitOutcome};

use crate::authority::ValidationAuthority;
use crate::cancel::CancelToken;
use crate::error::EngineError;
use crate::events::{Phase, ProgressEvent, RenumberEventEmitter};
use crate::store::{bounded, DocumentStore};

/// Timing knobs for a resubmission run.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Pause between consecutive items.
    pub delay: Duration,
    /// Bound on each authority call.
    pub call_timeout: Duration,
    /// Bound on each store read.
    pub store_timeout: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            delay: Duration::from_millis(1000),
            call_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
        }
    }
}

/// Sequential, paced resubmission.
pub struct Resubmitter<'a> {
    store: &'a dyn DocumentStore,
    authority: &'a dyn ValidationAuthority,
    emitter: &'a dyn RenumberEventEmitter,
    pacing: Pacing,
}

impl<'a> Resubmitter<'a> {
    pub fn new(
        store: &'a dyn DocumentStore,
        authority: &'a dyn ValidationAuthority,
        emitter: &'a dyn RenumberEventEmitter,
        pacing: Pacing,
    ) -> Self {
        Resubmitter {
            store,
            authority,
            emitter,
            pacing,
        }
    }

    /// Resubmits `targets` in order. Safe to run again on the same set.
    pub async fn run(&self, targets: &[PreviewEntry], cancel: &CancelToken) -> ResubmitOutcome {
        let total = targets.len();
        let mut items = Vec::with_capacity(total);
        let mut errors = Vec::new();
        let mut cancelled = false;

        info!(documents = total, delay_ms = self.pacing.delay.as_millis() as u64, "Resubmitting");

        for (index, target) in targets.iter().enumerate() {
            if index > 0 && !cancel.sleep(self.pacing.delay).await {
                cancelled = true;
            }
            if cancelled || cancel.is_cancelled() {
                warn!(done = index, total, "Resubmission cancelled");
                cancelled = true;
                break;
            }

            let item = self.resubmit_one(target).await;
            if item.status == ResubmitItemStatus::Error {
                errors.push(item.message.clone().unwrap_or_default());
            }
            items.push(item);

            self.emitter.emit_progress(&ProgressEvent {
                phase: Phase::Resubmit,
                current: index + 1,
                total,
                errors: errors.clone(),
            });
        }

        let outcome = ResubmitOutcome::from_items(items, total, cancelled);
        info!(
            accepted = outcome.accepted,
            rejected = outcome.rejected,
            other = outcome.other,
            "Resubmission finished"
        );
        outcome
    }

    async fn resubmit_one(&self, target: &PreviewEntry) -> ResubmitItem {
        debug!(document_id = %target.document_id, number = %target.new_number, "Calling authority");

        let call = bounded(
            "authority submit",
            self.pacing.call_timeout,
            self.authority.submit(&target.document_id),
        )
        .await;

        let receipt = match call {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(document_id = %target.document_id, number = %target.new_number, error = %e, "Submission failed");
                return error_item(target, &e);
            }
        };

        let reread = bounded(
            "get_document",
            self.pacing.store_timeout,
            self.store.get_document(&target.document_id),
        )
        .await;

        match reread {
            Ok(Some(doc)) => ResubmitItem {
                document_id: target.document_id.clone(),
                number: doc.number,
                success: receipt.success,
                status: doc.submission_status.into(),
                message: doc.response_description.or(receipt.message),
            },
            Ok(None) => error_item(target, &EngineError::DocumentNotFound(target.document_id.clone())),
            Err(e) => {
                warn!(document_id = %target.document_id, error = %e, "Status read-back failed");
                ResubmitItem {
                    success: receipt.success,
                    ..error_item(target, &e)
                }
            }
        }
    }
}

fn error_item(target: &PreviewEntry, error: &EngineError) -> ResubmitItem {
    ResubmitItem {
        document_id: target.document_id.clone(),
        number: target.new_number.clone(),
        success: false,
        status: ResubmitItemStatus::Error,
        message: Some(error.to_string()),
    }
}
