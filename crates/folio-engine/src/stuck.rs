//! # Stuck Document Reset
//!
//! Puts documents that an authority outage left behind back to `pending`
//! so the next resubmission picks them up. Detection is the pure
//! [`folio_core::stuck::find_stuck_documents`]; this module only writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use ts_rs::TS;

use folio_core::stuck::{find_stuck_documents, StuckDocument};
use folio_core::{CommitError, TransientErrorClassifier};

use crate::error::EngineResult;
use crate::events::{Phase, ProgressEvent, RenumberEventEmitter};
use crate::store::{bounded, DocumentStore};

/// Result of one reset sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResetOutcome {
    pub reset: Vec<StuckDocument>,
    pub errors: Vec<CommitError>,
}

/// Finds and resets every stuck document of the tenant.
///
/// Only the initial listing can fail the sweep. Per-document write errors
/// land in [`ResetOutcome::errors`].
pub async fn reset_stuck(
    store: &dyn DocumentStore,
    classifier: &TransientErrorClassifier,
    sending_grace: chrono::Duration,
    now: DateTime<Utc>,
    store_timeout: Duration,
    emitter: &dyn RenumberEventEmitter,
) -> EngineResult<ResetOutcome> {
    emitter.emit_phase(Phase::ResetStuck);

    let documents = bounded("list_documents", store_timeout, store.list_documents()).await?;
    let stuck = find_stuck_documents(&documents, classifier, sending_grace, now);
    let total = stuck.len();
    info!(scanned = documents.len(), stuck = total, "Stuck documents found");

    let mut outcome = ResetOutcome::default();
    for (index, item) in stuck.into_iter().enumerate() {
        let description = item.reason.reset_description();
        let result = bounded(
            "reset_to_pending",
            store_timeout,
            store.reset_to_pending(&item.document_id, &description),
        )
        .await;

        match result {
            Ok(()) => {
                info!(document_id = %item.document_id, number = %item.number, "Document reset to pending");
                outcome.reset.push(item);
            }
            Err(e) => {
                warn!(document_id = %item.document_id, error = %e, "Reset failed");
                outcome.errors.push(CommitError {
                    document_id: item.document_id,
                    old_number: item.number,
                    error: e.to_string(),
                });
            }
        }

        emitter.emit_progress(&ProgressEvent {
            phase: Phase::ResetStuck,
            current: index + 1,
            total,
            errors: outcome.errors.iter().map(|e| e.error.clone()).collect(),
        });
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoOpEmitter;
    use crate::testing::{doc, t0, MemoryStore};
    use folio_core::stuck::RESET_PREFIX;
    use folio_core::SubmissionStatus;

    #[tokio::test]
    async fn test_reset_stuck_documents() {
        let mut outage = doc("outage", "F001", 1, SubmissionStatus::Rejected, 1);
        outage.response_code = Some("0109".into());
        outage.response_description = Some("El servicio no está disponible".into());

        let real = doc("real", "F001", 2, SubmissionStatus::Rejected, 2);

        let mut sending_old = doc("sending-old", "F001", 3, SubmissionStatus::Sending, 3);
        sending_old.updated_at = t0();
        let mut sending_new = doc("sending-new", "F001", 4, SubmissionStatus::Sending, 4);
        sending_new.updated_at = t0() + chrono::Duration::minutes(9);

        let store = MemoryStore::new(vec![outage, real, sending_old, sending_new]);
        let now = t0() + chrono::Duration::minutes(10);

        let outcome = reset_stuck(
            &*store,
            &TransientErrorClassifier::default(),
            chrono::Duration::minutes(5),
            now,
            Duration::from_secs(10),
            &NoOpEmitter,
        )
        .await
        .unwrap();

        let ids: Vec<_> = outcome.reset.iter().map(|s| s.document_id.as_str()).collect();
        assert_eq!(ids, vec!["outage", "sending-old"]);
        assert!(outcome.errors.is_empty());

        let reset = store.document("outage");
        assert_eq!(reset.submission_status, SubmissionStatus::Pending);
        assert!(reset.response_code.is_none());
        assert_eq!(
            reset.response_description.as_deref(),
            Some(format!("{}0109", RESET_PREFIX).as_str())
        );

        assert_eq!(store.document("real").submission_status, SubmissionStatus::Rejected);
        assert_eq!(store.document("sending-new").submission_status, SubmissionStatus::Sending);
    }

    #[tokio::test]
    async fn test_reset_failures_are_isolated() {
        let mut a = doc("a", "F001", 1, SubmissionStatus::Rejected, 1);
        a.response_description = Some("connect ETIMEDOUT".into());
        let mut b = doc("b", "F001", 2, SubmissionStatus::Rejected, 2);
        b.response_description = Some("connect ECONNREFUSED".into());

        let store = MemoryStore::new(vec![a, b]);
        store.fail_renumber_of("a");

        let outcome = reset_stuck(
            &*store,
            &TransientErrorClassifier::default(),
            chrono::Duration::minutes(5),
            t0(),
            Duration::from_secs(10),
            &NoOpEmitter,
        )
        .await
        .unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].document_id, "a");
        assert_eq!(outcome.reset.len(), 1);
        assert_eq!(store.document("b").submission_status, SubmissionStatus::Pending);
    }
}
