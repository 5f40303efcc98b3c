//! # Stuck Document Detection
//!
//! Finds documents that will never leave their current status on their own:
//!
//! - `rejected` because the authority was unreachable (transient marker in
//!   the response code or description)
//! - `sending` for longer than a grace period
//!
//! Both are safe to put back to `pending`. The write happens in the engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::classifier::TransientErrorClassifier;
use crate::types::{Document, SubmissionStatus};

/// Prefix written into the description of a reset document.
pub const RESET_PREFIX: &str = "[RESET] previous error: ";

/// Why a document counts as stuck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StuckReason {
    /// Rejected with an outage signature.
    TransientRejection { error: String },
    /// Still `sending` since `since`.
    SendingTimedOut {
        #[ts(as = "String")]
        since: DateTime<Utc>,
    },
}

impl StuckReason {
    /// Description stored on the document after the reset.
    pub fn reset_description(&self) -> String {
        match self {
            StuckReason::TransientRejection { error } => format!("{}{}", RESET_PREFIX, error),
            StuckReason::SendingTimedOut { since } => {
                format!("{}sending since {}", RESET_PREFIX, since.to_rfc3339())
            }
        }
    }
}

/// A document selected for reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StuckDocument {
    pub document_id: String,
    pub number: String,
    pub reason: StuckReason,
}

/// Scans `documents` for stuck entries, in the order given.
pub fn find_stuck_documents(
    documents: &[Document],
    classifier: &TransientErrorClassifier,
    sending_grace: Duration,
    now: DateTime<Utc>,
) -> Vec<StuckDocument> {
    documents
        .iter()
        .filter_map(|doc| {
            let reason = match doc.submission_status {
                SubmissionStatus::Rejected => classifier
                    .transient_error(doc.response_code.as_deref(), doc.response_description.as_deref())
                    .map(|error| StuckReason::TransientRejection {
                        error: error.to_string(),
                    }),
                SubmissionStatus::Sending if now - doc.updated_at > sending_grace => {
                    Some(StuckReason::SendingTimedOut {
                        since: doc.updated_at,
                    })
                }
                _ => None,
            }?;

            Some(StuckDocument {
                document_id: doc.id.clone(),
                number: doc.number.clone(),
                reason,
            })
        })
        .collect()
}
