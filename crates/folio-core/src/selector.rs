//! # Candidate Selector
//!
//! Filters and orders the document population for a renumbering session.
//!
//! ## Filter Pipeline
//! ```text
//!   all tenant documents
//!          │
//!          ▼
//!   series filter      series == filter  OR  number starts with filter
//!          │
//!          ▼
//!   document type      (optional) exact match
//!          │
//!          ▼
//!   status mode        All | Problematic | Accepted | SuspectDuplicates | Exactly(s)
//!          │
//!          ▼
//!   response filter    (optional) code == text  OR  description contains text
//!          │
//!          ▼
//!   sort by (created_at, id) ascending
//! ```
//!
//! An empty result is not an error here; the session decides how to report it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::classifier::DuplicateClassifier;
use crate::error::ValidationError;
use crate::types::{Document, DocumentType, SubmissionStatus};
use crate::validation::{validate_free_text, validate_series_filter, ValidationResult};

// =============================================================================
// Status Mode
// =============================================================================

/// Status category a search restricts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StatusMode {
    /// No status filtering (full-series migrations).
    All,
    /// Rejected, pending, sending, or accepted-but-suspect.
    Problematic,
    /// Accepted, suspects included.
    Accepted,
    /// Accepted and flagged by the duplicate classifier.
    SuspectDuplicates,
    /// One explicit status.
    Exactly(SubmissionStatus),
}

impl StatusMode {
    /// Whether a document passes this status predicate.
    pub fn matches(&self, doc: &Document, classifier: &dyn DuplicateClassifier) -> bool {
        let status = doc.submission_status;
        let suspect = || {
            classifier.is_suspect_duplicate(
                status,
                doc.response_code.as_deref(),
                doc.response_description.as_deref(),
            )
        };

        match self {
            StatusMode::All => true,
            StatusMode::Problematic => match status {
                SubmissionStatus::Rejected | SubmissionStatus::Pending | SubmissionStatus::Sending => true,
                SubmissionStatus::Accepted => suspect(),
            },
            StatusMode::Accepted => status == SubmissionStatus::Accepted,
            StatusMode::SuspectDuplicates => status == SubmissionStatus::Accepted && suspect(),
            StatusMode::Exactly(expected) => status == *expected,
        }
    }
}

impl Default for StatusMode {
    fn default() -> Self {
        StatusMode::Problematic
    }
}

impl fmt::Display for StatusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMode::All => f.write_str("all"),
            StatusMode::Problematic => f.write_str("problematic"),
            StatusMode::Accepted => f.write_str("accepted"),
            StatusMode::SuspectDuplicates => f.write_str("suspect_duplicates"),
            StatusMode::Exactly(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusMode::All),
            "problematic" => Ok(StatusMode::Problematic),
            "accepted" => Ok(StatusMode::Accepted),
            "suspect_duplicates" => Ok(StatusMode::SuspectDuplicates),
            other => other
                .parse::<SubmissionStatus>()
                .map(StatusMode::Exactly)
                .map_err(|_| ValidationError::NotAllowed {
                    field: "status".to_string(),
                    allowed: vec![
                        "all".into(),
                        "problematic".into(),
                        "accepted".into(),
                        "suspect_duplicates".into(),
                        "pending".into(),
                        "sending".into(),
                        "rejected".into(),
                    ],
                }),
        }
    }
}

// =============================================================================
// Selection Criteria
// =============================================================================

/// Validated search filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectionCriteria {
    /// Series code or number prefix (upper-cased).
    pub series_filter: String,
    pub document_type: Option<DocumentType>,
    pub status_mode: StatusMode,
    /// Matched against the response code (exact) and description (contains).
    pub response_filter: Option<String>,
}

impl SelectionCriteria {
    /// Builds criteria, validating the series and free-text filters.
    pub fn new(
        series_filter: &str,
        document_type: Option<DocumentType>,
        status_mode: StatusMode,
        response_filter: Option<&str>,
    ) -> ValidationResult<Self> {
        Ok(SelectionCriteria {
            series_filter: validate_series_filter(series_filter)?,
            document_type,
            status_mode,
            response_filter: validate_free_text(response_filter)?,
        })
    }

    fn matches_series(&self, doc: &Document) -> bool {
        doc.series == self.series_filter || doc.number.starts_with(&self.series_filter)
    }

    fn matches_response(&self, doc: &Document) -> bool {
        let Some(text) = &self.response_filter else {
            return true;
        };

        let code_match = doc.response_code.as_deref().is_some_and(|c| c == text);
        let needle = text.to_lowercase();
        let desc_match = doc
            .response_description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle));

        code_match || desc_match
    }
}

// =============================================================================
// Selection
// =============================================================================

/// Filters `documents` by `criteria` and returns candidates in creation order.
pub fn select_candidates(
    documents: &[Document],
    criteria: &SelectionCriteria,
    classifier: &dyn DuplicateClassifier,
) -> Vec<Document> {
    let mut candidates: Vec<Document> = documents
        .iter()
        .filter(|d| criteria.matches_series(d))
        .filter(|d| criteria.document_type.map_or(true, |t| d.document_type == t))
        .filter(|d| criteria.status_mode.matches(d, classifier))
        .filter(|d| criteria.matches_response(d))
        .cloned()
        .collect();

    candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    candidates
}

// =============================================================================
// Unit Tests
// =============================================================================
