//! # Domain Types
//!
//! Core domain types used throughout Folio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────┐   ┌─────────────────┐   │
//! │  │     Document        │   │  SeriesCounter  │   │ RenumberAudit   │   │
//! │  │  ─────────────────  │   │  ─────────────  │   │  ─────────────  │   │
//! │  │  id                 │   │  document_type  │   │  previous_number│   │
//! │  │  series  ┐          │   │  series         │   │  renumbered_at  │   │
//! │  │  correlative ├► number │ │  last_number    │   └─────────────────┘   │
//! │  │  submission_status  │   └─────────────────┘                         │
//! │  │  response_code/desc │                                                │
//! │  └─────────────────────┘                                                │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │  DocumentType   │   │ SubmissionStatus │   │ CounterUpdate   │      │
//! │  │  Invoice        │   │  Pending         │   │  Raised         │      │
//! │  │  Receipt        │   │  Sending         │   │  Created        │      │
//! │  │  CreditNote     │   │  Accepted        │   │  Unchanged      │      │
//! │  │  DebitNote      │   │  Rejected        │   └─────────────────┘      │
//! │  └─────────────────┘   └──────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Display Number Invariant
//! `number` is always `series + "-" + zeroPad(correlative_number, 8)`. It is
//! never edited on its own; [`Document::renumbered`] rewrites all three
//! fields together.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::CORRELATIVE_WIDTH;

// =============================================================================
// Document Number Formatting
// =============================================================================

/// Builds the display number for a series and correlative.
///
/// ```rust
/// use folio_core::format_document_number;
///
/// assert_eq!(format_document_number("B001", 7), "B001-00000007");
/// ```
pub fn format_document_number(series: &str, correlative: i64) -> String {
    format!("{}-{:0width$}", series, correlative, width = CORRELATIVE_WIDTH)
}

// =============================================================================
// Document Type
// =============================================================================

/// Kind of electronic document issued to the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    Receipt,
    CreditNote,
    DebitNote,
}

impl DocumentType {
    /// Wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Receipt => "receipt",
            DocumentType::CreditNote => "credit_note",
            DocumentType::DebitNote => "debit_note",
        }
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Invoice
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "invoice" => Ok(DocumentType::Invoice),
            "receipt" => Ok(DocumentType::Receipt),
            "credit_note" => Ok(DocumentType::CreditNote),
            "debit_note" => Ok(DocumentType::DebitNote),
            _ => Err(ValidationError::NotAllowed {
                field: "document_type".to_string(),
                allowed: vec![
                    "invoice".into(),
                    "receipt".into(),
                    "credit_note".into(),
                    "debit_note".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Submission Status
// =============================================================================

/// Where a document stands with the validation authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Not yet sent (or reset for resubmission).
    Pending,
    /// Handed to the authority, final status not yet known.
    Sending,
    /// Accepted by the authority.
    Accepted,
    /// Rejected by the authority.
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Sending => "sending",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Rejected => "rejected",
        }
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::Pending
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SubmissionStatus::Pending),
            "sending" => Ok(SubmissionStatus::Sending),
            "accepted" => Ok(SubmissionStatus::Accepted),
            "rejected" => Ok(SubmissionStatus::Rejected),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec![
                    "pending".into(),
                    "sending".into(),
                    "accepted".into(),
                    "rejected".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Renumber Audit
// =============================================================================

/// Last renumbering applied to a document. Replaced on every renumbering;
/// the full history lives in the append-only audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenumberAudit {
    pub previous_number: String,
    #[ts(as = "String")]
    pub renumbered_at: DateTime<Utc>,
}

// =============================================================================
// Document
// =============================================================================

/// An electronic invoice, receipt, or note as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Document {
    /// Opaque identifier.
    pub id: String,

    /// Tenant this document belongs to.
    pub tenant_id: String,

    pub document_type: DocumentType,

    /// Series code (`F001`).
    pub series: String,

    /// Sequential component, unique within the series.
    pub correlative_number: i64,

    /// Display number, derived from series and correlative.
    pub number: String,

    pub submission_status: SubmissionStatus,

    /// Code returned by the authority.
    pub response_code: Option<String>,

    /// Free-text message returned by the authority.
    pub response_description: Option<String>,

    /// Hash of the signed payload sent to the authority.
    pub signature_hash: Option<String>,

    /// Hash of the authority's receipt (CDR).
    pub receipt_hash: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    pub renumber_audit: Option<RenumberAudit>,
}

impl Document {
    /// Returns the number as it should read for the current series and correlative.
    pub fn expected_number(&self) -> String {
        format_document_number(&self.series, self.correlative_number)
    }

    /// Whether the stored display number agrees with series and correlative.
    pub fn number_is_consistent(&self) -> bool {
        self.number == self.expected_number()
    }

    /// Returns a copy carrying the new series/correlative, reset for resubmission.
    ///
    /// Clears every validation artifact and overwrites the audit with the
    /// number the document had before this call.
    pub fn renumbered(&self, series: &str, correlative: i64, at: DateTime<Utc>) -> Document {
        Document {
            series: series.to_string(),
            correlative_number: correlative,
            number: format_document_number(series, correlative),
            submission_status: SubmissionStatus::Pending,
            response_code: None,
            response_description: None,
            signature_hash: None,
            receipt_hash: None,
            updated_at: at,
            renumber_audit: Some(RenumberAudit {
                previous_number: self.number.clone(),
                renumbered_at: at,
            }),
            ..self.clone()
        }
    }
}

// =============================================================================
// Series Counter
// =============================================================================

/// Shared per-document-type counter: the active series and its last issued
/// correlative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SeriesCounter {
    pub document_type: DocumentType,
    pub series: String,
    pub last_number: i64,
}

/// How a commit treats a counter that tracks a different series than the
/// renumbering target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CounterPolicy {
    /// Only raise the counter when it already tracks the target series.
    KeepActiveSeries,
    /// Switch (or create) the counter to the target series.
    PromoteTarget,
}

impl Default for CounterPolicy {
    fn default() -> Self {
        CounterPolicy::KeepActiveSeries
    }
}

impl FromStr for CounterPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep_active_series" => Ok(CounterPolicy::KeepActiveSeries),
            "promote_target" => Ok(CounterPolicy::PromoteTarget),
            _ => Err(ValidationError::NotAllowed {
                field: "counter_policy".to_string(),
                allowed: vec!["keep_active_series".into(), "promote_target".into()],
            }),
        }
    }
}

/// Result of raising a series counter after a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CounterUpdate {
    /// Same series; `last_number` moved from `before` to `after` (may be equal).
    Raised {
        series: String,
        before: i64,
        after: i64,
    },
    /// The counter row did not exist, or was switched to the target series.
    Created { series: String, last_number: i64 },
    /// The counter tracks another series and was left untouched.
    Unchanged { active_series: Option<String> },
}

// =============================================================================
// Renumber Audit Log
// =============================================================================

/// One row of the append-only renumbering history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenumberAuditEntry {
    pub id: String,
    pub document_id: String,
    pub previous_number: String,
    pub new_number: String,
    #[ts(as = "String")]
    pub renumbered_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
