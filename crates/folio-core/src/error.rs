//! # Error Types
//!
//! Domain-specific error types for folio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  folio-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Blocks a session phase transition              │
//! │                                                                         │
//! │  folio-db errors (separate crate)                                      │
//! │  └── DbError          - Document store failures                        │
//! │                                                                         │
//! │  folio-engine errors                                                   │
//! │  └── EngineError      - Store, authority, config failures              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → runner              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only [`ValidationError`] ever stops a session from advancing. Per-item
//! failures during commit or resubmission are data, not errors.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Document cannot be found in the loaded population.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input and workflow validation errors.
///
/// ## When This Occurs
/// ```text
/// search  ──► NoCandidates          (nothing matched the filters)
/// preview ──► EmptySelection        (zero documents selected)
///         ──► Required / InvalidFormat (target series missing or malformed)
///         ──► Duplicate             (target series equals a source series,
///                                    or duplicate ids under Reject policy)
/// any     ──► InvalidTransition     (event not allowed in current state)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., malformed series code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (duplicate id, target series equal to a source series).
    #[error("{field} '{value}' is duplicated")]
    Duplicate { field: String, value: String },

    /// The search matched no documents.
    #[error("No documents match the search filters")]
    NoCandidates,

    /// A preview or commit was requested with nothing selected.
    #[error("No documents selected")]
    EmptySelection,

    /// A selected id is not among the loaded candidates.
    #[error("Document {0} is not among the loaded candidates")]
    UnknownCandidate(String),

    /// The target series cannot fit the selection within 8 digits.
    #[error("Series {series} has no room for {requested} more documents (max correlative {max})")]
    RangeExhausted { series: String, requested: usize, max: i64 },

    /// Resubmission requested but the commit phase renumbered nothing.
    #[error("Nothing was committed; there is nothing to resubmit")]
    NothingCommitted,

    /// The event is not valid in the session's current state.
    #[error("Cannot {event} while session is {state}")]
    InvalidTransition { state: String, event: String },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates an InvalidFormat error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
