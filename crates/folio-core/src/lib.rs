//! # folio-core: Pure Renumbering Logic for Folio
//!
//! This crate holds every decision the renumbering engine makes that does
//! not need I/O: which documents are problematic, which ones a search
//! returns, which correlative each one receives, and which phase the
//! operator's session is in.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Folio Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/folio-runner (job runner)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          folio-engine (commit, resubmit, workflow)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ folio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │classifier │  │ selector  │  │ allocator │  │  session  │  │   │
//! │  │   │ suspect   │  │ filter &  │  │ gap-free  │  │  phase    │  │   │
//! │  │   │ duplicate │  │ order     │  │ numbering │  │  FSM      │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  folio-db (SQLite document store)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Document, SeriesCounter, status enums, number formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Series / filter validation
//! - [`classifier`] - Suspect-duplicate and transient-error heuristics
//! - [`selector`] - Candidate filtering and ordering
//! - [`allocator`] - Gap-free correlative allocation
//! - [`outcome`] - Commit / resubmission result aggregation
//! - [`session`] - Renumbering session state machine
//! - [`stuck`] - Detection of documents stuck on transient failures
//!
//! ## Example Usage
//!
//! ```rust
//! use folio_core::format_document_number;
//! use folio_core::classifier::is_suspect_duplicate;
//! use folio_core::SubmissionStatus;
//!
//! assert_eq!(format_document_number("F002", 51), "F002-00000051");
//! assert!(is_suspect_duplicate(
//!     SubmissionStatus::Accepted,
//!     Some("2033"),
//!     Some("ya existe el comprobante"),
//! ));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocator;
pub mod classifier;
pub mod error;
pub mod outcome;
pub mod selector;
pub mod session;
pub mod stuck;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocator::{Allocation, DuplicatePolicy, PreviewEntry};
pub use classifier::{DuplicateClassifier, SignatureClassifier, TransientErrorClassifier};
pub use error::{CoreError, CoreResult, ValidationError};
pub use outcome::{
    CommitError, CommitOutcome, OutcomeClass, ResubmitItem, ResubmitItemStatus, ResubmitOutcome,
};
pub use selector::{SelectionCriteria, StatusMode};
pub use session::{RenumberSession, SessionEvent, SessionState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tenant ID (single-tenant runtime with multi-tenant schema).
pub const DEFAULT_TENANT_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Width of the zero-padded correlative in a display number (`F001-00000042`).
pub const CORRELATIVE_WIDTH: usize = 8;

/// Exact length of a series code (`F001`, `B001`, `FC01`).
pub const SERIES_LEN: usize = 4;

/// Largest correlative that still fits in [`CORRELATIVE_WIDTH`] digits.
pub const MAX_CORRELATIVE: i64 = 99_999_999;
