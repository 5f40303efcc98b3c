//! # Renumbering Session State Machine
//!
//! Holds the ephemeral state of one operator-driven renumbering run and
//! decides which phase changes are legal. It performs no I/O: the engine
//! does the work and reports it back as a [`SessionEvent`].
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌───────────┐ CandidatesFound ┌──────────────────┐                   │
//! │   │ Searching │────────────────►│ CandidatesLoaded │◄──┐ Select /      │
//! │   └───────────┘   (non-empty)   └────────┬─────────┘   │ Toggle /      │
//! │         ▲                                │             │ SelectAll     │
//! │         │                PreviewRequested│             │               │
//! │         │                                ▼             │               │
//! │         │                         ┌────────────┐───────┘               │
//! │         │                         │ Previewed  │                        │
//! │         │                         └─────┬──────┘                        │
//! │         │                CommitRequested│                               │
//! │         │                               ▼                               │
//! │         │                         ┌────────────┐                        │
//! │         │                         │ Committing │                        │
//! │         │                         └─────┬──────┘                        │
//! │         │                 CommitFinished│                               │
//! │         │                               ▼                               │
//! │         │                         ┌────────────┐  ResubmitRequested    │
//! │         │                         │ Committed  │──────────┐             │
//! │         │                         └────────────┘          ▼             │
//! │         │                         ┌────────────┐   ┌──────────────┐    │
//! │         │                         │    Done    │◄──│ Resubmitting │    │
//! │         │                         └─────┬──────┘   └──────────────┘    │
//! │         │                               │   ResubmitFinished ▲          │
//! │         │                               └────────────────────┘          │
//! │         │                                ResubmitRequested (again)      │
//! │         │                                                               │
//! │   Reset from any state ──────────────────────────────────────────────  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected event returns a [`ValidationError`] and leaves the session
//! exactly as it was.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocator::{allocate, Allocation, DuplicatePolicy, PreviewEntry};
use crate::error::ValidationError;
use crate::outcome::{CommitOutcome, ResubmitOutcome};
use crate::selector::SelectionCriteria;
use crate::types::{Document, DocumentType, SeriesCounter};
use crate::validation::ValidationResult;

// =============================================================================
// States & Events
// =============================================================================

/// Phase of a renumbering session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Searching,
    CandidatesLoaded,
    Previewed,
    Committing,
    Committed,
    Resubmitting,
    Done,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Searching => "searching",
            SessionState::CandidatesLoaded => "candidates_loaded",
            SessionState::Previewed => "previewed",
            SessionState::Committing => "committing",
            SessionState::Committed => "committed",
            SessionState::Resubmitting => "resubmitting",
            SessionState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Something that happened, reported to the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A search ran; `candidates` are already filtered and ordered.
    CandidatesFound {
        criteria: SelectionCriteria,
        candidates: Vec<Document>,
    },
    /// Replace the selection.
    Select { ids: Vec<String> },
    /// Flip one document in or out of the selection.
    Toggle { id: String },
    SelectAll,
    /// Compute the preview against a fresh counter/usage snapshot.
    PreviewRequested {
        target_series: String,
        counter: Option<SeriesCounter>,
        used_correlatives: Vec<i64>,
    },
    CommitRequested,
    CommitFinished(CommitOutcome),
    ResubmitRequested,
    ResubmitFinished(ResubmitOutcome),
    Reset,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::CandidatesFound { .. } => "load candidates",
            SessionEvent::Select { .. } => "select",
            SessionEvent::Toggle { .. } => "toggle",
            SessionEvent::SelectAll => "select all",
            SessionEvent::PreviewRequested { .. } => "preview",
            SessionEvent::CommitRequested => "commit",
            SessionEvent::CommitFinished(_) => "finish commit",
            SessionEvent::ResubmitRequested => "resubmit",
            SessionEvent::ResubmitFinished(_) => "finish resubmit",
            SessionEvent::Reset => "reset",
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Ephemeral state of one renumbering run.
#[derive(Debug, Clone)]
pub struct RenumberSession {
    state: SessionState,
    duplicate_policy: DuplicatePolicy,
    criteria: Option<SelectionCriteria>,
    candidates: Vec<Document>,
    selected: HashSet<String>,
    preview: Option<Allocation>,
    commit_outcome: Option<CommitOutcome>,
    resubmit_outcome: Option<ResubmitOutcome>,
}

impl Default for RenumberSession {
    fn default() -> Self {
        RenumberSession::new(DuplicatePolicy::default())
    }
}

impl RenumberSession {
    pub fn new(duplicate_policy: DuplicatePolicy) -> Self {
        RenumberSession {
            state: SessionState::Searching,
            duplicate_policy,
            criteria: None,
            candidates: Vec::new(),
            selected: HashSet::new(),
            preview: None,
            commit_outcome: None,
            resubmit_outcome: None,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn criteria(&self) -> Option<&SelectionCriteria> {
        self.criteria.as_ref()
    }

    pub fn candidates(&self) -> &[Document] {
        &self.candidates
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected documents, in candidate (creation) order.
    pub fn selected_documents(&self) -> Vec<Document> {
        self.candidates
            .iter()
            .filter(|d| self.selected.contains(&d.id))
            .cloned()
            .collect()
    }

    /// Document type whose counter a preview/commit uses: the search's
    /// explicit type, otherwise the first selected document's.
    pub fn counter_document_type(&self) -> Option<DocumentType> {
        self.criteria
            .as_ref()
            .and_then(|c| c.document_type)
            .or_else(|| {
                self.candidates
                    .iter()
                    .find(|d| self.selected.contains(&d.id))
                    .map(|d| d.document_type)
            })
    }

    pub fn preview(&self) -> Option<&Allocation> {
        self.preview.as_ref()
    }

    pub fn commit_outcome(&self) -> Option<&CommitOutcome> {
        self.commit_outcome.as_ref()
    }

    pub fn resubmit_outcome(&self) -> Option<&ResubmitOutcome> {
        self.resubmit_outcome.as_ref()
    }

    /// Entries that the commit phase actually renumbered.
    pub fn resubmission_targets(&self) -> &[PreviewEntry] {
        self.commit_outcome
            .as_ref()
            .map(|o| o.committed.as_slice())
            .unwrap_or(&[])
    }

    // -------------------------------------------------------------------------
    // Transition
    // -------------------------------------------------------------------------

    /// Applies `event`, returning the new state.
    ///
    /// On error nothing changes.
    pub fn transition(&mut self, event: SessionEvent) -> ValidationResult<SessionState> {
        use SessionState::*;

        let next = match (self.state, event) {
            (_, SessionEvent::Reset) => {
                *self = RenumberSession::new(self.duplicate_policy);
                Searching
            }

            (Searching | CandidatesLoaded | Previewed, SessionEvent::CandidatesFound { criteria, candidates }) => {
                if candidates.is_empty() {
                    return Err(ValidationError::NoCandidates);
                }
                self.criteria = Some(criteria);
                self.candidates = candidates;
                self.selected.clear();
                self.preview = None;
                CandidatesLoaded
            }

            (CandidatesLoaded | Previewed, SessionEvent::Select { ids }) => {
                self.selected = self.checked_selection(ids)?;
                self.preview = None;
                CandidatesLoaded
            }

            (CandidatesLoaded | Previewed, SessionEvent::Toggle { id }) => {
                if !self.candidates.iter().any(|d| d.id == id) {
                    return Err(ValidationError::UnknownCandidate(id));
                }
                if !self.selected.remove(&id) {
                    self.selected.insert(id);
                }
                self.preview = None;
                CandidatesLoaded
            }

            (CandidatesLoaded | Previewed, SessionEvent::SelectAll) => {
                self.selected = self.candidates.iter().map(|d| d.id.clone()).collect();
                self.preview = None;
                CandidatesLoaded
            }

            (
                CandidatesLoaded | Previewed,
                SessionEvent::PreviewRequested {
                    target_series,
                    counter,
                    used_correlatives,
                },
            ) => {
                let selected = self.selected_documents();
                if selected.is_empty() {
                    return Err(ValidationError::EmptySelection);
                }
                let document_type = self.counter_document_type().unwrap_or_default();
                let allocation = allocate(
                    &selected,
                    &target_series,
                    document_type,
                    counter.as_ref(),
                    &used_correlatives,
                    self.duplicate_policy,
                )?;
                self.preview = Some(allocation);
                Previewed
            }

            (Previewed, SessionEvent::CommitRequested) => match &self.preview {
                Some(allocation) if !allocation.is_empty() => Committing,
                _ => return Err(ValidationError::EmptySelection),
            },

            (Committing, SessionEvent::CommitFinished(outcome)) => {
                self.commit_outcome = Some(outcome);
                Committed
            }

            (Committed | Done, SessionEvent::ResubmitRequested) => {
                if self.resubmission_targets().is_empty() {
                    return Err(ValidationError::NothingCommitted);
                }
                Resubmitting
            }

            (Resubmitting, SessionEvent::ResubmitFinished(outcome)) => {
                self.resubmit_outcome = Some(outcome);
                Done
            }

            (state, event) => {
                return Err(ValidationError::InvalidTransition {
                    state: state.to_string(),
                    event: event.name().to_string(),
                })
            }
        };

        self.state = next;
        Ok(next)
    }

    fn checked_selection(&self, ids: Vec<String>) -> ValidationResult<HashSet<String>> {
        let mut selected = HashSet::with_capacity(ids.len());
        for id in ids {
            if !self.candidates.iter().any(|d| d.id == id) {
                return Err(ValidationError::UnknownCandidate(id));
            }
            if selected.contains(&id) {
                if self.duplicate_policy == DuplicatePolicy::Reject {
                    return Err(ValidationError::Duplicate {
                        field: "document id".to_string(),
                        value: id,
                    });
                }
                continue;
            }
            selected.insert(id);
        }
        Ok(selected)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
