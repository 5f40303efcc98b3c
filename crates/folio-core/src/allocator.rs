//! # Sequence Allocator
//!
//! Computes a gap-free run of correlatives for a target series.
//!
//! ## Base Selection
//! ```text
//!   counter (document type)          used correlatives in target series
//!   ┌──────────────────────┐          ┌─────────────────────────────┐
//!   │ series: F002         │          │ 12, 40, 47                  │
//!   │ last_number: 50      │          └──────────────┬──────────────┘
//!   └──────────┬───────────┘                         │
//!              │ only if series == target            │ max
//!              ▼                                     ▼
//!            50 ────────────────► base = max(50, 47) = 50
//!
//!   candidates [A, B, C] (selector order) ──► A→51, B→52, C→53
//! ```
//!
//! The allocator is pure. Disjointness from existing numbers holds for the
//! snapshot it was given; a concurrent writer can still collide, which the
//! store's unique index turns into a per-item commit error.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::{format_document_number, Document, DocumentType, SeriesCounter};
use crate::validation::{validate_target_series, ValidationResult};
use crate::MAX_CORRELATIVE;

// =============================================================================
// Duplicate Policy
// =============================================================================

/// What to do when the selection lists the same document twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first occurrence, drop the rest.
    Deduplicate,
    /// Refuse the whole allocation.
    Reject,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        DuplicatePolicy::Deduplicate
    }
}

// =============================================================================
// Preview
// =============================================================================

/// One row of the preview mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreviewEntry {
    pub document_id: String,
    pub old_number: String,
    pub new_series: String,
    pub new_correlative: i64,
    pub new_number: String,
}

/// The full preview: where numbering starts and what each document gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Allocation {
    /// Counter this allocation raises after commit.
    pub document_type: DocumentType,
    pub target_series: String,
    /// Highest correlative already in use; the first entry gets `base + 1`.
    pub base: i64,
    pub entries: Vec<PreviewEntry>,
}

impl Allocation {
    /// Highest correlative this allocation hands out.
    pub fn highest(&self) -> Option<i64> {
        self.entries.last().map(|e| e.new_correlative)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// Highest correlative already claimed in `target_series`.
///
/// The counter only counts when it tracks the target series. Returns 0 when
/// nothing is known.
pub fn allocation_base(
    counter: Option<&SeriesCounter>,
    target_series: &str,
    used_correlatives: &[i64],
) -> i64 {
    let from_counter = counter
        .filter(|c| c.series == target_series)
        .map(|c| c.last_number)
        .unwrap_or(0);
    let from_documents = used_correlatives.iter().copied().max().unwrap_or(0);

    from_counter.max(from_documents).max(0)
}

/// Assigns `base + k` to the k-th candidate, in input order.
///
/// ## Errors
/// - `EmptySelection` when `candidates` is empty
/// - `Required` / `InvalidFormat` for a bad target series
/// - `Duplicate` when the target equals a candidate's current series, or a
///   document appears twice under [`DuplicatePolicy::Reject`]
/// - `RangeExhausted` when the run would pass 99 999 999
pub fn allocate(
    candidates: &[Document],
    target_series: &str,
    document_type: DocumentType,
    counter: Option<&SeriesCounter>,
    used_correlatives: &[i64],
    policy: DuplicatePolicy,
) -> ValidationResult<Allocation> {
    if candidates.is_empty() {
        return Err(ValidationError::EmptySelection);
    }

    let target_series = validate_target_series(target_series)?;

    if candidates.iter().any(|d| d.series == target_series) {
        return Err(ValidationError::Duplicate {
            field: "target series".to_string(),
            value: target_series,
        });
    }

    let mut seen = HashSet::new();
    let mut unique: Vec<&Document> = Vec::with_capacity(candidates.len());
    for doc in candidates {
        if seen.insert(doc.id.as_str()) {
            unique.push(doc);
        } else if policy == DuplicatePolicy::Reject {
            return Err(ValidationError::Duplicate {
                field: "document id".to_string(),
                value: doc.id.clone(),
            });
        }
    }

    let base = allocation_base(counter, &target_series, used_correlatives);
    if base + unique.len() as i64 > MAX_CORRELATIVE {
        return Err(ValidationError::RangeExhausted {
            series: target_series,
            requested: unique.len(),
            max: MAX_CORRELATIVE,
        });
    }

    let entries = unique
        .into_iter()
        .zip(1i64..)
        .map(|(doc, k)| {
            let new_correlative = base + k;
            PreviewEntry {
                document_id: doc.id.clone(),
                old_number: doc.number.clone(),
                new_series: target_series.clone(),
                new_correlative,
                new_number: format_document_number(&target_series, new_correlative),
            }
        })
        .collect();

    Ok(Allocation {
        document_type,
        target_series,
        base,
        entries,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
