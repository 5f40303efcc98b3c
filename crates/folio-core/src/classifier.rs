//! # Candidate Classifier
//!
//! Heuristics over authority responses.
//!
//! - [`DuplicateClassifier`] decides whether an *accepted* document is really
//!   a duplicate submission the authority acknowledged with an "already
//!   processed" signature.
//! - [`TransientErrorClassifier`] decides whether a rejection was caused by
//!   an outage rather than by the document itself.
//!
//! Both match against fixed code lists and case-insensitive substrings, so
//! they are brittle by nature. The engine only depends on the trait, and the
//! lists are configurable.

use crate::types::SubmissionStatus;

// =============================================================================
// Default Signatures
// =============================================================================

/// Response codes the authority uses for "already received" acceptances.
pub const DEFAULT_DUPLICATE_CODES: &[&str] = &["0100", "2033", "2800", "4000"];

/// Message fragments that mark an acceptance as a duplicate.
pub const DEFAULT_DUPLICATE_PHRASES: &[&str] = &[
    "ya fue enviado",
    "ya existe",
    "registrado anteriormente",
    "duplicado",
    "ya se encuentra",
];

/// Message fragments that mark a rejection as transient.
pub const DEFAULT_TRANSIENT_MARKERS: &[&str] = &[
    "0109",
    "timeout",
    "etimedout",
    "econnrefused",
    "enotfound",
    "no está disponible",
    "servicio de autenticación",
    "service unavailable",
    "connection refused",
];

// =============================================================================
// Duplicate Classifier
// =============================================================================

/// Pluggable predicate for suspect duplicates.
pub trait DuplicateClassifier: Send + Sync {
    /// True when an accepted document looks like a duplicate acknowledgement.
    fn is_suspect_duplicate(
        &self,
        status: SubmissionStatus,
        response_code: Option<&str>,
        response_description: Option<&str>,
    ) -> bool;
}

/// Classifier matching a code set and a phrase set.
#[derive(Debug, Clone)]
pub struct SignatureClassifier {
    codes: Vec<String>,
    phrases: Vec<String>,
}

impl SignatureClassifier {
    /// Creates a classifier from custom signatures. Phrases are matched
    /// case-insensitively.
    pub fn new<C, P>(codes: C, phrases: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        SignatureClassifier {
            codes: codes.into_iter().map(|c| c.into().trim().to_string()).collect(),
            phrases: phrases
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl Default for SignatureClassifier {
    fn default() -> Self {
        SignatureClassifier::new(
            DEFAULT_DUPLICATE_CODES.iter().copied(),
            DEFAULT_DUPLICATE_PHRASES.iter().copied(),
        )
    }
}

impl DuplicateClassifier for SignatureClassifier {
    fn is_suspect_duplicate(
        &self,
        status: SubmissionStatus,
        response_code: Option<&str>,
        response_description: Option<&str>,
    ) -> bool {
        if status != SubmissionStatus::Accepted {
            return false;
        }

        let code_match = response_code
            .map(str::trim)
            .is_some_and(|code| self.codes.iter().any(|c| c == code));
        if code_match {
            return true;
        }

        response_description
            .map(str::to_lowercase)
            .is_some_and(|desc| self.phrases.iter().any(|p| desc.contains(p.as_str())))
    }
}

/// Suspect-duplicate check with the default signatures.
///
/// ```rust
/// use folio_core::classifier::is_suspect_duplicate;
/// use folio_core::SubmissionStatus;
///
/// assert!(!is_suspect_duplicate(SubmissionStatus::Accepted, Some("0200"), Some("procesado")));
/// ```
pub fn is_suspect_duplicate(
    status: SubmissionStatus,
    response_code: Option<&str>,
    response_description: Option<&str>,
) -> bool {
    SignatureClassifier::default().is_suspect_duplicate(status, response_code, response_description)
}

// =============================================================================
// Transient Error Classifier
// =============================================================================

/// Recognizes rejections caused by authority outages.
#[derive(Debug, Clone)]
pub struct TransientErrorClassifier {
    markers: Vec<String>,
}

impl TransientErrorClassifier {
    pub fn new<M>(markers: M) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
    {
        TransientErrorClassifier {
            markers: markers
                .into_iter()
                .map(|m| m.into().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Returns the first text that carries a transient marker, code first.
    pub fn transient_error<'a>(
        &self,
        response_code: Option<&'a str>,
        response_description: Option<&'a str>,
    ) -> Option<&'a str> {
        [response_code, response_description]
            .into_iter()
            .flatten()
            .find(|text| {
                let text = text.to_lowercase();
                self.markers.iter().any(|m| text.contains(m.as_str()))
            })
    }

    pub fn is_transient(&self, response_code: Option<&str>, response_description: Option<&str>) -> bool {
        self.transient_error(response_code, response_description).is_some()
    }
}

impl Default for TransientErrorClassifier {
    fn default() -> Self {
        TransientErrorClassifier::new(DEFAULT_TRANSIENT_MARKERS.iter().copied())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
