//! # Engine Error Types
//!
//! Error types for the orchestration layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Validation    │  │     Collaborators       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Validation     │  │  Store                  │ │
//! │  │  InvalidUrl     │  │  (blocks phase) │  │  Authority / Http       │ │
//! │  │  ConfigLoad     │  │                 │  │  Timeout                │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Only Validation escapes a workflow phase. Collaborator errors during  │
//! │  commit / resubmission are recorded per item and the batch continues.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use folio_core::ValidationError;
use folio_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid authority URL.
    #[error("Invalid authority URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Phase Errors
    // =========================================================================
    /// Input rejected before any side effect.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// Document store failure.
    #[error("Store error: {0}")]
    Store(#[from] DbError),

    /// The authority answered with a failure.
    #[error("Authority error: {0}")]
    Authority(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A store or authority call exceeded its bound.
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// A record the engine just wrote is gone.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout {
                operation: "authority request".to_string(),
                secs: 0,
            }
        } else {
            EngineError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for EngineError {
    fn from(err: url::ParseError) -> Self {
        EngineError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl EngineError {
    /// Builds a timeout error for `operation` bounded by `timeout`.
    pub fn timeout(operation: impl Into<String>, timeout: std::time::Duration) -> Self {
        EngineError::Timeout {
            operation: operation.into(),
            secs: timeout.as_secs(),
        }
    }

    /// True for errors that block a phase transition.
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidConfig(_)
                | EngineError::InvalidUrl(_)
                | EngineError::ConfigLoadFailed(_)
        )
    }
}
