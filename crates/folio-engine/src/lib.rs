//! # folio-engine: Renumbering Orchestration for Folio
//!
//! Runs a renumbering session end to end: search the document store,
//! preview new numbers, commit them, and resubmit the moved documents to
//! the external validation authority.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Engine Architecture                            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                 RenumberWorkflow (session driver)                │  │
//! │  │                                                                  │  │
//! │  │  Owns a RenumberSession (pure FSM from folio-core)              │  │
//! │  │  Performs I/O, then feeds the result to the session              │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ CommitExecutor │  │  Resubmitter   │  │  reset_stuck           │    │
//! │  │                │  │                │  │                        │    │
//! │  │ One tx per doc │  │ One call at a  │  │ Outage rejections and  │    │
//! │  │ then counter   │  │ time, re-read, │  │ stale `sending` back   │    │
//! │  │ Errors → data  │  │ paced          │  │ to `pending`           │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          │                   │                       │                  │
//! │          ▼                   ▼                       ▼                  │
//! │   dyn DocumentStore   dyn ValidationAuthority  dyn RenumberEventEmitter│
//! │   (folio_db::Database) (HttpAuthority)          (TracingEmitter)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use folio_engine::{EngineConfig, HttpAuthority, RenumberWorkflow};
//!
//! let config = EngineConfig::load(None)?;
//! let mut workflow = RenumberWorkflow::new(Arc::new(database), &config)
//!     .with_authority(Arc::new(HttpAuthority::from_config(&config)?));
//!
//! workflow.search(criteria).await?;
//! workflow.select_all()?;
//! workflow.preview("F002").await?;
//! let committed = workflow.commit().await?;
//! let report = workflow.resubmit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod authority;
pub mod cancel;
pub mod commit;
pub mod config;
pub mod error;
pub mod events;
pub mod resubmit;
pub mod store;
pub mod stuck;
pub mod workflow;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use authority::{HttpAuthority, SubmissionReceipt, ValidationAuthority};
pub use cancel::CancelToken;
pub use commit::CommitExecutor;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use events::{NoOpEmitter, Phase, ProgressEvent, RenumberEventEmitter, TracingEmitter};
pub use resubmit::{Pacing, Resubmitter};
pub use store::DocumentStore;
pub use stuck::{reset_stuck, ResetOutcome};
pub use workflow::RenumberWorkflow;
