//! # Repository Module
//!
//! Database repositories for Folio.
//!
//! ## Available Repositories
//!
//! - [`DocumentRepository`](document::DocumentRepository) - Document reads, renumbering, status writes
//! - [`SeriesCounterRepository`](counter::SeriesCounterRepository) - Shared counter read-modify-write
//! - [`RenumberAuditRepository`](audit::RenumberAuditRepository) - Renumbering history

pub mod audit;
pub mod counter;
pub mod document;
