//! # Document Store Seam
//!
//! The engine talks to documents and counters only through [`DocumentStore`].
//! [`folio_db::Database`] is the production implementation; tests use an
//! in-memory store with failure injection.
//!
//! ```text
//!   Workflow / CommitExecutor / Resubmitter
//!                   │
//!                   ▼
//!        ┌───────────────────────┐
//!        │  dyn DocumentStore    │  list, read, renumber one doc,
//!        │                       │  raise counter, reset one doc
//!        └──────────┬────────────┘
//!                   ▼
//!          folio_db::Database (SQLite)
//! ```
//!
//! Every call goes through [`bounded`] so a hung store turns into a
//! per-item [`EngineError::Timeout`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

use folio_core::{CounterPolicy, CounterUpdate, Document, DocumentType, PreviewEntry, SeriesCounter};
use folio_db::Database;

use crate::error::{EngineError, EngineResult};

/// Tenant-scoped access to documents and series counters.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document of the tenant, oldest first.
    async fn list_documents(&self) -> EngineResult<Vec<Document>>;

    async fn get_document(&self, id: &str) -> EngineResult<Option<Document>>;

    /// Correlatives currently used under `series`.
    async fn used_correlatives(&self, series: &str) -> EngineResult<Vec<i64>>;

    /// Fresh read of the counter for `document_type`.
    async fn get_counter(&self, document_type: DocumentType) -> EngineResult<Option<SeriesCounter>>;

    /// Moves one document to its new number and resets it to `pending`.
    async fn apply_renumber(&self, entry: &PreviewEntry, at: DateTime<Utc>) -> EngineResult<Document>;

    /// Transactional read-modify-write of the counter. Never decreases it.
    async fn raise_counter(
        &self,
        document_type: DocumentType,
        target_series: &str,
        highest: i64,
        policy: CounterPolicy,
    ) -> EngineResult<CounterUpdate>;

    /// Puts a stuck document back to `pending` with `description`.
    async fn reset_to_pending(&self, id: &str, description: &str) -> EngineResult<()>;
}

/// Runs `fut` with an upper bound of `limit`.
pub async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::timeout(operation, limit)),
    }
}

// =============================================================================
// SQLite Implementation
// =============================================================================

#[async_trait]
impl DocumentStore for Database {
    async fn list_documents(&self) -> EngineResult<Vec<Document>> {
        Ok(self.documents().list_all().await?)
    }

    async fn get_document(&self, id: &str) -> EngineResult<Option<Document>> {
        Ok(self.documents().get_by_id(id).await?)
    }

    async fn used_correlatives(&self, series: &str) -> EngineResult<Vec<i64>> {
        Ok(self.documents().used_correlatives(series).await?)
    }

    async fn get_counter(&self, document_type: DocumentType) -> EngineResult<Option<SeriesCounter>> {
        Ok(self.counters().get(document_type).await?)
    }

    async fn apply_renumber(&self, entry: &PreviewEntry, at: DateTime<Utc>) -> EngineResult<Document> {
        Ok(self.documents().apply_renumber(entry, at).await?)
    }

    async fn raise_counter(
        &self,
        document_type: DocumentType,
        target_series: &str,
        highest: i64,
        policy: CounterPolicy,
    ) -> EngineResult<CounterUpdate> {
        Ok(self
            .counters()
            .raise(document_type, target_series, highest, policy)
            .await?)
    }

    async fn reset_to_pending(&self, id: &str, description: &str) -> EngineResult<()> {
        Ok(self.documents().reset_to_pending(id, description).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_times_out() {
        let result: EngineResult<()> = bounded("list_documents", Duration::from_secs(10), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

        match result {
            Err(EngineError::Timeout { operation, secs }) => {
                assert_eq!(operation, "list_documents");
                assert_eq!(secs, 10);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bounded_passes_through() {
        let value = bounded("get_counter", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_database_implements_store() {
        let db = folio_db::Database::new(folio_db::DbConfig::in_memory()).await.unwrap();
        let store: &dyn DocumentStore = &db;
        assert!(store.list_documents().await.unwrap().is_empty());
        assert!(store.get_counter(DocumentType::Invoice).await.unwrap().is_none());
        assert!(store.get_document("missing").await.unwrap().is_none());
    }
}
