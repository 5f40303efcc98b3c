//! In-memory collaborators for engine tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use folio_core::{
    format_document_number, CounterPolicy, CounterUpdate, Document, DocumentType, PreviewEntry,
    SeriesCounter, SubmissionStatus, DEFAULT_TENANT_ID,
};
use folio_db::DbError;

use crate::authority::{SubmissionReceipt, ValidationAuthority};
use crate::error::{EngineError, EngineResult};
use crate::store::DocumentStore;

/// Fixed clock start so document ordering is deterministic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Builds a document created `minute` minutes after [`t0`].
pub fn doc(id: &str, series: &str, n: i64, status: SubmissionStatus, minute: i64) -> Document {
    let created_at = t0() + Duration::minutes(minute);
    Document {
        id: id.to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        document_type: DocumentType::Invoice,
        series: series.to_string(),
        correlative_number: n,
        number: format_document_number(series, n),
        submission_status: status,
        response_code: Some("2017".to_string()),
        response_description: Some("El RUC del receptor no existe".to_string()),
        signature_hash: Some("sig".to_string()),
        receipt_hash: None,
        created_at,
        updated_at: created_at,
        renumber_audit: None,
    }
}

// =============================================================================
// Memory Store
// =============================================================================

#[derive(Default)]
struct State {
    documents: Vec<Document>,
    counters: HashMap<DocumentType, SeriesCounter>,
    fail_renumber: HashSet<String>,
    hang_renumber: HashSet<String>,
    fail_counter: bool,
    renumber_calls: Vec<String>,
}

/// Document store held in a `Mutex`, with per-document failure injection.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(documents: Vec<Document>) -> Arc<Self> {
        let store = MemoryStore::default();
        store.state.lock().unwrap().documents = documents;
        Arc::new(store)
    }

    pub fn set_counter(&self, series: &str, last_number: i64) {
        self.state.lock().unwrap().counters.insert(
            DocumentType::Invoice,
            SeriesCounter {
                document_type: DocumentType::Invoice,
                series: series.to_string(),
                last_number,
            },
        );
    }

    pub fn counter(&self) -> Option<SeriesCounter> {
        self.state.lock().unwrap().counters.get(&DocumentType::Invoice).cloned()
    }

    /// Makes `apply_renumber` fail for `id`.
    pub fn fail_renumber_of(&self, id: &str) {
        self.state.lock().unwrap().fail_renumber.insert(id.to_string());
    }

    /// Makes `apply_renumber` never return for `id`.
    pub fn hang_renumber_of(&self, id: &str) {
        self.state.lock().unwrap().hang_renumber.insert(id.to_string());
    }

    pub fn fail_counter(&self) {
        self.state.lock().unwrap().fail_counter = true;
    }

    pub fn renumber_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().renumber_calls.clone()
    }

    pub fn document(&self, id: &str) -> Document {
        self.state
            .lock()
            .unwrap()
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .unwrap()
    }

    /// Writes an authority verdict onto a document.
    pub fn finalize(&self, id: &str, status: SubmissionStatus, description: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(doc) = state.documents.iter_mut().find(|d| d.id == id) {
            doc.submission_status = status;
            doc.response_description = Some(description.to_string());
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self) -> EngineResult<Vec<Document>> {
        let mut docs = self.state.lock().unwrap().documents.clone();
        docs.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(docs)
    }

    async fn get_document(&self, id: &str) -> EngineResult<Option<Document>> {
        Ok(self.state.lock().unwrap().documents.iter().find(|d| d.id == id).cloned())
    }

    async fn used_correlatives(&self, series: &str) -> EngineResult<Vec<i64>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .documents
            .iter()
            .filter(|d| d.series == series)
            .map(|d| d.correlative_number)
            .collect())
    }

    async fn get_counter(&self, document_type: DocumentType) -> EngineResult<Option<SeriesCounter>> {
        Ok(self.state.lock().unwrap().counters.get(&document_type).cloned())
    }

    async fn apply_renumber(&self, entry: &PreviewEntry, at: DateTime<Utc>) -> EngineResult<Document> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.renumber_calls.push(entry.document_id.clone());
            state.hang_renumber.contains(&entry.document_id)
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_renumber.contains(&entry.document_id) {
            return Err(EngineError::Store(DbError::TransactionFailed("database is locked".into())));
        }
        if state
            .documents
            .iter()
            .any(|d| d.series == entry.new_series && d.correlative_number == entry.new_correlative)
        {
            return Err(EngineError::Store(DbError::duplicate("number", entry.new_number.clone())));
        }

        let doc = state
            .documents
            .iter_mut()
            .find(|d| d.id == entry.document_id)
            .ok_or_else(|| EngineError::Store(DbError::not_found("Document", entry.document_id.clone())))?;
        *doc = doc.renumbered(&entry.new_series, entry.new_correlative, at);
        Ok(doc.clone())
    }

    async fn raise_counter(
        &self,
        document_type: DocumentType,
        target_series: &str,
        highest: i64,
        policy: CounterPolicy,
    ) -> EngineResult<CounterUpdate> {
        let mut state = self.state.lock().unwrap();
        if state.fail_counter {
            return Err(EngineError::Store(DbError::TransactionFailed("counter write failed".into())));
        }

        let current = state.counters.get(&document_type).cloned();
        let update = match (current, policy) {
            (Some(counter), _) if counter.series == target_series => {
                let after = counter.last_number.max(highest);
                state.counters.insert(
                    document_type,
                    SeriesCounter {
                        last_number: after,
                        ..counter.clone()
                    },
                );
                CounterUpdate::Raised {
                    series: counter.series,
                    before: counter.last_number,
                    after,
                }
            }
            (current, CounterPolicy::KeepActiveSeries) => CounterUpdate::Unchanged {
                active_series: current.map(|c| c.series),
            },
            (_, CounterPolicy::PromoteTarget) => {
                state.counters.insert(
                    document_type,
                    SeriesCounter {
                        document_type,
                        series: target_series.to_string(),
                        last_number: highest,
                    },
                );
                CounterUpdate::Created {
                    series: target_series.to_string(),
                    last_number: highest,
                }
            }
        };
        Ok(update)
    }

    async fn reset_to_pending(&self, id: &str, description: &str) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_renumber.contains(id) {
            return Err(EngineError::Store(DbError::TransactionFailed("database is locked".into())));
        }
        let doc = state
            .documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| EngineError::Store(DbError::not_found("Document", id)))?;
        doc.submission_status = SubmissionStatus::Pending;
        doc.response_code = None;
        doc.response_description = Some(description.to_string());
        Ok(())
    }
}

// =============================================================================
// Scripted Authority
// =============================================================================

/// What the fake authority does for one document.
#[derive(Debug, Clone)]
pub enum Script {
    /// Acknowledges and finalizes the document as accepted.
    Accept,
    /// Acknowledges and finalizes the document as rejected.
    Reject(&'static str),
    /// Acknowledges receipt only; the document stays as it is.
    AckOnly,
    /// The call itself fails.
    Fail(&'static str),
    /// The call never returns.
    Hang,
}

/// Authority that follows a per-document script and writes verdicts into a
/// [`MemoryStore`] the way the real service does out of band.
pub struct ScriptedAuthority {
    store: Arc<MemoryStore>,
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl ScriptedAuthority {
    pub fn new(store: Arc<MemoryStore>, scripts: &[(&str, Script)]) -> Self {
        ScriptedAuthority {
            store,
            scripts: scripts.iter().map(|(id, s)| (id.to_string(), s.clone())).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl ValidationAuthority for ScriptedAuthority {
    async fn submit(&self, document_id: &str) -> EngineResult<SubmissionReceipt> {
        self.calls
            .lock()
            .unwrap()
            .push((document_id.to_string(), tokio::time::Instant::now()));

        match self.scripts.get(document_id).cloned().unwrap_or(Script::Accept) {
            Script::Accept => {
                self.store
                    .finalize(document_id, SubmissionStatus::Accepted, "La Factura ha sido aceptada");
                Ok(SubmissionReceipt {
                    success: true,
                    status: Some("accepted".into()),
                    message: Some("La Factura ha sido aceptada".into()),
                    observations: vec![],
                })
            }
            Script::Reject(reason) => {
                self.store.finalize(document_id, SubmissionStatus::Rejected, reason);
                Ok(SubmissionReceipt {
                    success: true,
                    status: Some("rejected".into()),
                    message: Some(reason.into()),
                    observations: vec![],
                })
            }
            Script::AckOnly => Ok(SubmissionReceipt {
                success: true,
                status: None,
                message: Some("received".into()),
                observations: vec![],
            }),
            Script::Fail(reason) => Err(EngineError::Authority(reason.into())),
            Script::Hang => std::future::pending().await,
        }
    }
}
