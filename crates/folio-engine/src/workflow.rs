//! # Renumber Workflow
//!
//! Drives one [`RenumberSession`] against real collaborators. Every method
//! does its I/O first and then feeds the result to the session as a
//! [`SessionEvent`], so state rules live in one place.
//!
//! ## Phase Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  search(criteria)      list_documents → select_candidates              │
//! │                         → CandidatesFound        ⇒ CandidatesLoaded    │
//! │  select / toggle / select_all                    ⇒ CandidatesLoaded    │
//! │  preview(target)       get_counter + used_correlatives                 │
//! │                         → PreviewRequested       ⇒ Previewed           │
//! │  commit()              CommitRequested → CommitExecutor                │
//! │                         → CommitFinished         ⇒ Committed           │
//! │  resubmit()            ResubmitRequested → Resubmitter                 │
//! │                         → ResubmitFinished       ⇒ Done                │
//! │  reset()               Reset                     ⇒ Searching           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only validation errors (and a failed search listing) come back as `Err`.
//! Per-document failures are part of the returned outcomes.
//!
//! A cancel request stops the phase that is running, or the next one to
//! start. That phase clears the token, so a later `resubmit()` runs again
//! without a `reset()`.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use folio_core::selector::select_candidates;
use folio_core::validation::validate_target_series;
use folio_core::{
    Allocation, CommitOutcome, CounterPolicy, DuplicateClassifier, RenumberSession, ResubmitOutcome,
    SelectionCriteria, SessionEvent, SessionState, ValidationError,
};

use crate::authority::ValidationAuthority;
use crate::cancel::CancelToken;
use crate::commit::CommitExecutor;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::{NoOpEmitter, Phase, RenumberEventEmitter};
use crate::resubmit::{Pacing, Resubmitter};
use crate::store::{bounded, DocumentStore};

/// One operator's renumbering run.
pub struct RenumberWorkflow {
    store: Arc<dyn DocumentStore>,
    authority: Option<Arc<dyn ValidationAuthority>>,
    classifier: Arc<dyn DuplicateClassifier>,
    emitter: Arc<dyn RenumberEventEmitter>,
    session: RenumberSession,
    cancel: CancelToken,
    counter_policy: CounterPolicy,
    pacing: Pacing,
}

impl RenumberWorkflow {
    /// Creates a workflow using the classifier, policies and timeouts from `config`.
    pub fn new(store: Arc<dyn DocumentStore>, config: &EngineConfig) -> Self {
        RenumberWorkflow {
            store,
            authority: None,
            classifier: Arc::new(config.classifier.duplicate_classifier()),
            emitter: Arc::new(NoOpEmitter),
            session: RenumberSession::new(config.numbering.duplicate_policy),
            cancel: CancelToken::new(),
            counter_policy: config.numbering.counter_policy,
            pacing: Pacing {
                delay: config.resubmit_delay(),
                call_timeout: config.call_timeout(),
                store_timeout: config.store_timeout(),
            },
        }
    }

    pub fn with_authority(mut self, authority: Arc<dyn ValidationAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn RenumberEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn DuplicateClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn session(&self) -> &RenumberSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Token that stops the running commit or resubmission.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn store_timeout(&self) -> Duration {
        self.pacing.store_timeout
    }

    // =========================================================================
    // Search & Selection
    // =========================================================================

    /// Loads candidates matching `criteria`. Returns how many were found.
    pub async fn search(&mut self, criteria: SelectionCriteria) -> EngineResult<usize> {
        self.emitter.emit_phase(Phase::Search);

        let documents = bounded("list_documents", self.store_timeout(), self.store.list_documents()).await?;
        let candidates = select_candidates(&documents, &criteria, self.classifier.as_ref());
        let found = candidates.len();

        info!(
            series = %criteria.series_filter,
            status_mode = %criteria.status_mode,
            scanned = documents.len(),
            found,
            "Search finished"
        );

        self.session
            .transition(SessionEvent::CandidatesFound { criteria, candidates })?;
        Ok(found)
    }

    pub fn select(&mut self, ids: Vec<String>) -> EngineResult<SessionState> {
        Ok(self.session.transition(SessionEvent::Select { ids })?)
    }

    pub fn toggle(&mut self, id: &str) -> EngineResult<SessionState> {
        Ok(self
            .session
            .transition(SessionEvent::Toggle { id: id.to_string() })?)
    }

    pub fn select_all(&mut self) -> EngineResult<SessionState> {
        Ok(self.session.transition(SessionEvent::SelectAll)?)
    }

    // =========================================================================
    // Preview
    // =========================================================================

    /// Computes the new numbers for the selection under `target_series`.
    ///
    /// Reads the counter and the target series usage fresh on every call.
    pub async fn preview(&mut self, target_series: &str) -> EngineResult<Allocation> {
        if !matches!(
            self.session.state(),
            SessionState::CandidatesLoaded | SessionState::Previewed
        ) {
            return Err(ValidationError::InvalidTransition {
                state: self.session.state().to_string(),
                event: "preview".to_string(),
            }
            .into());
        }
        if self.session.selected_count() == 0 {
            return Err(ValidationError::EmptySelection.into());
        }
        let target_series = validate_target_series(target_series)?;
        let document_type = self.session.counter_document_type().unwrap_or_default();

        self.emitter.emit_phase(Phase::Preview);

        let counter = bounded(
            "get_counter",
            self.store_timeout(),
            self.store.get_counter(document_type),
        )
        .await?;
        let used_correlatives = bounded(
            "used_correlatives",
            self.store_timeout(),
            self.store.used_correlatives(&target_series),
        )
        .await?;

        debug!(
            target_series = %target_series,
            document_type = %document_type,
            counter = ?counter,
            used = used_correlatives.len(),
            "Preview inputs loaded"
        );

        self.session.transition(SessionEvent::PreviewRequested {
            target_series,
            counter,
            used_correlatives,
        })?;

        self.session
            .preview()
            .cloned()
            .ok_or_else(|| ValidationError::EmptySelection.into())
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Applies the current preview. Per-document failures are in the outcome.
    pub async fn commit(&mut self) -> EngineResult<CommitOutcome> {
        self.session.transition(SessionEvent::CommitRequested)?;
        let allocation = self
            .session
            .preview()
            .cloned()
            .ok_or(ValidationError::EmptySelection)?;

        self.emitter.emit_phase(Phase::Commit);

        let outcome = CommitExecutor::new(
            self.store.as_ref(),
            self.emitter.as_ref(),
            self.counter_policy,
            self.store_timeout(),
        )
        .run(&allocation, &self.cancel)
        .await;
        if outcome.cancelled {
            self.cancel.clear();
        }

        self.emitter.emit_commit_summary(&outcome);
        self.session
            .transition(SessionEvent::CommitFinished(outcome.clone()))?;
        Ok(outcome)
    }

    // =========================================================================
    // Resubmission
    // =========================================================================

    /// Resubmits every document the commit renumbered. May be repeated.
    pub async fn resubmit(&mut self) -> EngineResult<ResubmitOutcome> {
        let authority = self
            .authority
            .clone()
            .ok_or_else(|| EngineError::InvalidConfig("no validation authority configured".into()))?;

        self.session.transition(SessionEvent::ResubmitRequested)?;
        let targets = self.session.resubmission_targets().to_vec();

        self.emitter.emit_phase(Phase::Resubmit);

        let outcome = Resubmitter::new(
            self.store.as_ref(),
            authority.as_ref(),
            self.emitter.as_ref(),
            self.pacing,
        )
        .run(&targets, &self.cancel)
        .await;
        if outcome.cancelled {
            self.cancel.clear();
        }

        self.emitter.emit_resubmit_report(&outcome);
        self.session
            .transition(SessionEvent::ResubmitFinished(outcome.clone()))?;
        Ok(outcome)
    }

    // =========================================================================
    // Reset
    // =========================================================================

    /// Discards all session state. Committed documents are untouched.
    ///
    /// Issues a fresh cancel token; earlier clones no longer affect this workflow.
    pub fn reset(&mut self) {
        // Reset is valid from every state.
        let _ = self.session.transition(SessionEvent::Reset);
        self.cancel = CancelToken::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, MemoryStore, Script, ScriptedAuthority};
    use folio_core::{OutcomeClass, StatusMode, SubmissionStatus};

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn population() -> Arc<MemoryStore> {
        let mut dup = doc("dup", "F001", 4, SubmissionStatus::Accepted, 4);
        dup.response_code = Some("2033".into());
        dup.response_description = Some("El comprobante ya existe".into());

        let mut ok = doc("ok", "F001", 5, SubmissionStatus::Accepted, 5);
        ok.response_code = Some("0".into());
        ok.response_description = Some("La Factura ha sido aceptada".into());

        MemoryStore::new(vec![
            doc("a", "F001", 1, SubmissionStatus::Rejected, 1),
            doc("b", "F001", 2, SubmissionStatus::Pending, 2),
            doc("c", "F001", 3, SubmissionStatus::Sending, 3),
            dup,
            ok,
        ])
    }

    fn problematic() -> SelectionCriteria {
        SelectionCriteria::new("F001", None, StatusMode::Problematic, None).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_cycle() {
        let store = population();
        store.set_counter("F002", 50);
        let authority = Arc::new(ScriptedAuthority::new(
            store.clone(),
            &[("c", Script::Fail("503 Service Unavailable"))],
        ));

        let mut workflow = RenumberWorkflow::new(store.clone(), &config()).with_authority(authority.clone());

        assert_eq!(workflow.search(problematic()).await.unwrap(), 4);
        workflow.select_all().unwrap();

        let preview = workflow.preview("f002").await.unwrap();
        let mapping: Vec<(&str, &str)> = preview
            .entries
            .iter()
            .map(|e| (e.document_id.as_str(), e.new_number.as_str()))
            .collect();
        assert_eq!(
            mapping,
            vec![
                ("a", "F002-00000051"),
                ("b", "F002-00000052"),
                ("c", "F002-00000053"),
                ("dup", "F002-00000054"),
            ]
        );

        let commit = workflow.commit().await.unwrap();
        assert_eq!(commit.class(), OutcomeClass::FullSuccess);
        assert_eq!(workflow.state(), SessionState::Committed);
        assert_eq!(store.counter().unwrap().last_number, 54);

        let report = workflow.resubmit().await.unwrap();
        assert_eq!(workflow.state(), SessionState::Done);
        assert_eq!((report.accepted, report.rejected, report.other), (3, 0, 1));
        assert_eq!(report.class(), OutcomeClass::PartialSuccess);
        assert_eq!(authority.calls(), vec!["a", "b", "c", "dup"]);

        // Resubmitting again re-runs the same set.
        let again = workflow.resubmit().await.unwrap();
        assert_eq!(again.total(), 4);
        assert_eq!(store.document("dup").number, "F002-00000054");
    }

    #[tokio::test]
    async fn test_validation_errors_block_phases() {
        let store = population();
        let mut workflow = RenumberWorkflow::new(store.clone(), &config());

        // Nothing loaded yet.
        assert!(workflow.preview("F002").await.unwrap_err().is_validation());
        assert!(workflow.commit().await.unwrap_err().is_validation());

        // No candidates.
        let none = SelectionCriteria::new("B001", None, StatusMode::All, None).unwrap();
        let err = workflow.search(none).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::NoCandidates)));
        assert_eq!(workflow.state(), SessionState::Searching);

        workflow.search(problematic()).await.unwrap();

        // Empty selection.
        let err = workflow.preview("F002").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::EmptySelection)));

        workflow.select(vec!["a".into()]).unwrap();

        // Bad and duplicate target series.
        assert!(workflow.preview("").await.unwrap_err().is_validation());
        assert!(workflow.preview("1X").await.unwrap_err().is_validation());
        let err = workflow.preview("F001").await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::Duplicate { .. })));
        assert_eq!(workflow.state(), SessionState::CandidatesLoaded);

        // Commit before preview.
        assert!(workflow.commit().await.unwrap_err().is_validation());
        assert!(store.renumber_calls().is_empty());
    }

    #[tokio::test]
    async fn test_resubmit_requires_committed_documents() {
        let store = population();
        store.fail_renumber_of("a");
        let authority = Arc::new(ScriptedAuthority::new(store.clone(), &[]));
        let mut workflow = RenumberWorkflow::new(store.clone(), &config()).with_authority(authority.clone());

        workflow.search(problematic()).await.unwrap();
        workflow.select(vec!["a".into()]).unwrap();
        workflow.preview("F002").await.unwrap();

        let outcome = workflow.commit().await.unwrap();
        assert_eq!(outcome.class(), OutcomeClass::FullFailure);

        let err = workflow.resubmit().await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::NothingCommitted)));
        assert!(authority.calls().is_empty());
    }

    #[tokio::test]
    async fn test_resubmit_without_authority() {
        let store = population();
        let mut workflow = RenumberWorkflow::new(store.clone(), &config());

        workflow.search(problematic()).await.unwrap();
        workflow.select(vec!["a".into()]).unwrap();
        workflow.preview("F002").await.unwrap();
        workflow.commit().await.unwrap();

        let err = workflow.resubmit().await.unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(workflow.state(), SessionState::Committed);
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_selection() {
        let store = population();

        let mut dedupe = RenumberWorkflow::new(store.clone(), &config());
        dedupe.search(problematic()).await.unwrap();
        dedupe
            .select(vec!["a".into(), "b".into(), "a".into()])
            .unwrap();
        let preview = dedupe.preview("F002").await.unwrap();
        let correlatives: Vec<i64> = preview.entries.iter().map(|e| e.new_correlative).collect();
        assert_eq!(correlatives, vec![1, 2]);

        let mut strict_config = config();
        strict_config.numbering.duplicate_policy = folio_core::DuplicatePolicy::Reject;
        let mut strict = RenumberWorkflow::new(store.clone(), &strict_config);
        strict.search(problematic()).await.unwrap();
        let err = strict
            .select(vec!["a".into(), "b".into(), "a".into()])
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(ValidationError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn test_reset_discards_session_only() {
        let store = population();
        let mut workflow = RenumberWorkflow::new(store.clone(), &config());

        workflow.search(problematic()).await.unwrap();
        workflow.select(vec!["a".into()]).unwrap();
        workflow.preview("F002").await.unwrap();
        workflow.commit().await.unwrap();

        let old_token = workflow.cancel_token();
        workflow.reset();
        old_token.cancel();

        assert_eq!(workflow.state(), SessionState::Searching);
        assert!(workflow.session().candidates().is_empty());
        assert!(!workflow.cancel_token().is_cancelled());
        assert_eq!(store.document("a").number, "F002-00000001");
    }

    #[tokio::test]
    async fn test_cancelled_commit_still_finishes_session() {
        let store = population();
        let mut workflow = RenumberWorkflow::new(store.clone(), &config());

        workflow.search(problematic()).await.unwrap();
        workflow.select_all().unwrap();
        workflow.preview("F002").await.unwrap();

        workflow.cancel_token().cancel();
        let outcome = workflow.commit().await.unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.committed_count(), 0);
        assert_eq!(workflow.state(), SessionState::Committed);
    }

    /// Cancels its token as soon as the first commit item is done.
    struct CancelAfterFirstItem(CancelToken);

    impl RenumberEventEmitter for CancelAfterFirstItem {
        fn emit_phase(&self, _phase: Phase) {}
        fn emit_progress(&self, event: &crate::events::ProgressEvent) {
            if event.phase == Phase::Commit && event.current == 1 {
                self.0.cancel();
            }
        }
        fn emit_commit_summary(&self, _outcome: &CommitOutcome) {}
        fn emit_resubmit_report(&self, _outcome: &ResubmitOutcome) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_runs_after_cancelled_commit() {
        let store = population();
        store.set_counter("F002", 50);
        let authority = Arc::new(ScriptedAuthority::new(store.clone(), &[]));

        let workflow = RenumberWorkflow::new(store.clone(), &config()).with_authority(authority.clone());
        let token = workflow.cancel_token();
        let mut workflow = workflow.with_emitter(Arc::new(CancelAfterFirstItem(token.clone())));

        workflow.search(problematic()).await.unwrap();
        workflow.select_all().unwrap();
        workflow.preview("F002").await.unwrap();

        let commit = workflow.commit().await.unwrap();
        assert!(commit.cancelled);
        assert_eq!(commit.committed_count(), 1);
        assert_eq!(commit.class(), OutcomeClass::PartialSuccess);
        assert!(!token.is_cancelled());

        let report = workflow.resubmit().await.unwrap();
        assert!(!report.cancelled);
        assert_eq!(authority.calls(), vec!["a"]);
        assert_eq!(report.class(), OutcomeClass::FullSuccess);
        assert_eq!(workflow.state(), SessionState::Done);
    }
}
