//! Search → preview → commit → resubmit against a real SQLite store.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use folio_core::{
    format_document_number, CounterUpdate, Document, DocumentType, OutcomeClass, ResubmitItemStatus,
    SelectionCriteria, SeriesCounter, SessionState, StatusMode, SubmissionStatus,
};
use folio_db::{Database, DbConfig};
use folio_engine::{
    reset_stuck, EngineConfig, EngineError, EngineResult, NoOpEmitter, RenumberWorkflow, SubmissionReceipt,
    ValidationAuthority,
};

/// Authority that writes its verdict straight into the database, rejecting
/// the ids it was told to.
struct LocalAuthority {
    db: Database,
    reject: Vec<String>,
    fail: Vec<String>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ValidationAuthority for LocalAuthority {
    async fn submit(&self, document_id: &str) -> EngineResult<SubmissionReceipt> {
        self.calls.lock().unwrap().push(document_id.to_string());

        if self.fail.iter().any(|id| id == document_id) {
            return Err(EngineError::Authority("servicio no disponible".into()));
        }

        let (status, code, message) = if self.reject.iter().any(|id| id == document_id) {
            (SubmissionStatus::Rejected, "2017", "El RUC del receptor no existe")
        } else {
            (SubmissionStatus::Accepted, "0", "La Factura ha sido aceptada")
        };
        self.db
            .documents()
            .update_submission(document_id, status, Some(code), Some(message))
            .await?;

        Ok(SubmissionReceipt {
            success: true,
            status: None,
            message: Some("received".into()),
            observations: vec![],
        })
    }
}

fn document(db: &Database, id: &str, n: i64, status: SubmissionStatus, code: &str, desc: &str) -> Document {
    let created_at = Utc::now() - Duration::hours(10) + Duration::minutes(n);
    Document {
        id: id.to_string(),
        tenant_id: db.tenant_id().to_string(),
        document_type: DocumentType::Invoice,
        series: "F001".into(),
        correlative_number: n,
        number: format_document_number("F001", n),
        submission_status: status,
        response_code: Some(code.into()),
        response_description: Some(desc.into()),
        signature_hash: Some("abc".into()),
        receipt_hash: None,
        created_at,
        updated_at: created_at,
        renumber_audit: None,
    }
}

async fn seeded() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let docs = db.documents();

    docs.insert(&document(&db, "a", 1, SubmissionStatus::Rejected, "2017", "RUC no existe"))
        .await
        .unwrap();
    docs.insert(&document(&db, "b", 2, SubmissionStatus::Accepted, "2033", "El comprobante ya existe"))
        .await
        .unwrap();
    docs.insert(&document(&db, "c", 3, SubmissionStatus::Accepted, "0", "La Factura ha sido aceptada"))
        .await
        .unwrap();
    docs.insert(&document(&db, "d", 4, SubmissionStatus::Rejected, "0109", "El servicio no está disponible"))
        .await
        .unwrap();

    db.counters()
        .set(&SeriesCounter {
            document_type: DocumentType::Invoice,
            series: "F002".into(),
            last_number: 50,
        })
        .await
        .unwrap();

    db
}

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.resubmit.delay_ms = 5;
    config
}

#[tokio::test]
async fn renumber_and_resubmit_problematic_documents() {
    let db = seeded().await;
    let authority = Arc::new(LocalAuthority {
        db: db.clone(),
        reject: vec!["d".into()],
        fail: vec![],
        calls: Mutex::new(Vec::new()),
    });

    let mut workflow = RenumberWorkflow::new(Arc::new(db.clone()), &fast_config()).with_authority(authority.clone());

    let criteria = SelectionCriteria::new("F001", Some(DocumentType::Invoice), StatusMode::Problematic, None).unwrap();
    assert_eq!(workflow.search(criteria).await.unwrap(), 3);
    workflow.select_all().unwrap();

    let preview = workflow.preview("F002").await.unwrap();
    let numbers: Vec<&str> = preview.entries.iter().map(|e| e.new_number.as_str()).collect();
    assert_eq!(numbers, vec!["F002-00000051", "F002-00000052", "F002-00000053"]);

    let commit = workflow.commit().await.unwrap();
    assert_eq!(commit.class(), OutcomeClass::FullSuccess);
    assert_eq!(
        commit.counter,
        Some(CounterUpdate::Raised {
            series: "F002".into(),
            before: 50,
            after: 53
        })
    );

    for (id, number, old) in [
        ("a", "F002-00000051", "F001-00000001"),
        ("b", "F002-00000052", "F001-00000002"),
        ("d", "F002-00000053", "F001-00000004"),
    ] {
        let doc = db.documents().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(doc.number, number);
        assert_eq!(doc.submission_status, SubmissionStatus::Pending);
        assert!(doc.response_code.is_none());
        assert_eq!(doc.renumber_audit.unwrap().previous_number, old);
    }
    assert_eq!(db.counters().get(DocumentType::Invoice).await.unwrap().unwrap().last_number, 53);
    assert_eq!(db.audit().recent(10).await.unwrap().len(), 3);

    let report = workflow.resubmit().await.unwrap();
    assert_eq!(workflow.state(), SessionState::Done);
    assert_eq!((report.accepted, report.rejected, report.other), (2, 1, 0));
    assert_eq!(report.class(), OutcomeClass::PartialSuccess);
    assert_eq!(report.items[2].status, ResubmitItemStatus::Rejected);
    assert_eq!(*authority.calls.lock().unwrap(), vec!["a", "b", "d"]);

    // The untouched accepted document keeps its number.
    let c = db.documents().get_by_id("c").await.unwrap().unwrap();
    assert_eq!(c.number, "F001-00000003");
}

#[tokio::test]
async fn resubmission_failure_is_isolated() {
    let db = seeded().await;
    let authority = Arc::new(LocalAuthority {
        db: db.clone(),
        reject: vec![],
        fail: vec!["b".into()],
        calls: Mutex::new(Vec::new()),
    });

    let mut workflow = RenumberWorkflow::new(Arc::new(db.clone()), &fast_config()).with_authority(authority);

    let criteria = SelectionCriteria::new("F001", None, StatusMode::Problematic, None).unwrap();
    workflow.search(criteria).await.unwrap();
    workflow.select(vec!["a".into(), "b".into()]).unwrap();
    workflow.preview("F002").await.unwrap();
    workflow.commit().await.unwrap();

    let report = workflow.resubmit().await.unwrap();
    assert_eq!((report.accepted, report.rejected, report.other), (1, 0, 1));
    assert_eq!(report.class(), OutcomeClass::PartialSuccess);
    assert_eq!(report.items[1].status, ResubmitItemStatus::Error);
    assert_eq!(report.items[1].number, "F002-00000052");
}

#[tokio::test]
async fn reset_stuck_against_sqlite() {
    let db = seeded().await;
    let config = EngineConfig::default();

    let outcome = reset_stuck(
        &db,
        &config.classifier.transient_classifier(),
        config.classifier.sending_grace().unwrap(),
        Utc::now(),
        config.store_timeout(),
        &NoOpEmitter,
    )
    .await
    .unwrap();

    assert_eq!(outcome.reset.len(), 1);
    assert_eq!(outcome.reset[0].document_id, "d");

    let d = db.documents().get_by_id("d").await.unwrap().unwrap();
    assert_eq!(d.submission_status, SubmissionStatus::Pending);
    assert!(d.response_description.unwrap().starts_with("[RESET] previous error: "));
}
