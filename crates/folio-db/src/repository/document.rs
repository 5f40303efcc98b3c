//! # Document Repository
//!
//! Database operations for electronic documents.
//!
//! ## Renumbering Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_renumber(entry)            one transaction per document          │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── SELECT current number           (NotFound if missing)            │
//! │   ├── UPDATE documents SET series, correlative, number,                │
//! │   │          status = 'pending', response/hashes = NULL,               │
//! │   │          previous_number, renumbered_at                            │
//! │   │          (UNIQUE (tenant, series, correlative) may fire here)      │
//! │   └── INSERT renumber_audit_log                                         │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents are never batched into one transaction: a failure on one
//! leaves the others untouched.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use folio_core::{
    format_document_number, Document, DocumentType, PreviewEntry, RenumberAudit, SubmissionStatus,
};

const DOCUMENT_COLUMNS: &str = r#"
    id,
    tenant_id,
    document_type,
    series,
    correlative_number,
    number,
    submission_status,
    response_code,
    response_description,
    signature_hash,
    receipt_hash,
    created_at,
    updated_at,
    previous_number,
    renumbered_at
"#;

/// Row shape of the `documents` table.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    tenant_id: String,
    document_type: DocumentType,
    series: String,
    correlative_number: i64,
    number: String,
    submission_status: SubmissionStatus,
    response_code: Option<String>,
    response_description: Option<String>,
    signature_hash: Option<String>,
    receipt_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    previous_number: Option<String>,
    renumbered_at: Option<DateTime<Utc>>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let renumber_audit = match (row.previous_number, row.renumbered_at) {
            (Some(previous_number), Some(renumbered_at)) => Some(RenumberAudit {
                previous_number,
                renumbered_at,
            }),
            _ => None,
        };

        Document {
            id: row.id,
            tenant_id: row.tenant_id,
            document_type: row.document_type,
            series: row.series,
            correlative_number: row.correlative_number,
            number: row.number,
            submission_status: row.submission_status,
            response_code: row.response_code,
            response_description: row.response_description,
            signature_hash: row.signature_hash,
            receipt_hash: row.receipt_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
            renumber_audit,
        }
    }
}

/// Repository for document database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.documents();
///
/// let all = repo.list_all().await?;
/// let doc = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository scoped to `tenant_id`.
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        DocumentRepository { pool, tenant_id }
    }

    /// Inserts a document. The stored tenant is always the repository's.
    pub async fn insert(&self, doc: &Document) -> DbResult<()> {
        debug!(id = %doc.id, number = %doc.number, "Inserting document");

        let (previous_number, renumbered_at) = match &doc.renumber_audit {
            Some(audit) => (Some(audit.previous_number.clone()), Some(audit.renumbered_at)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, tenant_id, document_type, series, correlative_number, number,
                submission_status, response_code, response_description,
                signature_hash, receipt_hash, created_at, updated_at,
                previous_number, renumbered_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15
            )
            "#,
        )
        .bind(&doc.id)
        .bind(&self.tenant_id)
        .bind(doc.document_type)
        .bind(&doc.series)
        .bind(doc.correlative_number)
        .bind(format_document_number(&doc.series, doc.correlative_number))
        .bind(doc.submission_status)
        .bind(&doc.response_code)
        .bind(&doc.response_description)
        .bind(&doc.signature_hash)
        .bind(&doc.receipt_hash)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .bind(previous_number)
        .bind(renumbered_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every document of the tenant, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Document>> {
        let sql = format!(
            "SELECT {} FROM documents WHERE tenant_id = ?1 ORDER BY created_at ASC, id ASC",
            DOCUMENT_COLUMNS
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded document population");
        Ok(rows.into_iter().map(Document::from).collect())
    }

    /// Gets a document by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Document))` - Document found
    /// * `Ok(None)` - Document not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Document>> {
        let sql = format!(
            "SELECT {} FROM documents WHERE tenant_id = ?1 AND id = ?2",
            DOCUMENT_COLUMNS
        );
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Document::from))
    }

    /// Correlatives already used in `series`.
    pub async fn used_correlatives(&self, series: &str) -> DbResult<Vec<i64>> {
        let used: Vec<i64> = sqlx::query_scalar(
            "SELECT correlative_number FROM documents WHERE tenant_id = ?1 AND series = ?2",
        )
        .bind(&self.tenant_id)
        .bind(series)
        .fetch_all(&self.pool)
        .await?;

        Ok(used)
    }

    /// Counts the tenant's documents.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE tenant_id = ?1")
            .bind(&self.tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Renumbers one document and appends its audit row.
    ///
    /// Resets the submission status to `pending`, clears the authority
    /// response and hashes, and overwrites the last-renumber fields.
    ///
    /// Returns the document as written by the transaction. Nothing is read
    /// after the commit, so a success here means the row moved.
    pub async fn apply_renumber(&self, entry: &PreviewEntry, at: DateTime<Utc>) -> DbResult<Document> {
        debug!(
            document_id = %entry.document_id,
            old_number = %entry.old_number,
            new_number = %entry.new_number,
            "Applying renumber"
        );

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM documents WHERE tenant_id = ?1 AND id = ?2",
            DOCUMENT_COLUMNS
        );
        let current: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(&self.tenant_id)
            .bind(&entry.document_id)
            .fetch_optional(&mut *tx)
            .await?;
        let current: Document = current
            .map(Document::from)
            .ok_or_else(|| DbError::not_found("Document", &entry.document_id))?;

        let renumbered = current.renumbered(&entry.new_series, entry.new_correlative, at);
        let previous_number = &current.number;
        let new_number = &renumbered.number;

        sqlx::query(
            r#"
            UPDATE documents SET
                series = ?3,
                correlative_number = ?4,
                number = ?5,
                submission_status = 'pending',
                response_code = NULL,
                response_description = NULL,
                signature_hash = NULL,
                receipt_hash = NULL,
                previous_number = ?6,
                renumbered_at = ?7,
                updated_at = ?7
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&entry.document_id)
        .bind(&renumbered.series)
        .bind(renumbered.correlative_number)
        .bind(new_number)
        .bind(previous_number)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: new_number.clone(),
            },
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO renumber_audit_log (
                id, tenant_id, document_id, previous_number, new_number, renumbered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&self.tenant_id)
        .bind(&entry.document_id)
        .bind(previous_number)
        .bind(new_number)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(renumbered)
    }

    /// Records the authority's verdict on a document.
    pub async fn update_submission(
        &self,
        id: &str,
        status: SubmissionStatus,
        response_code: Option<&str>,
        response_description: Option<&str>,
    ) -> DbResult<()> {
        debug!(document_id = %id, status = %status, "Updating submission status");

        let result = sqlx::query(
            r#"
            UPDATE documents SET
                submission_status = ?3,
                response_code = ?4,
                response_description = ?5,
                updated_at = ?6
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(status)
        .bind(response_code)
        .bind(response_description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }
        Ok(())
    }

    /// Puts a stuck document back to `pending` with an explanatory description.
    pub async fn reset_to_pending(&self, id: &str, description: &str) -> DbResult<()> {
        debug!(document_id = %id, "Resetting document to pending");

        let result = sqlx::query(
            r#"
            UPDATE documents SET
                submission_status = 'pending',
                response_code = NULL,
                response_description = ?3,
                updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
