//! # Renumber Audit Repository
//!
//! Read side of the append-only `renumber_audit_log`. Rows are written by
//! [`DocumentRepository::apply_renumber`](super::document::DocumentRepository::apply_renumber)
//! inside the same transaction as the document update, so a committed
//! renumbering always has its history row.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use folio_core::RenumberAuditEntry;

#[derive(Debug, sqlx::FromRow)]
struct AuditRow {
    id: String,
    document_id: String,
    previous_number: String,
    new_number: String,
    renumbered_at: DateTime<Utc>,
}

impl From<AuditRow> for RenumberAuditEntry {
    fn from(row: AuditRow) -> Self {
        RenumberAuditEntry {
            id: row.id,
            document_id: row.document_id,
            previous_number: row.previous_number,
            new_number: row.new_number,
            renumbered_at: row.renumbered_at,
        }
    }
}

/// Repository for renumbering history.
#[derive(Debug, Clone)]
pub struct RenumberAuditRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl RenumberAuditRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        RenumberAuditRepository { pool, tenant_id }
    }

    /// Full history of one document, oldest first.
    pub async fn history(&self, document_id: &str) -> DbResult<Vec<RenumberAuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, document_id, previous_number, new_number, renumbered_at
            FROM renumber_audit_log
            WHERE tenant_id = ?1 AND document_id = ?2
            ORDER BY renumbered_at ASC, rowid ASC
            "#,
        )
        .bind(&self.tenant_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RenumberAuditEntry::from).collect())
    }

    /// Most recent renumberings across the tenant, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<RenumberAuditEntry>> {
        let rows: Vec<AuditRow> = sqlx::query_as(
            r#"
            SELECT id, document_id, previous_number, new_number, renumbered_at
            FROM renumber_audit_log
            WHERE tenant_id = ?1
            ORDER BY renumbered_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RenumberAuditEntry::from).collect())
    }
}
