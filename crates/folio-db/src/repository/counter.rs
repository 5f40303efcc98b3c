//! # Series Counter Repository
//!
//! The per-document-type counter is the one record several renumbering
//! sessions write concurrently. Every change is a read-modify-write inside
//! a transaction, and `last_number` only ever moves up.
//!
//! ## Raise Decision
//! ```text
//!   current counter            policy              result
//!   ────────────────────────   ─────────────────   ─────────────────────────────
//!   series == target           any                 last = MAX(last, highest)
//!   other series / missing     KeepActiveSeries    untouched
//!   other series / missing     PromoteTarget       series = target, last = highest
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use folio_core::{CounterPolicy, CounterUpdate, DocumentType, SeriesCounter};

#[derive(Debug, sqlx::FromRow)]
struct CounterRow {
    document_type: DocumentType,
    series: String,
    last_number: i64,
}

impl From<CounterRow> for SeriesCounter {
    fn from(row: CounterRow) -> Self {
        SeriesCounter {
            document_type: row.document_type,
            series: row.series,
            last_number: row.last_number,
        }
    }
}

/// Repository for the shared series counters.
#[derive(Debug, Clone)]
pub struct SeriesCounterRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SeriesCounterRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        SeriesCounterRepository { pool, tenant_id }
    }

    /// Reads the counter for `document_type`. Never cached.
    pub async fn get(&self, document_type: DocumentType) -> DbResult<Option<SeriesCounter>> {
        let row: Option<CounterRow> = sqlx::query_as(
            r#"
            SELECT document_type, series, last_number
            FROM series_counters
            WHERE tenant_id = ?1 AND document_type = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SeriesCounter::from))
    }

    /// Creates or replaces a counter (provisioning and seeding).
    pub async fn set(&self, counter: &SeriesCounter) -> DbResult<()> {
        debug!(
            document_type = %counter.document_type,
            series = %counter.series,
            last_number = counter.last_number,
            "Setting series counter"
        );

        sqlx::query(
            r#"
            INSERT INTO series_counters (tenant_id, document_type, series, last_number, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (tenant_id, document_type) DO UPDATE SET
                series = excluded.series,
                last_number = excluded.last_number,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.tenant_id)
        .bind(counter.document_type)
        .bind(&counter.series)
        .bind(counter.last_number)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Raises the counter after a commit whose highest assigned correlative
    /// in `target_series` is `highest`.
    pub async fn raise(
        &self,
        document_type: DocumentType,
        target_series: &str,
        highest: i64,
        policy: CounterPolicy,
    ) -> DbResult<CounterUpdate> {
        if highest < 0 {
            return Err(DbError::CheckViolation {
                message: format!("counter value {} is negative", highest),
            });
        }

        let mut tx = self.pool.begin().await?;

        let current: Option<CounterRow> = sqlx::query_as(
            r#"
            SELECT document_type, series, last_number
            FROM series_counters
            WHERE tenant_id = ?1 AND document_type = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(document_type)
        .fetch_optional(&mut *tx)
        .await?;

        let update = match (current, policy) {
            (Some(row), _) if row.series == target_series => {
                sqlx::query(
                    r#"
                    UPDATE series_counters SET
                        last_number = MAX(last_number, ?3),
                        updated_at = ?4
                    WHERE tenant_id = ?1 AND document_type = ?2
                    "#,
                )
                .bind(&self.tenant_id)
                .bind(document_type)
                .bind(highest)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                CounterUpdate::Raised {
                    series: row.series,
                    before: row.last_number,
                    after: row.last_number.max(highest),
                }
            }

            (current, CounterPolicy::KeepActiveSeries) => CounterUpdate::Unchanged {
                active_series: current.map(|row| row.series),
            },

            (_, CounterPolicy::PromoteTarget) => {
                sqlx::query(
                    r#"
                    INSERT INTO series_counters (tenant_id, document_type, series, last_number, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT (tenant_id, document_type) DO UPDATE SET
                        series = excluded.series,
                        last_number = excluded.last_number,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(&self.tenant_id)
                .bind(document_type)
                .bind(target_series)
                .bind(highest)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

                CounterUpdate::Created {
                    series: target_series.to_string(),
                    last_number: highest,
                }
            }
        };

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(document_type = %document_type, update = ?update, "Series counter updated");
        Ok(update)
    }
}
