//! Repository for the `csv_exports` registry.
//!
//! Every mutation is a single atomic statement keyed on `job_id`, so
//! concurrent reconciler handlers cannot lose updates between a progress
//! event and a near-simultaneous completion. Duplicate and out-of-order
//! lifecycle events degrade to no-ops:
//!
//! - a second `active` hits `ON CONFLICT DO NOTHING`;
//! - a stale progress value loses against `GREATEST`;
//! - terminal transitions are guarded by `status = 'active'`.

use actionledger_core::export::{ExportOutcome, ExportStatus};
use sqlx::PgPool;

use crate::models::csv_export::CsvExport;

/// Column list for `csv_exports` queries.
const COLUMNS: &str = "\
    id, job_id, status, output_path, total_rows_processed, \
    duration_ms, progress, created_at";

/// Default cap for the export listing.
const LIST_LIMIT: i64 = 100;

/// Provides idempotent upsert and listing operations for export records.
pub struct CsvExportRepo;

impl CsvExportRepo {
    /// Register a job as active, creating its row if none exists yet.
    pub async fn record_active(pool: &PgPool, job_id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO csv_exports (job_id) VALUES ($1) ON CONFLICT (job_id) DO NOTHING")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a progress percentage. Values below the stored one are
    /// ignored; terminal rows are untouched.
    pub async fn record_progress(
        pool: &PgPool,
        job_id: &str,
        percent: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE csv_exports \
             SET progress = GREATEST(progress, $2) \
             WHERE job_id = $1 AND status = 'active'",
        )
        .bind(job_id)
        .bind(percent)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a completed export: result fields plus progress 100.
    ///
    /// Upserts so a completion observed before its `active` event still
    /// lands; an already-terminal row is left untouched.
    pub async fn record_completed(
        pool: &PgPool,
        job_id: &str,
        outcome: &ExportOutcome,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO csv_exports \
                 (job_id, status, output_path, total_rows_processed, duration_ms, progress) \
             VALUES ($1, 'completed', $2, $3, $4, 100) \
             ON CONFLICT (job_id) DO UPDATE \
             SET status = 'completed', output_path = $2, \
                 total_rows_processed = $3, duration_ms = $4, progress = 100 \
             WHERE csv_exports.status = 'active'",
        )
        .bind(job_id)
        .bind(&outcome.output_path)
        .bind(outcome.total_rows)
        .bind(outcome.duration_ms)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a failed or cancelled terminal state. The row keeps its
    /// last known progress.
    pub async fn record_terminal(
        pool: &PgPool,
        job_id: &str,
        status: ExportStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO csv_exports (job_id, status) \
             VALUES ($1, $2) \
             ON CONFLICT (job_id) DO UPDATE SET status = $2 \
             WHERE csv_exports.status = 'active'",
        )
        .bind(job_id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List export records, most recent first, capped at 100.
    pub async fn list_recent(pool: &PgPool) -> Result<Vec<CsvExport>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM csv_exports \
             ORDER BY created_at DESC, id DESC \
             LIMIT {LIST_LIMIT}"
        );
        sqlx::query_as::<_, CsvExport>(&query).fetch_all(pool).await
    }

    /// Find an export record by its queue job id.
    pub async fn find_by_job_id(
        pool: &PgPool,
        job_id: &str,
    ) -> Result<Option<CsvExport>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM csv_exports WHERE job_id = $1");
        sqlx::query_as::<_, CsvExport>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }
}
