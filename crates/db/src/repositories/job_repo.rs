//! Repository for the `jobs` table.
//!
//! The jobs table is the durable queue: the API inserts pending rows and
//! workers claim them atomically. Uses `JobStatus` from `models::status`
//! for all status transitions; no magic numbers.

use actionledger_core::types::DbId;
use sqlx::PgPool;

use crate::models::job::Job;
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_type, status_id, parameters, error_message, \
    progress_percent, submitted_at, claimed_at, started_at, \
    completed_at, created_at, updated_at";

/// Provides queue operations for background jobs.
pub struct JobRepo;

impl JobRepo {
    /// Create a new pending job. Returns immediately with the job row.
    pub async fn submit(
        pool: &PgPool,
        job_type: &str,
        parameters: &serde_json::Value,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_type, status_id, parameters) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_type)
            .bind(JobStatus::Pending.id())
            .bind(parameters)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the next unclaimed pending job of the given type.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so concurrent workers never
    /// claim the same row twice.
    pub async fn claim_next(pool: &PgPool, job_type: &str) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET claimed_at = NOW(), status_id = $1, updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE job_type = $2 AND status_id = $3 AND claimed_at IS NULL \
                 ORDER BY submitted_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(job_type)
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Set `started_at` when a job begins actual execution.
    pub async fn mark_started(pool: &PgPool, job_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE jobs SET started_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(job_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a job as completed and set progress to 100.
    pub async fn complete(pool: &PgPool, job_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_at = NOW(), \
                 progress_percent = 100, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job as failed with an error message.
    ///
    /// No automatic retry is performed; re-running a failed export means
    /// submitting a new job, which re-scans from id 0 and overwrites the
    /// output file.
    pub async fn fail(pool: &PgPool, job_id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, error_message = $3, \
                 completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job as cancelled if it is not already terminal.
    ///
    /// Returns `true` if the job was cancelled by this call.
    pub async fn cancel(pool: &PgPool, job_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($3, $4, $5)",
        )
        .bind(job_id)
        .bind(JobStatus::Cancelled.id())
        .bind(JobStatus::Completed.id())
        .bind(JobStatus::Failed.id())
        .bind(JobStatus::Cancelled.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a job by its id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
