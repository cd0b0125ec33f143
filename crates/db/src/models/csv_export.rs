//! Export registry entity model.

use actionledger_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `csv_exports` registry.
///
/// At most one row exists per queue job id; the reconciler upserts on
/// `job_id`, never on the surrogate primary key.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvExport {
    pub id: DbId,
    pub job_id: String,
    pub status: String,
    pub output_path: String,
    pub total_rows_processed: i64,
    pub duration_ms: i64,
    pub progress: i32,
    pub created_at: Timestamp,
}
