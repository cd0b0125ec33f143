//! Handlers for CSV export reports.
//!
//! Submission only enqueues: the response returns as soon as the job row
//! is durable, and the worker process picks it up from there. Status is
//! read back from the `csv_exports` registry, which the reconciler keeps
//! current.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use actionledger_core::error::CoreError;
use actionledger_core::export::JOB_TYPE_ACTIONS_CSV_EXPORT;
use actionledger_core::filter::ActionFilter;
use actionledger_core::types::DbId;
use actionledger_db::models::csv_export::CsvExport;
use actionledger_db::repositories::{CsvExportRepo, JobRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body for `POST /reports/actions/csv_export`.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitExportRequest {
    /// Filter restricting which actions are exported. Absent or empty
    /// means export everything.
    #[serde(default)]
    pub filters: ActionFilter,
}

/// Acknowledgement for a submitted export job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExportResponse {
    pub job_id: String,
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Submit export
// ---------------------------------------------------------------------------

/// POST /reports/actions/csv_export
///
/// Enqueue an asynchronous CSV export of all actions matching the given
/// filters. Returns 202 with the queue job id.
pub async fn submit_export(
    State(state): State<AppState>,
    Json(request): Json<SubmitExportRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<SubmitExportResponse>>)> {
    let parameters = serde_json::to_value(&request.filters)
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let job = JobRepo::submit(&state.pool, JOB_TYPE_ACTIONS_CSV_EXPORT, &parameters).await?;
    tracing::info!(job_id = job.id, "Export job submitted");

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmitExportResponse {
                job_id: job.id.to_string(),
                status: "queued",
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// List / read exports
// ---------------------------------------------------------------------------

/// GET /reports/actions/csv_export
///
/// List export records, most recent first. Failed and cancelled runs
/// stay visible through their `status` column.
pub async fn list_exports(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<CsvExport>>>> {
    let exports = CsvExportRepo::list_recent(&state.pool).await?;
    Ok(Json(DataResponse { data: exports }))
}

/// GET /reports/actions/csv_export/{job_id}
///
/// Read a single export record by its queue job id. Jobs that are still
/// pending in the queue have no registry row yet and return 404.
pub async fn get_export(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<DataResponse<CsvExport>>> {
    let id: DbId = job_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid job id: {job_id}")))?;

    let export = CsvExportRepo::find_by_job_id(&state.pool, &job_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "export",
            id,
        })?;
    Ok(Json(DataResponse { data: export }))
}
