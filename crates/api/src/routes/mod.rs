pub mod actions;
pub mod health;
pub mod reports;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /actions                                 list actions (GET)
///
/// /reports/actions/csv_export              submit export (POST), list exports (GET)
/// /reports/actions/csv_export/{job_id}     export record (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(actions::router())
        .merge(reports::router())
}
