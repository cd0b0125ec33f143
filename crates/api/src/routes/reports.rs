use axum::routing::get;
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

/// Mount CSV export report routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/reports/actions/csv_export",
            get(reports::list_exports).post(reports::submit_export),
        )
        .route(
            "/reports/actions/csv_export/{job_id}",
            get(reports::get_export),
        )
}
