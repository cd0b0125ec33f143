use axum::routing::get;
use axum::Router;

use crate::handlers::actions;
use crate::state::AppState;

/// Mount action listing routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/actions", get(actions::list_actions))
}
