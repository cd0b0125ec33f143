//! Handlers for action listing.
//!
//! Filter dimensions arrive as comma-separated query parameters and are
//! validated before any query runs; a malformed value is the caller's
//! error, never a silent empty result.

use std::str::FromStr;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use actionledger_core::action::ActionType;
use actionledger_core::cursor::decode_cursor;
use actionledger_core::filter::ActionFilter;
use actionledger_core::pagination::{self, ActionPage, DEFAULT_PAGE_SIZE};
use actionledger_core::types::{DbId, Timestamp};
use actionledger_db::store::PgActionStore;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /actions`.
///
/// List-valued dimensions are comma-separated; an absent or empty
/// parameter leaves the dimension unconstrained.
#[derive(Debug, Default, Deserialize)]
pub struct ActionListParams {
    pub user_id: Option<String>,
    pub action_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub metadata_ip: Option<String>,
    pub metadata_sign: Option<String>,
    pub limit: Option<i64>,
    pub after: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a comma-separated parameter into trimmed, non-empty items and
/// parse each one.
fn parse_list<T: FromStr>(
    raw: &Option<String>,
    describe: impl Fn(&str) -> String,
) -> AppResult<Vec<T>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|_| AppError::BadRequest(describe(s))))
        .collect()
}

/// Parse an optional RFC 3339 timestamp parameter.
fn parse_timestamp(raw: &Option<String>, name: &str) -> AppResult<Option<Timestamp>> {
    match raw {
        Some(v) => v
            .parse::<Timestamp>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("Invalid {name}: expected RFC 3339 date"))),
        None => Ok(None),
    }
}

/// Build an [`ActionFilter`] from validated query parameters.
fn build_filter(params: &ActionListParams) -> AppResult<ActionFilter> {
    Ok(ActionFilter {
        user_id: parse_list::<DbId>(&params.user_id, |s| format!("Invalid user id: {s}"))?,
        action_type: parse_list::<ActionType>(&params.action_type, |s| {
            format!("Unknown action type: {s}")
        })?,
        date_from: parse_timestamp(&params.date_from, "date_from")?,
        date_to: parse_timestamp(&params.date_to, "date_to")?,
        metadata_ip: parse_list::<String>(&params.metadata_ip, |s| {
            format!("Invalid metadata ip: {s}")
        })?,
        metadata_sign: parse_list::<String>(&params.metadata_sign, |s| {
            format!("Invalid metadata sign: {s}")
        })?,
    })
}

// ---------------------------------------------------------------------------
// List actions
// ---------------------------------------------------------------------------

/// GET /actions
///
/// Cursor-paginated, filtered slice of the action log in ascending id
/// order. The response carries the page plus opaque cursors; passing
/// `after=<endCursor>` yields the next page.
pub async fn list_actions(
    State(state): State<AppState>,
    Query(params): Query<ActionListParams>,
) -> AppResult<Json<ActionPage>> {
    let filter = build_filter(&params)?;

    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    pagination::validate_page_size(limit).map_err(AppError::Core)?;

    let after = match &params.after {
        Some(token) => Some(decode_cursor(token).map_err(AppError::Core)?),
        None => None,
    };

    let store = PgActionStore::new(state.pool.clone());
    let page = pagination::page(&store, &filter, limit, after)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(Json(page))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_are_split_and_parsed() {
        let params = ActionListParams {
            user_id: Some("1, 2,3".into()),
            action_type: Some("CONVERT,UPLOAD".into()),
            ..Default::default()
        };
        let filter = build_filter(&params).unwrap();
        assert_eq!(filter.user_id, vec![1, 2, 3]);
        assert_eq!(
            filter.action_type,
            vec![ActionType::Convert, ActionType::Upload]
        );
    }

    #[test]
    fn empty_and_absent_parameters_leave_dimensions_unconstrained() {
        let params = ActionListParams {
            user_id: Some("".into()),
            ..Default::default()
        };
        let filter = build_filter(&params).unwrap();
        assert!(filter.is_unconstrained());
    }

    #[test]
    fn malformed_user_id_is_a_bad_request() {
        let params = ActionListParams {
            user_id: Some("1,banana".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_filter(&params),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_action_type_is_a_bad_request() {
        let params = ActionListParams {
            action_type: Some("SHRINK".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_filter(&params),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn date_bounds_parse_rfc3339() {
        let params = ActionListParams {
            date_from: Some("2024-01-01T00:00:00Z".into()),
            date_to: Some("2024-02-01T00:00:00Z".into()),
            ..Default::default()
        };
        let filter = build_filter(&params).unwrap();
        assert!(filter.date_from.unwrap() < filter.date_to.unwrap());

        let params = ActionListParams {
            date_from: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(matches!(
            build_filter(&params),
            Err(AppError::BadRequest(_))
        ));
    }
}
