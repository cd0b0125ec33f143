//! Keyset pagination over the action log.
//!
//! Pages are ordered strictly by ascending id. `has_next` is derived by
//! fetching one extra row beyond the requested size and trimming it; no
//! COUNT query runs on this path, so page-fetch cost is independent of
//! page depth.

use serde::Serialize;

use crate::action::ActionRecord;
use crate::cursor::encode_cursor;
use crate::error::CoreError;
use crate::filter::ActionFilter;
use crate::store::{ActionStore, StoreError};
use crate::types::DbId;

/// Default page size when the client does not specify one.
pub const DEFAULT_PAGE_SIZE: i64 = 200;

/// Smallest accepted page size.
pub const MIN_PAGE_SIZE: i64 = 1;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 10_000;

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub limit: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// One page of action records plus its pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ActionPage {
    pub data: Vec<ActionRecord>,
    pub pagination: PageMeta,
}

/// Reject page sizes outside [`MIN_PAGE_SIZE`]..=[`MAX_PAGE_SIZE`].
///
/// Out-of-range values are an error, never silently clamped.
pub fn validate_page_size(limit: i64) -> Result<(), CoreError> {
    if (MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&limit) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "limit must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}, got {limit}"
        )))
    }
}

/// Fetch one page of records matching `filter`, starting after the
/// decoded cursor boundary `after`.
///
/// An empty page carries null cursors and both flags false. A non-empty
/// page reports `has_prev` whenever a cursor was supplied, since a
/// request starting mid-stream implies a previous page existed.
pub async fn page<S: ActionStore + ?Sized>(
    store: &S,
    filter: &ActionFilter,
    limit: i64,
    after: Option<DbId>,
) -> Result<ActionPage, StoreError> {
    let mut rows = store.fetch_page(filter, after, limit + 1).await?;
    let has_next = rows.len() as i64 > limit;
    if has_next {
        rows.truncate(limit as usize);
    }

    let pagination = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => PageMeta {
            start_cursor: Some(encode_cursor(first.id)),
            end_cursor: Some(encode_cursor(last.id)),
            limit,
            has_next,
            has_prev: after.is_some(),
        },
        _ => PageMeta {
            start_cursor: None,
            end_cursor: None,
            limit,
            has_next: false,
            has_prev: false,
        },
    };

    Ok(ActionPage {
        data: rows,
        pagination,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
