//! Repository for the `actions` table.
//!
//! Translates an [`ActionFilter`] into a dynamically-built WHERE clause
//! with typed bind values. Reads always join the owning user and order
//! strictly by ascending id; the table is insert-only, so `id > $after`
//! keyset scans are stable under concurrent writes.

use actionledger_core::filter::ActionFilter;
use actionledger_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::action::{ActionWithUser, CreateAction};

/// Column list for action SELECT queries (joined with `users u`).
const COLUMNS: &str = "\
    a.id, a.user_id, u.name AS user_name, a.action_type, \
    a.metadata, a.created_at";

/// Provides query and insert operations for action records.
pub struct ActionRepo;

impl ActionRepo {
    /// Insert a new action row. Rows are immutable after this point.
    pub async fn insert(pool: &PgPool, input: &CreateAction) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO actions (user_id, action_type, metadata) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(input.user_id)
        .bind(input.action_type.as_str())
        .bind(&input.metadata)
        .fetch_one(pool)
        .await
    }

    /// Fetch up to `limit` filtered rows with `id > after_id`, ascending.
    pub async fn list_page(
        pool: &PgPool,
        filter: &ActionFilter,
        after_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<ActionWithUser>, sqlx::Error> {
        let (mut conditions, bind_values, mut bind_idx) = build_action_filter(filter);

        if after_id.is_some() {
            conditions.push(format!("a.id > ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM actions a \
             JOIN users u ON u.id = a.user_id \
             {where_clause} \
             ORDER BY a.id ASC \
             LIMIT ${bind_idx}"
        );

        let mut q = bind_action_values(sqlx::query_as::<_, ActionWithUser>(&query), &bind_values);
        if let Some(id) = after_id {
            q = q.bind(id);
        }
        q.bind(limit).fetch_all(pool).await
    }

    /// Count rows matching the filter.
    ///
    /// Runs the same predicate as [`list_page`](Self::list_page); exports
    /// use it once up front for progress estimation.
    pub async fn count(pool: &PgPool, filter: &ActionFilter) -> Result<i64, sqlx::Error> {
        let (conditions, bind_values, _) = build_action_filter(filter);

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT COUNT(*)::BIGINT FROM actions a \
             JOIN users u ON u.id = a.user_id \
             {where_clause}"
        );

        bind_action_values_scalar(sqlx::query_scalar::<_, i64>(&query), &bind_values)
            .fetch_one(pool)
            .await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built action queries.
enum BindValue {
    IdArray(Vec<DbId>),
    TextArray(Vec<String>),
    Timestamp(Timestamp),
}

/// Build WHERE conditions and bind values from an [`ActionFilter`].
///
/// Returns `(conditions, bind_values, next_bind_index)`. Empty filter
/// dimensions contribute no condition at all. Metadata conditions only
/// match rows that carry the key with an accepted value; `->>'key'`
/// yields NULL for missing keys, which never equals any accepted value.
fn build_action_filter(filter: &ActionFilter) -> (Vec<String>, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if !filter.user_id.is_empty() {
        conditions.push(format!("a.user_id = ANY(${bind_idx})"));
        bind_idx += 1;
        bind_values.push(BindValue::IdArray(filter.user_id.clone()));
    }

    if !filter.action_type.is_empty() {
        conditions.push(format!("a.action_type = ANY(${bind_idx})"));
        bind_idx += 1;
        bind_values.push(BindValue::TextArray(
            filter
                .action_type
                .iter()
                .map(|at| at.as_str().to_string())
                .collect(),
        ));
    }

    if let Some(from) = filter.date_from {
        conditions.push(format!("a.created_at >= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(from));
    }

    if let Some(to) = filter.date_to {
        conditions.push(format!("a.created_at <= ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Timestamp(to));
    }

    if !filter.metadata_ip.is_empty() {
        conditions.push(format!("a.metadata->>'ip' = ANY(${bind_idx})"));
        bind_idx += 1;
        bind_values.push(BindValue::TextArray(filter.metadata_ip.clone()));
    }

    if !filter.metadata_sign.is_empty() {
        conditions.push(format!("a.metadata->>'sign' = ANY(${bind_idx})"));
        bind_idx += 1;
        bind_values.push(BindValue::TextArray(filter.metadata_sign.clone()));
    }

    (conditions, bind_values, bind_idx)
}

/// Bind a slice of `BindValue` to a sqlx `QueryAs`.
fn bind_action_values<'q, O>(
    mut q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::IdArray(v) => q = q.bind(v),
            BindValue::TextArray(v) => q = q.bind(v),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}

/// Bind a slice of `BindValue` to a sqlx `QueryScalar`.
fn bind_action_values_scalar<'q>(
    mut q: sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments>,
    bind_values: &'q [BindValue],
) -> sqlx::query::QueryScalar<'q, sqlx::Postgres, i64, sqlx::postgres::PgArguments> {
    for val in bind_values {
        match val {
            BindValue::IdArray(v) => q = q.bind(v),
            BindValue::TextArray(v) => q = q.bind(v),
            BindValue::Timestamp(v) => q = q.bind(*v),
        }
    }
    q
}
