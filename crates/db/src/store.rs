//! Postgres implementation of the `ActionStore` seam.

use actionledger_core::action::ActionRecord;
use actionledger_core::filter::ActionFilter;
use actionledger_core::store::{ActionStore, StoreError};
use actionledger_core::types::DbId;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repositories::ActionRepo;

/// [`ActionStore`] backed by the `actions` table.
///
/// Owns a pool handle; clones share the underlying pool.
#[derive(Clone)]
pub struct PgActionStore {
    pool: PgPool,
}

impl PgActionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActionStore for PgActionStore {
    async fn fetch_page(
        &self,
        filter: &ActionFilter,
        after_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<ActionRecord>, StoreError> {
        let rows = ActionRepo::list_page(&self.pool, filter, after_id, limit)
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;
        rows.into_iter()
            .map(|row| row.into_record().map_err(|e| StoreError::new(e.to_string())))
            .collect()
    }

    async fn count(&self, filter: &ActionFilter) -> Result<i64, StoreError> {
        ActionRepo::count(&self.pool, filter)
            .await
            .map_err(|e| StoreError::new(e.to_string()))
    }
}
