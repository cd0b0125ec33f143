//! The action store seam.
//!
//! [`ActionStore`] is the only contract the pagination engine and the
//! export worker have with persistence. `actionledger-db` implements it
//! over Postgres; [`MemoryActionStore`] is the reference implementation
//! used by unit tests and shares the filter semantics via
//! [`ActionFilter::matches`].

use async_trait::async_trait;

use crate::action::ActionRecord;
use crate::filter::ActionFilter;
use crate::types::DbId;

/// Error surfaced by a store backend.
#[derive(Debug, thiserror::Error)]
#[error("store error: {0}")]
pub struct StoreError(String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Read access to the action log, ordered strictly by ascending id.
#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Fetch up to `limit` records matching `filter` with `id > after_id`,
    /// in ascending id order.
    async fn fetch_page(
        &self,
        filter: &ActionFilter,
        after_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<ActionRecord>, StoreError>;

    /// Count records matching `filter`. Used for export progress
    /// estimation only, never on the pagination hot path.
    async fn count(&self, filter: &ActionFilter) -> Result<i64, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryActionStore
// ---------------------------------------------------------------------------

/// In-memory [`ActionStore`] over a fixed set of records.
pub struct MemoryActionStore {
    records: Vec<ActionRecord>,
}

impl MemoryActionStore {
    /// Build a store from the given records, sorted by id.
    pub fn new(mut records: Vec<ActionRecord>) -> Self {
        records.sort_by_key(|r| r.id);
        Self { records }
    }
}

#[async_trait]
impl ActionStore for MemoryActionStore {
    async fn fetch_page(
        &self,
        filter: &ActionFilter,
        after_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<ActionRecord>, StoreError> {
        let boundary = after_id.unwrap_or(i64::MIN);
        Ok(self
            .records
            .iter()
            .filter(|r| r.id > boundary && filter.matches(r))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &ActionFilter) -> Result<i64, StoreError> {
        Ok(self.records.iter().filter(|r| filter.matches(r)).count() as i64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::action::{ActionType, ActionUser};

    fn record(id: DbId) -> ActionRecord {
        ActionRecord {
            id,
            action_type: ActionType::Convert,
            user: ActionUser {
                id: 1,
                name: "Alice".into(),
            },
            metadata: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn fetch_page_orders_by_id_and_respects_boundary() {
        let store = MemoryActionStore::new(vec![record(3), record(1), record(2)]);
        let page = store
            .fetch_page(&ActionFilter::default(), Some(1), 10)
            .await
            .unwrap();
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn fetch_page_honors_limit() {
        let store = MemoryActionStore::new((1..=5).map(record).collect());
        let page = store
            .fetch_page(&ActionFilter::default(), None, 2)
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn count_applies_the_filter() {
        let store = MemoryActionStore::new((1..=5).map(record).collect());
        let filter = ActionFilter {
            user_id: vec![99],
            ..Default::default()
        };
        assert_eq!(store.count(&filter).await.unwrap(), 0);
        assert_eq!(store.count(&ActionFilter::default()).await.unwrap(), 5);
    }
}
