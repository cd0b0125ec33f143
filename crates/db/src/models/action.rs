//! Action entity models and DTOs.
//!
//! Action rows are immutable once created: no update DTO exists and no
//! repository method mutates them.

use actionledger_core::action::{ActionRecord, ActionType, ActionUser};
use actionledger_core::error::CoreError;
use actionledger_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

/// An `actions` row with the owning user's name joined in.
#[derive(Debug, Clone, FromRow)]
pub struct ActionWithUser {
    pub id: DbId,
    pub user_id: DbId,
    pub user_name: String,
    pub action_type: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl ActionWithUser {
    /// Convert to the domain record, parsing the stored action type tag.
    pub fn into_record(self) -> Result<ActionRecord, CoreError> {
        Ok(ActionRecord {
            id: self.id,
            action_type: self.action_type.parse::<ActionType>()?,
            user: ActionUser {
                id: self.user_id,
                name: self.user_name,
            },
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

/// DTO for inserting a new action (used by the event producer and tests).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAction {
    pub user_id: DbId,
    pub action_type: ActionType,
    pub metadata: Option<serde_json::Value>,
}
