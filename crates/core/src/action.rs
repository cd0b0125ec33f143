//! Action record domain types.
//!
//! An action is a single immutable record of something a user did. Rows
//! are created by an external producer, never updated and never deleted,
//! which is what makes keyset pagination over `id` stable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// Closed enumeration of recordable action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Convert,
    Compress,
    Upload,
    Download,
}

impl ActionType {
    /// All known action types, in declaration order.
    pub const ALL: [ActionType; 4] = [
        ActionType::Convert,
        ActionType::Compress,
        ActionType::Upload,
        ActionType::Download,
    ];

    /// The wire / database representation of this action type.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Convert => "CONVERT",
            ActionType::Compress => "COMPRESS",
            ActionType::Upload => "UPLOAD",
            ActionType::Download => "DOWNLOAD",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONVERT" => Ok(ActionType::Convert),
            "COMPRESS" => Ok(ActionType::Compress),
            "UPLOAD" => Ok(ActionType::Upload),
            "DOWNLOAD" => Ok(ActionType::Download),
            other => Err(CoreError::Validation(format!(
                "unknown action type: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionRecord
// ---------------------------------------------------------------------------

/// The owning user of an action, denormalized for responses and CSV rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionUser {
    pub id: DbId,
    pub name: String,
}

/// A single action record with its user joined in.
///
/// `metadata` is a flat map of string keys to scalar string values. Keys
/// are not known in advance; only a fixed subset (`ip`, `sign`) is
/// filterable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub id: DbId,
    pub action_type: ActionType,
    pub user: ActionUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

impl ActionRecord {
    /// Look up a metadata value by key, if the map contains it as a string.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::error::CoreError;

    #[test]
    fn action_type_round_trips_through_str() {
        for at in ActionType::ALL {
            assert_eq!(at.as_str().parse::<ActionType>().unwrap(), at);
        }
    }

    #[test]
    fn unknown_action_type_is_a_validation_error() {
        let err = "SHRINK".parse::<ActionType>().unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn action_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&ActionType::Convert).unwrap();
        assert_eq!(json, "\"CONVERT\"");
    }

    #[test]
    fn metadata_str_reads_only_string_values() {
        let record = ActionRecord {
            id: 1,
            action_type: ActionType::Upload,
            user: ActionUser {
                id: 7,
                name: "Alice".into(),
            },
            metadata: Some(serde_json::json!({"ip": "10.0.0.1", "count": 3})),
            created_at: chrono::Utc::now(),
        };
        assert_eq!(record.metadata_str("ip"), Some("10.0.0.1"));
        assert_eq!(record.metadata_str("count"), None);
        assert_eq!(record.metadata_str("missing"), None);
    }
}
