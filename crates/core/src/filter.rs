//! Filter specification for action queries and exports.
//!
//! A transient value object describing which actions to match. Dimensions
//! combine with AND; values within a dimension combine with OR. An empty
//! set on a dimension means "no constraint", never "exclude all".
//!
//! The same specification drives two consumers with identical semantics:
//! the SQL translation in `actionledger-db` and the pure [`matches`]
//! evaluation used by the in-memory store.
//!
//! [`matches`]: ActionFilter::matches

use serde::{Deserialize, Serialize};

use crate::action::{ActionRecord, ActionType};
use crate::types::{DbId, Timestamp};

/// Multi-dimensional filter over action records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionFilter {
    /// Accepted user ids. Empty = any user.
    pub user_id: Vec<DbId>,
    /// Accepted action types. Empty = any type.
    pub action_type: Vec<ActionType>,
    /// Inclusive lower bound on `created_at`.
    pub date_from: Option<Timestamp>,
    /// Inclusive upper bound on `created_at`.
    pub date_to: Option<Timestamp>,
    /// Accepted values for the `ip` metadata key. Empty = no constraint.
    pub metadata_ip: Vec<String>,
    /// Accepted values for the `sign` metadata key. Empty = no constraint.
    pub metadata_sign: Vec<String>,
}

impl ActionFilter {
    /// True when no dimension constrains anything (the unfiltered scan).
    pub fn is_unconstrained(&self) -> bool {
        self.user_id.is_empty()
            && self.action_type.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.metadata_ip.is_empty()
            && self.metadata_sign.is_empty()
    }

    /// Evaluate this filter against a single record.
    ///
    /// A metadata dimension matches only when the record carries the key
    /// with one of the accepted string values; records without the key are
    /// excluded when that dimension is active.
    pub fn matches(&self, record: &ActionRecord) -> bool {
        if !self.user_id.is_empty() && !self.user_id.contains(&record.user.id) {
            return false;
        }
        if !self.action_type.is_empty() && !self.action_type.contains(&record.action_type) {
            return false;
        }
        if let Some(from) = self.date_from {
            if record.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.created_at > to {
                return false;
            }
        }
        if !self.metadata_ip.is_empty() && !metadata_matches(record, "ip", &self.metadata_ip) {
            return false;
        }
        if !self.metadata_sign.is_empty() && !metadata_matches(record, "sign", &self.metadata_sign)
        {
            return false;
        }
        true
    }
}

fn metadata_matches(record: &ActionRecord, key: &str, accepted: &[String]) -> bool {
    match record.metadata_str(key) {
        Some(value) => accepted.iter().any(|a| a == value),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
