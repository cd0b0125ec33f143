//! CSV row schema for action exports.
//!
//! Fixed column order; timestamps render as ISO-8601 UTC with millisecond
//! precision (the same shape as JavaScript's `toISOString`). Quoting of
//! delimiters and embedded quotes is handled by the `csv` writer in the
//! worker crate.

use chrono::SecondsFormat;

use crate::action::ActionRecord;
use crate::types::Timestamp;

/// Header row for action CSV exports, in output order.
pub const EXPORT_COLUMNS: [&str; 5] = ["id", "actionType", "userId", "userName", "createdAt"];

/// Render a timestamp for a CSV cell, e.g. `2024-01-15T10:30:00.000Z`.
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render one record as CSV field values matching [`EXPORT_COLUMNS`].
pub fn export_record(record: &ActionRecord) -> [String; 5] {
    [
        record.id.to_string(),
        record.action_type.as_str().to_string(),
        record.user.id.to_string(),
        record.user.name.clone(),
        format_timestamp(record.created_at),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
