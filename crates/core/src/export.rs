//! Export job lifecycle: events, outcomes, progress, and the registry
//! state machine.
//!
//! The state machine is a pure `(current, event) -> next` function so the
//! reconciler's behavior can be tested without a database. The SQL
//! upserts in `actionledger-db` implement the same transitions
//! atomically.

use serde::{Deserialize, Serialize};

/// Job type tag for action CSV export jobs in the queue.
pub const JOB_TYPE_ACTIONS_CSV_EXPORT: &str = "actions_csv_export";

/// Final result of a completed export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub output_path: String,
    pub total_rows: i64,
    pub duration_ms: i64,
}

/// A queue lifecycle event for one export job.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// The queue started executing the job.
    Active,
    /// The worker finished a batch; `percent` is 0..=99 until the final
    /// empty batch has been observed.
    Progress { percent: i16 },
    /// The worker wrote the full file.
    Completed { outcome: ExportOutcome },
    /// The job aborted; the partial output file is left in place.
    Failed { reason: String },
    /// The job was cancelled between batches.
    Cancelled,
}

/// Terminal-or-not status of a registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl ExportStatus {
    /// Database representation (the `csv_exports.status` column).
    pub fn as_str(self) -> &'static str {
        match self {
            ExportStatus::Active => "active",
            ExportStatus::Completed => "completed",
            ExportStatus::Failed => "failed",
            ExportStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ExportStatus::Active)
    }
}

/// The registry's view of one export job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJobState {
    pub status: ExportStatus,
    pub progress: i16,
    pub output_path: String,
    pub total_rows: i64,
    pub duration_ms: i64,
}

impl ExportJobState {
    /// The state created when a job first becomes active.
    pub fn new_active() -> Self {
        Self {
            status: ExportStatus::Active,
            progress: 0,
            output_path: String::new(),
            total_rows: 0,
            duration_ms: 0,
        }
    }

    /// Apply one lifecycle event.
    ///
    /// Safe against duplicate and out-of-order delivery: a repeated
    /// `Active` never resets a further-progressed row, and a `Progress`
    /// value below the stored one is ignored. Terminal states never
    /// regress.
    pub fn apply(current: Option<ExportJobState>, event: &ExportEvent) -> ExportJobState {
        let state = current.unwrap_or_else(ExportJobState::new_active);
        if state.status.is_terminal() {
            return state;
        }
        match event {
            ExportEvent::Active => state,
            ExportEvent::Progress { percent } => ExportJobState {
                progress: state.progress.max(*percent),
                ..state
            },
            ExportEvent::Completed { outcome } => ExportJobState {
                status: ExportStatus::Completed,
                progress: 100,
                output_path: outcome.output_path.clone(),
                total_rows: outcome.total_rows,
                duration_ms: outcome.duration_ms,
            },
            ExportEvent::Failed { .. } => ExportJobState {
                status: ExportStatus::Failed,
                ..state
            },
            ExportEvent::Cancelled => ExportJobState {
                status: ExportStatus::Cancelled,
                ..state
            },
        }
    }
}

/// Completion percentage after a batch: `min(99, round(rows/total*100))`,
/// or 0 when the approximate total is 0. Never reports 100; that is
/// reserved for the completed transition.
pub fn progress_percent(rows_written: i64, approx_total: i64) -> i16 {
    if approx_total <= 0 {
        return 0;
    }
    let pct = (rows_written as f64 / approx_total as f64 * 100.0).round() as i16;
    pct.min(99)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome() -> ExportOutcome {
        ExportOutcome {
            output_path: "/exports/report-1.csv".into(),
            total_rows: 500,
            duration_ms: 1234,
        }
    }

    #[test]
    fn active_creates_a_fresh_row() {
        let state = ExportJobState::apply(None, &ExportEvent::Active);
        assert_eq!(state, ExportJobState::new_active());
    }

    #[test]
    fn duplicate_active_does_not_reset_progress() {
        let state = ExportJobState::apply(None, &ExportEvent::Active);
        let state = ExportJobState::apply(Some(state), &ExportEvent::Progress { percent: 40 });
        let state = ExportJobState::apply(Some(state), &ExportEvent::Active);
        assert_eq!(state.progress, 40);
        assert_eq!(state.status, ExportStatus::Active);
    }

    #[test]
    fn regressed_progress_is_ignored() {
        let state = ExportJobState::apply(None, &ExportEvent::Progress { percent: 60 });
        let state = ExportJobState::apply(Some(state), &ExportEvent::Progress { percent: 30 });
        assert_eq!(state.progress, 60);
    }

    #[test]
    fn completed_sets_result_fields_and_full_progress() {
        let state = ExportJobState::apply(None, &ExportEvent::Active);
        let state = ExportJobState::apply(
            Some(state),
            &ExportEvent::Completed { outcome: outcome() },
        );
        assert_eq!(state.status, ExportStatus::Completed);
        assert_eq!(state.progress, 100);
        assert_eq!(state.output_path, "/exports/report-1.csv");
        assert_eq!(state.total_rows, 500);
        assert_eq!(state.duration_ms, 1234);
    }

    #[test]
    fn failed_keeps_last_known_progress() {
        let state = ExportJobState::apply(None, &ExportEvent::Progress { percent: 73 });
        let state = ExportJobState::apply(
            Some(state),
            &ExportEvent::Failed {
                reason: "store unreachable".into(),
            },
        );
        assert_eq!(state.status, ExportStatus::Failed);
        assert_eq!(state.progress, 73);
        assert!(state.output_path.is_empty());
    }

    #[test]
    fn terminal_states_never_regress() {
        let done = ExportJobState::apply(None, &ExportEvent::Completed { outcome: outcome() });
        let after = ExportJobState::apply(Some(done.clone()), &ExportEvent::Progress { percent: 5 });
        assert_eq!(after, done);
        let after = ExportJobState::apply(Some(done.clone()), &ExportEvent::Active);
        assert_eq!(after, done);
    }

    #[test]
    fn progress_is_zero_for_an_empty_estimate() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(10, 0), 0);
    }

    #[test]
    fn progress_caps_at_ninety_nine() {
        assert_eq!(progress_percent(1000, 1000), 99);
        assert_eq!(progress_percent(2000, 1000), 99);
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(500, 1000), 50);
    }
}
