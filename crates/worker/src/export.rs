//! Streaming CSV export runner.
//!
//! Scans the action log in fixed-size keyset batches and appends each
//! batch to the output file, so memory stays flat regardless of result
//! size. Progress events are published after every batch; the estimate
//! is capped at 99% until the final empty batch proves the scan is done.
//! On failure or cancellation the partial file is left in place for
//! inspection.

use std::path::Path;
use std::time::Instant;

use actionledger_core::csv::{export_record, EXPORT_COLUMNS};
use actionledger_core::export::{progress_percent, ExportEvent, ExportOutcome};
use actionledger_core::filter::ActionFilter;
use actionledger_core::store::{ActionStore, StoreError};
use actionledger_core::types::DbId;
use actionledger_events::{ExportEventBus, ExportJobEvent};
use tokio_util::sync::CancellationToken;

/// Rows fetched and written per batch.
pub const EXPORT_BATCH_SIZE: i64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("export cancelled")]
    Cancelled,
}

/// Run one export job to completion, writing
/// `<export_dir>/report-<job_id>.csv`.
///
/// The row count is snapshotted up front for progress estimation only;
/// the scan itself is keyset-driven and sees whatever matches at read
/// time. Cancellation is observed between batches, never mid-batch.
pub async fn run_export<S: ActionStore + ?Sized>(
    store: &S,
    filter: &ActionFilter,
    job_id: &str,
    export_dir: &Path,
    bus: &ExportEventBus,
    cancel: &CancellationToken,
) -> Result<ExportOutcome, ExportError> {
    run_export_batched(store, filter, job_id, export_dir, bus, cancel, EXPORT_BATCH_SIZE).await
}

#[allow(clippy::too_many_arguments)]
async fn run_export_batched<S: ActionStore + ?Sized>(
    store: &S,
    filter: &ActionFilter,
    job_id: &str,
    export_dir: &Path,
    bus: &ExportEventBus,
    cancel: &CancellationToken,
    batch_size: i64,
) -> Result<ExportOutcome, ExportError> {
    let started = Instant::now();

    std::fs::create_dir_all(export_dir)?;
    let output_path = export_dir.join(format!("report-{job_id}.csv"));
    let mut writer = csv::Writer::from_path(&output_path)?;
    writer.write_record(EXPORT_COLUMNS)?;

    let approx_total = store.count(filter).await?;
    let mut last_seen_id: Option<DbId> = None;
    let mut rows_written: i64 = 0;

    loop {
        if cancel.is_cancelled() {
            writer.flush()?;
            tracing::info!(job_id, rows_written, "Export cancelled between batches");
            return Err(ExportError::Cancelled);
        }

        let batch = store.fetch_page(filter, last_seen_id, batch_size).await?;
        if batch.is_empty() {
            break;
        }

        for record in &batch {
            writer.write_record(&export_record(record))?;
            last_seen_id = Some(record.id);
        }
        rows_written += batch.len() as i64;

        let percent = progress_percent(rows_written, approx_total);
        bus.publish(ExportJobEvent::new(job_id, ExportEvent::Progress { percent }));
        tracing::debug!(job_id, rows_written, percent, "Export batch written");
    }

    writer.flush()?;

    let outcome = ExportOutcome {
        output_path: output_path.to_string_lossy().into_owned(),
        total_rows: rows_written,
        duration_ms: started.elapsed().as_millis() as i64,
    };
    tracing::info!(
        job_id,
        total_rows = outcome.total_rows,
        duration_ms = outcome.duration_ms,
        path = %outcome.output_path,
        "Export finished"
    );
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use actionledger_core::action::{ActionRecord, ActionType, ActionUser};
    use actionledger_core::store::MemoryActionStore;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(id: DbId, action_type: ActionType, user_name: &str) -> ActionRecord {
        ActionRecord {
            id,
            action_type,
            user: ActionUser {
                id: 1,
                name: user_name.into(),
            },
            metadata: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    async fn drain_progress(mut rx: tokio::sync::broadcast::Receiver<ExportJobEvent>) -> Vec<i16> {
        let mut percents = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let ExportEvent::Progress { percent } = event.event {
                percents.push(percent);
            }
        }
        percents
    }

    #[tokio::test]
    async fn writes_header_and_all_matching_rows_in_id_order() {
        let store = MemoryActionStore::new(vec![
            record(3, ActionType::Upload, "Alice"),
            record(1, ActionType::Convert, "Alice"),
            record(2, ActionType::Compress, "Alice"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let bus = ExportEventBus::default();
        let cancel = CancellationToken::new();

        let outcome = run_export(
            &store,
            &ActionFilter::default(),
            "9",
            dir.path(),
            &bus,
            &cancel,
        )
        .await
        .unwrap();

        assert_eq!(outcome.total_rows, 3);
        let path = dir.path().join("report-9.csv");
        assert_eq!(outcome.output_path, path.to_string_lossy());

        let lines = read_lines(&path);
        assert_eq!(lines[0], "id,actionType,userId,userName,createdAt");
        assert_eq!(lines[1], "1,CONVERT,1,Alice,2024-01-15T10:30:00.000Z");
        assert_eq!(lines[2], "2,COMPRESS,1,Alice,2024-01-15T10:30:00.000Z");
        assert_eq!(lines[3], "3,UPLOAD,1,Alice,2024-01-15T10:30:00.000Z");
        assert_eq!(lines.len(), 4);
    }

    #[tokio::test]
    async fn quotes_names_with_embedded_delimiters_and_quotes() {
        let store = MemoryActionStore::new(vec![record(
            1,
            ActionType::Download,
            "O'Brien, \"Bob\"",
        )]);
        let dir = tempfile::tempdir().unwrap();
        let bus = ExportEventBus::default();

        run_export(
            &store,
            &ActionFilter::default(),
            "1",
            dir.path(),
            &bus,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let lines = read_lines(&dir.path().join("report-1.csv"));
        assert_eq!(
            lines[1],
            "1,DOWNLOAD,1,\"O'Brien, \"\"Bob\"\"\",2024-01-15T10:30:00.000Z"
        );
    }

    #[tokio::test]
    async fn filter_restricts_exported_rows() {
        let store = MemoryActionStore::new(vec![
            record(1, ActionType::Convert, "Alice"),
            record(2, ActionType::Upload, "Alice"),
            record(3, ActionType::Convert, "Alice"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let bus = ExportEventBus::default();
        let filter = ActionFilter {
            action_type: vec![ActionType::Convert],
            ..Default::default()
        };

        let outcome = run_export(
            &store,
            &filter,
            "2",
            dir.path(),
            &bus,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.total_rows, 2);
        let lines = read_lines(&dir.path().join("report-2.csv"));
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,CONVERT"));
        assert!(lines[2].starts_with("3,CONVERT"));
    }

    #[tokio::test]
    async fn empty_result_writes_header_only() {
        let store = MemoryActionStore::new(vec![]);
        let dir = tempfile::tempdir().unwrap();
        let bus = ExportEventBus::default();
        let rx = bus.subscribe();

        let outcome = run_export(
            &store,
            &ActionFilter::default(),
            "3",
            dir.path(),
            &bus,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.total_rows, 0);
        let lines = read_lines(&dir.path().join("report-3.csv"));
        assert_eq!(lines, vec!["id,actionType,userId,userName,createdAt"]);
        assert!(drain_progress(rx).await.is_empty());
    }

    #[tokio::test]
    async fn progress_events_are_non_decreasing_and_below_one_hundred() {
        let records = (1..=10)
            .map(|id| record(id, ActionType::Convert, "Alice"))
            .collect();
        let store = MemoryActionStore::new(records);
        let dir = tempfile::tempdir().unwrap();
        let bus = ExportEventBus::default();
        let rx = bus.subscribe();

        // Batch size 3 over 10 rows yields four batches.
        run_export_batched(
            &store,
            &ActionFilter::default(),
            "4",
            dir.path(),
            &bus,
            &CancellationToken::new(),
            3,
        )
        .await
        .unwrap();

        let percents = drain_progress(rx).await;
        assert_eq!(percents, vec![30, 60, 90, 99]);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn already_cancelled_token_stops_before_the_first_batch() {
        let store = MemoryActionStore::new(vec![record(1, ActionType::Convert, "Alice")]);
        let dir = tempfile::tempdir().unwrap();
        let bus = ExportEventBus::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = run_export(
            &store,
            &ActionFilter::default(),
            "5",
            dir.path(),
            &bus,
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(ExportError::Cancelled)));
        // The partial file (header only) is left in place.
        let lines = read_lines(&dir.path().join("report-5.csv"));
        assert_eq!(lines, vec!["id,actionType,userId,userName,createdAt"]);
    }
}
