//! Integration tests for the export registry upserts.
//!
//! Requires a reachable Postgres (`DATABASE_URL`).

use actionledger_core::export::{ExportOutcome, ExportStatus};
use actionledger_db::repositories::CsvExportRepo;
use sqlx::PgPool;

fn outcome() -> ExportOutcome {
    ExportOutcome {
        output_path: "/exports/report-7.csv".into(),
        total_rows: 123,
        duration_ms: 4500,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_active_events_create_exactly_one_row(pool: PgPool) {
    CsvExportRepo::record_active(&pool, "7").await.unwrap();
    CsvExportRepo::record_active(&pool, "7").await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM csv_exports WHERE job_id = '7'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_active_does_not_reset_progress(pool: PgPool) {
    CsvExportRepo::record_active(&pool, "7").await.unwrap();
    CsvExportRepo::record_progress(&pool, "7", 55).await.unwrap();
    CsvExportRepo::record_active(&pool, "7").await.unwrap();

    let row = CsvExportRepo::find_by_job_id(&pool, "7").await.unwrap().unwrap();
    assert_eq!(row.progress, 55);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stale_progress_values_are_ignored(pool: PgPool) {
    CsvExportRepo::record_active(&pool, "7").await.unwrap();
    CsvExportRepo::record_progress(&pool, "7", 60).await.unwrap();
    CsvExportRepo::record_progress(&pool, "7", 30).await.unwrap();

    let row = CsvExportRepo::find_by_job_id(&pool, "7").await.unwrap().unwrap();
    assert_eq!(row.progress, 60);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completion_sets_result_fields_and_full_progress(pool: PgPool) {
    CsvExportRepo::record_active(&pool, "7").await.unwrap();
    CsvExportRepo::record_completed(&pool, "7", &outcome()).await.unwrap();

    let row = CsvExportRepo::find_by_job_id(&pool, "7").await.unwrap().unwrap();
    assert_eq!(row.status, "completed");
    assert_eq!(row.output_path, "/exports/report-7.csv");
    assert_eq!(row.total_rows_processed, 123);
    assert_eq!(row.duration_ms, 4500);
    assert_eq!(row.progress, 100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn completion_before_active_still_lands(pool: PgPool) {
    CsvExportRepo::record_completed(&pool, "9", &outcome()).await.unwrap();
    CsvExportRepo::record_active(&pool, "9").await.unwrap();

    let row = CsvExportRepo::find_by_job_id(&pool, "9").await.unwrap().unwrap();
    assert_eq!(row.status, "completed");
    assert_eq!(row.progress, 100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failure_keeps_last_known_progress(pool: PgPool) {
    CsvExportRepo::record_active(&pool, "7").await.unwrap();
    CsvExportRepo::record_progress(&pool, "7", 73).await.unwrap();
    CsvExportRepo::record_terminal(&pool, "7", ExportStatus::Failed).await.unwrap();

    let row = CsvExportRepo::find_by_job_id(&pool, "7").await.unwrap().unwrap();
    assert_eq!(row.status, "failed");
    assert_eq!(row.progress, 73);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn terminal_rows_do_not_regress(pool: PgPool) {
    CsvExportRepo::record_active(&pool, "7").await.unwrap();
    CsvExportRepo::record_completed(&pool, "7", &outcome()).await.unwrap();
    CsvExportRepo::record_progress(&pool, "7", 10).await.unwrap();
    CsvExportRepo::record_terminal(&pool, "7", ExportStatus::Failed).await.unwrap();

    let row = CsvExportRepo::find_by_job_id(&pool, "7").await.unwrap().unwrap();
    assert_eq!(row.status, "completed");
    assert_eq!(row.progress, 100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_is_most_recent_first(pool: PgPool) {
    for job_id in ["1", "2", "3"] {
        CsvExportRepo::record_active(&pool, job_id).await.unwrap();
    }
    let rows = CsvExportRepo::list_recent(&pool).await.unwrap();
    assert_eq!(rows.len(), 3);
    // Ties on created_at break by descending surrogate id.
    assert_eq!(
        rows.iter().map(|r| r.job_id.as_str()).collect::<Vec<_>>(),
        ["3", "2", "1"]
    );
}
