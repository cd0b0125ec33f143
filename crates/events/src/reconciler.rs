//! Export registry reconciler.
//!
//! Subscribes to the [`ExportEventBus`](crate::bus::ExportEventBus) and
//! mirrors each lifecycle event onto the durable registry through the
//! [`ExportRegistry`] seam. The production registry performs atomic,
//! idempotent SQL upserts keyed on job id; duplicate or out-of-order
//! delivery therefore degrades to a no-op, never a crash. The loop exits
//! when the bus sender is dropped.

use actionledger_core::export::{ExportEvent, ExportOutcome, ExportStatus};
use actionledger_db::repositories::CsvExportRepo;
use actionledger_db::DbPool;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::bus::ExportJobEvent;

type RegistryResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Durable sink for export lifecycle transitions, keyed by job id.
///
/// Implementations must make every method an atomic, idempotent upsert:
/// the reconciler may deliver the same event twice.
#[async_trait]
pub trait ExportRegistry: Send + Sync {
    async fn record_active(&self, job_id: &str) -> RegistryResult;
    async fn record_progress(&self, job_id: &str, percent: i16) -> RegistryResult;
    async fn record_completed(&self, job_id: &str, outcome: &ExportOutcome) -> RegistryResult;
    async fn record_terminal(&self, job_id: &str, status: ExportStatus) -> RegistryResult;
}

/// [`ExportRegistry`] backed by the `csv_exports` table.
#[derive(Clone)]
pub struct PgExportRegistry {
    pool: DbPool,
}

impl PgExportRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExportRegistry for PgExportRegistry {
    async fn record_active(&self, job_id: &str) -> RegistryResult {
        CsvExportRepo::record_active(&self.pool, job_id).await?;
        Ok(())
    }

    async fn record_progress(&self, job_id: &str, percent: i16) -> RegistryResult {
        CsvExportRepo::record_progress(&self.pool, job_id, i32::from(percent)).await?;
        Ok(())
    }

    async fn record_completed(&self, job_id: &str, outcome: &ExportOutcome) -> RegistryResult {
        CsvExportRepo::record_completed(&self.pool, job_id, outcome).await?;
        Ok(())
    }

    async fn record_terminal(&self, job_id: &str, status: ExportStatus) -> RegistryResult {
        CsvExportRepo::record_terminal(&self.pool, job_id, status).await?;
        Ok(())
    }
}

/// Background service that mirrors lifecycle events onto the registry.
pub struct Reconciler;

impl Reconciler {
    /// Run the reconcile loop until the bus is closed.
    pub async fn run<R: ExportRegistry>(
        registry: R,
        mut receiver: broadcast::Receiver<ExportJobEvent>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::apply(&registry, &event).await {
                        tracing::error!(
                            job_id = %event.job_id,
                            error = %e,
                            "Failed to reconcile export event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Reconciler lagged, some export events were not mirrored"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Export event bus closed, reconciler shutting down");
                    break;
                }
            }
        }
    }

    /// Mirror a single event onto the registry.
    async fn apply<R: ExportRegistry>(registry: &R, event: &ExportJobEvent) -> RegistryResult {
        match &event.event {
            ExportEvent::Active => registry.record_active(&event.job_id).await,
            ExportEvent::Progress { percent } => {
                registry.record_progress(&event.job_id, *percent).await
            }
            ExportEvent::Completed { outcome } => {
                registry.record_completed(&event.job_id, outcome).await
            }
            ExportEvent::Failed { reason } => {
                // The failure reason is logged, not persisted; the row
                // keeps its last known progress and a 'failed' status.
                tracing::warn!(job_id = %event.job_id, reason = %reason, "Export job failed");
                registry
                    .record_terminal(&event.job_id, ExportStatus::Failed)
                    .await
            }
            ExportEvent::Cancelled => {
                registry
                    .record_terminal(&event.job_id, ExportStatus::Cancelled)
                    .await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
