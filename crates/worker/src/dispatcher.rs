//! Job dispatcher: polls the durable queue and runs claimed export jobs.
//!
//! Claiming uses `SKIP LOCKED` in the repository, so any number of
//! dispatcher processes can share one queue. Execution is bounded by a
//! semaphore; a claimed job always reaches a terminal status, even when
//! the run fails or the process is asked to shut down.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actionledger_core::export::{ExportEvent, JOB_TYPE_ACTIONS_CSV_EXPORT};
use actionledger_core::filter::ActionFilter;
use actionledger_core::types::DbId;
use actionledger_db::repositories::JobRepo;
use actionledger_db::store::PgActionStore;
use actionledger_db::DbPool;
use actionledger_events::{ExportEventBus, ExportJobEvent};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::export::{run_export, ExportError};

/// How often the queue is polled for new work.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Claims export jobs from the queue and runs them concurrently.
pub struct ExportDispatcher {
    pool: DbPool,
    bus: Arc<ExportEventBus>,
    export_dir: PathBuf,
    limiter: Arc<Semaphore>,
}

impl ExportDispatcher {
    pub fn new(
        pool: DbPool,
        bus: Arc<ExportEventBus>,
        export_dir: PathBuf,
        concurrency: usize,
    ) -> Self {
        Self {
            pool,
            bus,
            export_dir,
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Poll the queue until `cancel` fires, spawning one task per
    /// claimed job. In-flight jobs observe the same token and stop at
    /// their next batch boundary.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        tracing::info!(
            export_dir = %self.export_dir.display(),
            concurrency = self.limiter.available_permits(),
            "Export dispatcher started"
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Export dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.dispatch_available(&cancel).await {
                        tracing::error!(error = %e, "Failed to dispatch export jobs");
                    }
                }
            }
        }
    }

    /// Claim and launch jobs until the queue is empty or all permits
    /// are taken.
    async fn dispatch_available(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        loop {
            let Ok(permit) = Arc::clone(&self.limiter).try_acquire_owned() else {
                return Ok(());
            };
            let Some(job) = JobRepo::claim_next(&self.pool, JOB_TYPE_ACTIONS_CSV_EXPORT).await?
            else {
                return Ok(());
            };
            JobRepo::mark_started(&self.pool, job.id).await?;
            tracing::info!(job_id = job.id, "Claimed export job");

            let filter: ActionFilter = match serde_json::from_value(job.parameters.clone()) {
                Ok(filter) => filter,
                Err(e) => {
                    let reason = format!("invalid export parameters: {e}");
                    JobRepo::fail(&self.pool, job.id, &reason).await?;
                    self.bus.publish(ExportJobEvent::new(
                        job.id.to_string(),
                        ExportEvent::Failed { reason },
                    ));
                    continue;
                }
            };

            tokio::spawn(run_job(
                self.pool.clone(),
                Arc::clone(&self.bus),
                self.export_dir.clone(),
                job.id,
                filter,
                cancel.child_token(),
                permit,
            ));
        }
    }
}

/// Execute one claimed job and record its terminal status.
async fn run_job(
    pool: DbPool,
    bus: Arc<ExportEventBus>,
    export_dir: PathBuf,
    job_id: DbId,
    filter: ActionFilter,
    cancel: CancellationToken,
    _permit: OwnedSemaphorePermit,
) {
    let job_key = job_id.to_string();
    bus.publish(ExportJobEvent::new(&job_key, ExportEvent::Active));

    let store = PgActionStore::new(pool.clone());
    let result = run_export(&store, &filter, &job_key, &export_dir, &bus, &cancel).await;

    let terminal = match result {
        Ok(outcome) => {
            bus.publish(ExportJobEvent::new(
                &job_key,
                ExportEvent::Completed { outcome },
            ));
            JobRepo::complete(&pool, job_id).await
        }
        Err(ExportError::Cancelled) => {
            bus.publish(ExportJobEvent::new(&job_key, ExportEvent::Cancelled));
            JobRepo::cancel(&pool, job_id).await.map(|_| ())
        }
        Err(e) => {
            let reason = e.to_string();
            tracing::error!(job_id, error = %reason, "Export job failed");
            bus.publish(ExportJobEvent::new(
                &job_key,
                ExportEvent::Failed { reason: reason.clone() },
            ));
            JobRepo::fail(&pool, job_id, &reason).await
        }
    };

    if let Err(e) = terminal {
        tracing::error!(job_id, error = %e, "Failed to record terminal job status");
    }
}
