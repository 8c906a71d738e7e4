//! Run orchestration
//!
//! The orchestrator turns a cleaned backlog into a finished import: it
//! plans the queue (honoring any resume point), sizes the worker pool
//! from the pooled credential budget, spawns the workers, and watches
//! them finish. A circuit breaker cancels the run when too many workers
//! die, so a systemic outage stops burning budget on records that will
//! only fail.

use crate::config::models::{PipelineConfig, WorkerLimits};
use crate::core::classifier::CategoryTable;
use crate::core::governor::RateLimitGovernor;
use crate::core::queue::WorkQueue;
use crate::core::resume::ResumePlanner;
use crate::core::types::RawRecord;
use crate::core::worker::{
    run_worker, WorkerContext, WorkerOutcome, WorkerRegistry, WorkerStatus,
};
use crate::storage::CatalogStore;
use crate::utils::error::{PipelineError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    /// False only when the circuit breaker cancelled the run;
    /// individual condemned records do not flip it
    pub success: bool,
    /// Records persisted during this run
    pub imported: u64,
    /// One message per condemned record plus worker-level notices
    pub errors: Vec<String>,
}

/// Run-level knobs, resolved from [`PipelineConfig`] once at startup
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub worker_limits: WorkerLimits,
    pub worker_timeout: Duration,
    pub consecutive_failure_limit: u32,
    pub breaker_failure_fraction: f64,
    pub resume: bool,
}

impl RunSettings {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            worker_limits: config.workers.clone(),
            worker_timeout: Duration::from_secs(config.worker_timeout_secs),
            consecutive_failure_limit: config.consecutive_failure_limit,
            breaker_failure_fraction: config.breaker_failure_fraction,
            resume: config.resume,
        }
    }
}

/// Failed workers needed to trip the breaker, never below one
fn breaker_threshold(worker_count: usize, fraction: f64) -> usize {
    ((worker_count as f64 * fraction).ceil() as usize).max(1)
}

/// Drives one import run end to end
pub struct Orchestrator {
    governor: Arc<RateLimitGovernor>,
    classifier: Arc<CategoryTable>,
    store: Arc<dyn CatalogStore>,
    registry: WorkerRegistry,
    settings: RunSettings,
}

impl Orchestrator {
    pub fn new(
        governor: Arc<RateLimitGovernor>,
        classifier: Arc<CategoryTable>,
        store: Arc<dyn CatalogStore>,
        settings: RunSettings,
    ) -> Self {
        Self {
            governor,
            classifier,
            store,
            registry: WorkerRegistry::new(),
            settings,
        }
    }

    /// Live worker states, for progress reporting
    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    /// Process the backlog to completion.
    ///
    /// Returns an [`ImportSummary`] even when some records were
    /// condemned along the way; only an empty backlog or a store
    /// failure during resume planning surfaces as `Err`.
    pub async fn run(&self, backlog: Vec<RawRecord>) -> Result<ImportSummary> {
        if backlog.is_empty() {
            return Err(PipelineError::EmptyBacklog);
        }

        let Some(queue) = self.plan_queue(backlog).await? else {
            info!("Previous run already covered this backlog, nothing to do");
            return Ok(ImportSummary {
                success: true,
                imported: 0,
                errors: Vec::new(),
            });
        };
        let queue = Arc::new(queue);

        let worker_count = self
            .governor
            .pool()
            .optimal_worker_count(&self.settings.worker_limits)
            .min(queue.total())
            .max(1);
        let breaker_at =
            breaker_threshold(worker_count, self.settings.breaker_failure_fraction);
        info!(
            records = queue.total(),
            workers = worker_count,
            credentials = self.governor.pool().len(),
            breaker_at,
            "Starting import run"
        );

        let cancel = CancellationToken::new();
        let mut join_set = JoinSet::new();
        for worker_id in 0..worker_count {
            self.registry.register(worker_id);
            let ctx = WorkerContext {
                worker_id,
                queue: Arc::clone(&queue),
                classifier: Arc::clone(&self.classifier),
                governor: Arc::clone(&self.governor),
                store: Arc::clone(&self.store),
                registry: self.registry.clone(),
                cancel: cancel.clone(),
                failure_limit: self.settings.consecutive_failure_limit,
            };
            join_set.spawn(supervise_worker(ctx, self.settings.worker_timeout));
        }

        let mut summary = ImportSummary {
            success: true,
            imported: 0,
            errors: Vec::new(),
        };
        let mut failed_workers = 0usize;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    debug!(
                        worker = outcome.worker_id,
                        imported = outcome.imported,
                        status = ?outcome.status,
                        "Worker joined"
                    );
                    summary.errors.extend(outcome.errors);
                    match outcome.status {
                        WorkerStatus::Failed => failed_workers += 1,
                        // a cancelled loop is a failed-loop outcome for
                        // the breaker; the latch below keeps the trip
                        // from cascading
                        WorkerStatus::Cancelled => {
                            failed_workers += 1;
                            debug!(
                                "{}",
                                PipelineError::WorkerCancelled(outcome.worker_id)
                            );
                        }
                        _ => {}
                    }
                }
                Err(join_error) => {
                    error!(error = %join_error, "Worker task aborted");
                    summary
                        .errors
                        .push(format!("worker task aborted: {}", join_error));
                    failed_workers += 1;
                }
            }

            if failed_workers >= breaker_at && summary.success {
                let breaker = PipelineError::CircuitBreaker {
                    failed: failed_workers,
                    total: worker_count,
                };
                warn!(%breaker, "Cancelling the remaining workers");
                summary.errors.push(breaker.to_string());
                summary.success = false;
                cancel.cancel();
            }
        }

        // The queue counter is authoritative: a timed-out worker's
        // outcome is dropped, but the records it finished were already
        // marked done.
        let (completed, total) = queue.progress();
        summary.imported = completed as u64;

        info!(
            imported = summary.imported,
            total,
            errors = summary.errors.len(),
            success = summary.success,
            "Import run finished"
        );
        for usage in self.governor.pool().usage_snapshots() {
            info!(
                credential = %usage.name,
                succeeded = usage.succeeded,
                failed = usage.failed,
                rate_limit_hits = usage.rate_limit_hits,
                "Credential usage"
            );
        }

        Ok(summary)
    }

    /// Build the work queue, skipping records a previous run persisted.
    ///
    /// `None` means the resume point already covers the whole backlog.
    async fn plan_queue(&self, backlog: Vec<RawRecord>) -> Result<Option<WorkQueue>> {
        if !self.settings.resume {
            debug!("Resume disabled, processing the whole backlog");
            return Ok(Some(WorkQueue::new(backlog)));
        }

        let planner = ResumePlanner::new(Arc::clone(&self.store));
        match planner.find_resume_ordinal(&backlog).await? {
            None => Ok(Some(WorkQueue::new(backlog))),
            Some(ordinal) if ordinal >= backlog.len() => Ok(None),
            Some(ordinal) => {
                let remainder = backlog[ordinal..].to_vec();
                info!(
                    skipped = ordinal,
                    remaining = remainder.len(),
                    "Resuming after a previous run"
                );
                Ok(Some(WorkQueue::with_base_ordinal(remainder, ordinal + 1)))
            }
        }
    }
}

/// Bound a worker loop with the configured wall-clock allowance.
///
/// A timed-out worker is reported as failed with no import count; the
/// shared queue still remembers what it completed.
async fn supervise_worker(ctx: WorkerContext, allowance: Duration) -> WorkerOutcome {
    let worker_id = ctx.worker_id;
    let registry = ctx.registry.clone();
    match tokio::time::timeout(allowance, run_worker(ctx)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            let err = PipelineError::WorkerTimeout {
                worker_id,
                elapsed_secs: allowance.as_secs(),
            };
            error!(worker = worker_id, "{}", err);
            registry.finish(worker_id, WorkerStatus::Failed);
            WorkerOutcome {
                worker_id,
                imported: 0,
                errors: vec![err.to_string()],
                status: WorkerStatus::Failed,
            }
        }
    }
}
