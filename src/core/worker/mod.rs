//! Worker loops and their status registry
//!
//! A worker loop repeatedly pulls a record from the shared queue,
//! classifies it, enriches it through the governor, persists it, and
//! reports progress. Failures condemn the record, not the loop, except
//! when a loop keeps failing without ever having succeeded.

use crate::core::classifier::CategoryTable;
use crate::core::enrichment::{build_prompt, decode_fields};
use crate::core::governor::RateLimitGovernor;
use crate::core::queue::{WorkItem, WorkQueue};
use crate::core::types::EnrichedRecord;
use crate::storage::CatalogStore;
use crate::utils::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of one worker loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Idle,
    Working,
    Completed,
    Failed,
    Cancelled,
}

/// Live counters for one worker loop, updated only by that loop's own
/// supervision
#[derive(Debug, Clone, Serialize)]
pub struct WorkerState {
    pub worker_id: usize,
    pub status: WorkerStatus,
    pub processed: u64,
    pub errors: u64,
    /// Display name of the record currently in flight
    pub current_record: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Shared registry of worker states.
///
/// Each worker mutates its own entry; the orchestrator and any
/// reporting surface read point-in-time snapshots.
#[derive(Debug, Clone, Default)]
pub struct WorkerRegistry {
    states: Arc<DashMap<usize, WorkerState>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, worker_id: usize) {
        self.states.insert(
            worker_id,
            WorkerState {
                worker_id,
                status: WorkerStatus::Idle,
                processed: 0,
                errors: 0,
                current_record: None,
                started_at: Some(Utc::now()),
                ended_at: None,
            },
        );
    }

    fn update<F: FnOnce(&mut WorkerState)>(&self, worker_id: usize, apply: F) {
        if let Some(mut state) = self.states.get_mut(&worker_id) {
            apply(&mut state);
        }
    }

    fn begin_record(&self, worker_id: usize, display_name: &str) {
        self.update(worker_id, |state| {
            state.status = WorkerStatus::Working;
            state.current_record = Some(display_name.to_string());
        });
    }

    fn complete_record(&self, worker_id: usize) {
        self.update(worker_id, |state| {
            state.processed += 1;
            state.current_record = None;
        });
    }

    fn record_error(&self, worker_id: usize) {
        self.update(worker_id, |state| {
            state.errors += 1;
            state.current_record = None;
        });
    }

    /// Move a worker to a terminal status
    pub fn finish(&self, worker_id: usize, status: WorkerStatus) {
        self.update(worker_id, |state| {
            state.status = status;
            state.current_record = None;
            state.ended_at = Some(Utc::now());
        });
    }

    /// Point-in-time copy of every state, ordered by worker id
    pub fn snapshot(&self) -> Vec<WorkerState> {
        let mut states: Vec<WorkerState> =
            self.states.iter().map(|entry| entry.value().clone()).collect();
        states.sort_by_key(|state| state.worker_id);
        states
    }
}

/// What a finished worker loop reports back
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub worker_id: usize,
    /// Records this loop persisted
    pub imported: u64,
    /// One message per condemned record, plus any abort notice
    pub errors: Vec<String>,
    /// Terminal status: completed, failed, or cancelled
    pub status: WorkerStatus,
}

/// Everything one worker loop needs, cloneable per spawn
#[derive(Clone)]
pub struct WorkerContext {
    pub worker_id: usize,
    pub queue: Arc<WorkQueue>,
    pub classifier: Arc<CategoryTable>,
    pub governor: Arc<RateLimitGovernor>,
    pub store: Arc<dyn CatalogStore>,
    pub registry: WorkerRegistry,
    pub cancel: CancellationToken,
    /// Consecutive failures tolerated before a never-successful loop
    /// gives up
    pub failure_limit: u32,
}

enum ProcessOutcome {
    Persisted,
    /// Cancellation fired mid-record; the record stays unreported
    Interrupted,
}

/// Run one worker loop to a terminal state.
///
/// Cancellation is observed at the top of the loop and again after the
/// enrichment call returns; a record interrupted in between is left
/// unreported, so a later run picks it up through the resume scan.
pub async fn run_worker(ctx: WorkerContext) -> WorkerOutcome {
    let mut outcome = WorkerOutcome {
        worker_id: ctx.worker_id,
        imported: 0,
        errors: Vec::new(),
        status: WorkerStatus::Completed,
    };
    let mut consecutive_failures = 0u32;

    loop {
        if ctx.cancel.is_cancelled() {
            info!(worker = ctx.worker_id, "Cancellation observed, unwinding");
            outcome.status = WorkerStatus::Cancelled;
            break;
        }
        let Some(item) = ctx.queue.next() else {
            debug!(worker = ctx.worker_id, "Queue drained");
            break;
        };

        ctx.registry.begin_record(ctx.worker_id, &item.record.display_name);

        match process_record(&ctx, &item).await {
            Ok(ProcessOutcome::Persisted) => {
                ctx.queue.mark_done();
                ctx.registry.complete_record(ctx.worker_id);
                outcome.imported += 1;
                consecutive_failures = 0;
            }
            Ok(ProcessOutcome::Interrupted) => {
                info!(
                    worker = ctx.worker_id,
                    ordinal = item.ordinal,
                    "Cancelled mid-record, leaving it unreported"
                );
                outcome.status = WorkerStatus::Cancelled;
                break;
            }
            Err(err) => {
                warn!(
                    worker = ctx.worker_id,
                    ordinal = item.ordinal,
                    record = %item.record.display_name,
                    error = %err,
                    "Record failed"
                );
                ctx.registry.record_error(ctx.worker_id);
                outcome.errors.push(format!(
                    "record '{}' (ordinal {}): {}",
                    item.record.display_name, item.ordinal, err
                ));
                consecutive_failures += 1;

                if outcome.imported == 0 && consecutive_failures > ctx.failure_limit {
                    warn!(
                        worker = ctx.worker_id,
                        failures = consecutive_failures,
                        "No successes and failures keep coming, giving up"
                    );
                    outcome.errors.push(format!(
                        "worker {} aborted after {} consecutive failures without a success",
                        ctx.worker_id, consecutive_failures
                    ));
                    outcome.status = WorkerStatus::Failed;
                    break;
                }
            }
        }
    }

    ctx.registry.finish(ctx.worker_id, outcome.status);
    info!(
        worker = ctx.worker_id,
        imported = outcome.imported,
        errors = outcome.errors.len(),
        status = ?outcome.status,
        "Worker finished"
    );
    outcome
}

/// Classify, enrich, and persist one record
async fn process_record(ctx: &WorkerContext, item: &WorkItem) -> Result<ProcessOutcome> {
    let record = &item.record;

    let category = ctx
        .classifier
        .resolve(item.ordinal)
        .ok_or_else(|| PipelineError::classification(record.display_name.clone(), item.ordinal))?;

    let prompt = build_prompt(record, &category.label);
    let result = ctx.governor.call(ctx.worker_id, &prompt).await?;

    if ctx.cancel.is_cancelled() {
        return Ok(ProcessOutcome::Interrupted);
    }

    debug!(
        worker = ctx.worker_id,
        ordinal = item.ordinal,
        attempts = result.metrics.attempts,
        duration_ms = result.metrics.duration.as_millis() as u64,
        tokens = ?result.metrics.tokens_used,
        "Record enriched"
    );

    let fields = decode_fields(&result.response.text)?;
    let enriched = EnrichedRecord {
        id: Uuid::new_v4(),
        code: record.code.clone(),
        display_name: record.display_name.clone(),
        unit_price: record.unit_price,
        translated_name: fields.translated_name,
        brand_guess: fields.brand,
        description_text: fields.description,
        unit_of_measure: fields.unit_of_measure,
        resolved_category_id: category.label.clone(),
        generated_image_urls: result.response.image_urls,
        created_at: Utc::now(),
    };

    ctx.store.insert(enriched).await?;
    Ok(ProcessOutcome::Persisted)
}
