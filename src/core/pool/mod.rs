//! Pooled credentials and usage accounting
//!
//! The pool owns one `CredentialState` per configured credential:
//! immutable connection details plus mutable counters guarded by a
//! single lock. Workers are mapped to members deterministically by
//! index, so a worker talks to the same credential for its whole life.

use crate::config::models::{CredentialConfig, CredentialTier, WorkerLimits};
use crate::utils::error::{PipelineError, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of a budget reservation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    /// A slot was reserved in the current window
    Granted,
    /// The window is full; the next one opens at this instant
    Exhausted { opens_at: Instant },
}

/// Mutable per-credential counters.
///
/// The window pair implements the rolling budget; the lifetime counters
/// feed the end-of-run usage report.
#[derive(Debug)]
struct CredentialUsage {
    window_start: Instant,
    consumed_this_window: u32,
    succeeded: u64,
    failed: u64,
    rate_limit_hits: u64,
}

/// Point-in-time copy of one credential's counters
#[derive(Debug, Clone, Serialize)]
pub struct CredentialUsageSnapshot {
    pub name: String,
    pub consumed_this_window: u32,
    pub succeeded: u64,
    pub failed: u64,
    pub rate_limit_hits: u64,
}

/// One pool member: immutable config plus locked counters
#[derive(Debug)]
pub struct CredentialState {
    config: CredentialConfig,
    usage: Mutex<CredentialUsage>,
}

impl CredentialState {
    fn new(config: CredentialConfig) -> Self {
        Self {
            config,
            usage: Mutex::new(CredentialUsage {
                window_start: Instant::now(),
                consumed_this_window: 0,
                succeeded: 0,
                failed: 0,
                rate_limit_hits: 0,
            }),
        }
    }

    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Try to reserve one request slot in the current window.
    ///
    /// Rolls the window over first if it has elapsed. The check and the
    /// reservation happen under one lock, so concurrent callers can
    /// never both take the last slot.
    pub fn try_consume(&self, window: Duration, now: Instant) -> BudgetDecision {
        let mut usage = self.usage.lock();
        if now.duration_since(usage.window_start) >= window {
            usage.window_start = now;
            usage.consumed_this_window = 0;
        }
        if usage.consumed_this_window < self.config.requests_per_minute {
            usage.consumed_this_window += 1;
            BudgetDecision::Granted
        } else {
            BudgetDecision::Exhausted {
                opens_at: usage.window_start + window,
            }
        }
    }

    pub fn record_success(&self) {
        self.usage.lock().succeeded += 1;
    }

    pub fn record_failure(&self) {
        self.usage.lock().failed += 1;
    }

    pub fn record_rate_limit_hit(&self) {
        self.usage.lock().rate_limit_hits += 1;
    }

    pub fn snapshot(&self) -> CredentialUsageSnapshot {
        let usage = self.usage.lock();
        CredentialUsageSnapshot {
            name: self.config.name.clone(),
            consumed_this_window: usage.consumed_this_window,
            succeeded: usage.succeeded,
            failed: usage.failed,
            rate_limit_hits: usage.rate_limit_hits,
        }
    }
}

/// Fixed-membership credential pool shared by every worker
#[derive(Debug)]
pub struct CredentialPool {
    credentials: Vec<Arc<CredentialState>>,
}

impl CredentialPool {
    pub fn new(configs: Vec<CredentialConfig>) -> Result<Self> {
        if configs.is_empty() {
            return Err(PipelineError::NoCredentials);
        }
        Ok(Self {
            credentials: configs
                .into_iter()
                .map(|config| Arc::new(CredentialState::new(config)))
                .collect(),
        })
    }

    /// Deterministic worker-to-credential assignment.
    ///
    /// `worker_id % pool_size`, so repeated calls for the same worker
    /// always land on the same member, and a single-credential pool is
    /// simply shared by everyone.
    pub fn assign(&self, worker_id: usize) -> Arc<CredentialState> {
        Arc::clone(&self.credentials[worker_id % self.credentials.len()])
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Usage snapshot of every member, in declaration order
    pub fn usage_snapshots(&self) -> Vec<CredentialUsageSnapshot> {
        self.credentials.iter().map(|c| c.snapshot()).collect()
    }

    /// Worker count that saturates the pooled budget without tripping
    /// vendor-side limits.
    ///
    /// Sums the per-minute budgets and applies a utilization factor:
    /// conservative when every credential is free tier, aggressive when
    /// every one is paid, halfway in between for mixed pools. The result
    /// is clamped to the configured `[min, max]`.
    pub fn optimal_worker_count(&self, limits: &WorkerLimits) -> usize {
        let total_rpm: u32 = self
            .credentials
            .iter()
            .map(|c| c.config().requests_per_minute)
            .sum();
        let all_paid = self
            .credentials
            .iter()
            .all(|c| c.config().tier == CredentialTier::Paid);
        let all_free = self
            .credentials
            .iter()
            .all(|c| c.config().tier == CredentialTier::Free);

        let factor = if all_paid {
            limits.paid_utilization
        } else if all_free {
            limits.free_utilization
        } else {
            (limits.free_utilization + limits.paid_utilization) / 2.0
        };

        let sized = (f64::from(total_rpm) * factor).floor() as usize;
        sized.clamp(limits.min, limits.max)
    }
}
