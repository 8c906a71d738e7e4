//! Pipeline tuning models

use serde::{Deserialize, Serialize};

/// Bounds and utilization factors for sizing the worker fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerLimits {
    #[serde(default = "default_min_workers")]
    pub min: usize,
    #[serde(default = "default_max_workers")]
    pub max: usize,
    /// Fraction of the pooled per-minute budget to spend when every
    /// credential is free tier
    #[serde(default = "default_free_utilization")]
    pub free_utilization: f64,
    /// Fraction of the pooled per-minute budget to spend when every
    /// credential is paid tier
    #[serde(default = "default_paid_utilization")]
    pub paid_utilization: f64,
}

impl Default for WorkerLimits {
    fn default() -> Self {
        Self {
            min: default_min_workers(),
            max: default_max_workers(),
            free_utilization: default_free_utilization(),
            paid_utilization: default_paid_utilization(),
        }
    }
}

/// Retry and backoff tuning for governed enrichment calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per record before the error is surfaced, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Random spread applied to each delay, as a fraction of the delay
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

/// HTTP settings for the enrichment backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Pipeline-wide tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub workers: WorkerLimits,
    /// Wall-time allowance for one worker loop, in seconds
    #[serde(default = "default_worker_timeout_secs")]
    pub worker_timeout_secs: u64,
    /// A worker that fails more times than this in a row without a single
    /// success gives up on the run
    #[serde(default = "default_consecutive_failure_limit")]
    pub consecutive_failure_limit: u32,
    /// Fraction of failed workers that halts the whole run
    #[serde(default = "default_breaker_fraction")]
    pub breaker_failure_fraction: f64,
    /// Length of the per-credential rate window, in seconds
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    /// Look up the previous run's last imported record before starting
    #[serde(default = "default_resume")]
    pub resume: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: WorkerLimits::default(),
            worker_timeout_secs: default_worker_timeout_secs(),
            consecutive_failure_limit: default_consecutive_failure_limit(),
            breaker_failure_fraction: default_breaker_fraction(),
            rate_window_secs: default_rate_window_secs(),
            retry: RetryConfig::default(),
            resume: default_resume(),
        }
    }
}

fn default_min_workers() -> usize {
    1
}

fn default_max_workers() -> usize {
    20
}

fn default_free_utilization() -> f64 {
    0.5
}

fn default_paid_utilization() -> f64 {
    0.9
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.1
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_worker_timeout_secs() -> u64 {
    600
}

fn default_consecutive_failure_limit() -> u32 {
    10
}

fn default_breaker_fraction() -> f64 {
    0.5
}

fn default_rate_window_secs() -> u64 {
    60
}

fn default_resume() -> bool {
    true
}
