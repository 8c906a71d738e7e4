//! Rate-limit governor for enrichment calls
//!
//! One governor fronts the whole credential pool. For every worker call
//! it resolves the worker's assigned credential, parks until the
//! credential's rolling window has budget, shapes the prompt to the
//! credential's capabilities, and retries failures with bounded
//! exponential backoff. Retries stay on the same credential and every
//! attempt reserves its own budget slot, so throttled endpoints are
//! never hammered while they recover.

use crate::config::models::{CredentialCapabilities, RetryConfig};
use crate::core::enrichment::prompt::JSON_FALLBACK_INSTRUCTION;
use crate::core::enrichment::{
    EnrichmentBackend, EnrichmentPrompt, EnrichmentRequest, EnrichmentResult,
};
use crate::core::pool::{BudgetDecision, CredentialPool, CredentialState};
use crate::core::types::CallMetrics;
use crate::utils::error::BackendError;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, warn};

/// Length of the rolling budget window in production
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimitGovernor {
    pool: Arc<CredentialPool>,
    backend: Arc<dyn EnrichmentBackend>,
    retry: RetryConfig,
    window: Duration,
}

impl RateLimitGovernor {
    /// Governor with the standard 60-second window
    pub fn new(
        pool: Arc<CredentialPool>,
        backend: Arc<dyn EnrichmentBackend>,
        retry: RetryConfig,
    ) -> Self {
        Self::with_window(pool, backend, retry, DEFAULT_WINDOW)
    }

    /// Governor with a custom window length
    pub fn with_window(
        pool: Arc<CredentialPool>,
        backend: Arc<dyn EnrichmentBackend>,
        retry: RetryConfig,
        window: Duration,
    ) -> Self {
        Self {
            pool,
            backend,
            retry,
            window,
        }
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Issue one governed enrichment call on behalf of a worker.
    ///
    /// Suspends while the assigned credential is out of window budget.
    /// All error kinds are retried up to the attempt bound; the last
    /// error is surfaced when the bound is reached.
    pub async fn call(
        &self,
        worker_id: usize,
        prompt: &EnrichmentPrompt,
    ) -> std::result::Result<EnrichmentResult, BackendError> {
        let credential = self.pool.assign(worker_id);
        let request = adapt_request(prompt, &credential.config().capabilities);
        let started = Instant::now();
        let mut attempt = 1u32;

        loop {
            self.acquire_budget(&credential).await;

            match self
                .backend
                .generate(credential.config(), request.clone())
                .await
            {
                Ok(response) => {
                    credential.record_success();
                    debug!(
                        credential = credential.name(),
                        attempts = attempt,
                        tokens = ?response.tokens_used,
                        "Enrichment call succeeded"
                    );
                    let tokens_used = response.tokens_used;
                    return Ok(EnrichmentResult {
                        response,
                        metrics: CallMetrics {
                            duration: started.elapsed(),
                            attempts: attempt,
                            tokens_used,
                        },
                    });
                }
                Err(err) => {
                    if err.is_rate_limited() {
                        credential.record_rate_limit_hit();
                    }
                    if attempt >= self.retry.max_attempts {
                        credential.record_failure();
                        warn!(
                            credential = credential.name(),
                            attempts = attempt,
                            error_kind = err.kind(),
                            "Enrichment call failed, retries exhausted"
                        );
                        return Err(err);
                    }

                    let delay = self.backoff_delay(attempt, err.retry_after());
                    warn!(
                        credential = credential.name(),
                        attempt,
                        error_kind = err.kind(),
                        delay_ms = delay.as_millis() as u64,
                        "Enrichment call failed, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Park until the credential's rolling window has a free slot.
    ///
    /// Waiters woken by a rollover race for the fresh window under the
    /// credential's lock; losers are handed the next opening time and
    /// go back to sleep.
    async fn acquire_budget(&self, credential: &CredentialState) {
        loop {
            match credential.try_consume(self.window, Instant::now()) {
                BudgetDecision::Granted => return,
                BudgetDecision::Exhausted { opens_at } => {
                    debug!(
                        credential = credential.name(),
                        wait_ms = opens_at.saturating_duration_since(Instant::now()).as_millis()
                            as u64,
                        "Window budget exhausted, waiting for rollover"
                    );
                    sleep_until(opens_at).await;
                }
            }
        }
    }

    /// Exponential backoff with jitter. A vendor retry hint wins when it
    /// asks for a longer wait than the computed delay.
    fn backoff_delay(&self, attempt: u32, retry_after: Option<u64>) -> Duration {
        let base = self.retry.base_delay_ms as f64;
        let exponent = attempt.saturating_sub(1) as i32;
        let mut delay_ms = (base * self.retry.backoff_multiplier.powi(exponent))
            .min(self.retry.max_delay_ms as f64);

        if self.retry.jitter > 0.0 {
            let spread = delay_ms * self.retry.jitter;
            delay_ms += rand::thread_rng().gen_range(-spread..=spread);
        }

        let computed = Duration::from_millis(delay_ms.max(0.0) as u64);
        match retry_after {
            Some(seconds) => computed.max(Duration::from_secs(seconds)),
            None => computed,
        }
    }
}

/// Shape a prompt to what a credential's endpoint can accept.
///
/// An unsupported system instruction is folded into the user content;
/// an unsupported structured-output request is dropped and replaced
/// with a textual instruction.
fn adapt_request(
    prompt: &EnrichmentPrompt,
    capabilities: &CredentialCapabilities,
) -> EnrichmentRequest {
    let mut instruction = Some(prompt.instruction.clone());
    let mut user_content = prompt.user_content.clone();
    let mut structured_output = prompt.structured_output;

    if !capabilities.system_instruction {
        if let Some(folded) = instruction.take() {
            if !folded.is_empty() {
                user_content = format!("{}\n\n{}", folded, user_content);
            }
        }
    }

    if structured_output && !capabilities.structured_output {
        structured_output = false;
        user_content = format!("{}\n\n{}", user_content, JSON_FALLBACK_INSTRUCTION);
    }

    EnrichmentRequest {
        instruction,
        user_content,
        structured_output,
    }
}
