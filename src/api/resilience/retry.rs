//! Retry policies with exponential backoff
//!
//! Two strategies exist and are stacked explicitly at call sites: the
//! transport retries transient failures with backoff, and callers retry the
//! whole (already retried) transport call on any non-success outcome.

use crate::api::models::ApiOutcome;
use log::{debug, warn};
use rand::Rng;
use reqwest::Method;
use std::future::Future;
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::transient(
            crate::api::constants::retry::MAX_RETRY_ATTEMPTS,
            Duration::from_millis(crate::api::constants::retry::STARTING_DELAY_MS),
        )
    }
}

impl RetryConfig {
    /// Backoff config for transient failures: `max_retry_attempts` retries
    /// after the first attempt, starting at `starting_delay` and doubling
    pub fn transient(max_retry_attempts: u32, starting_delay: Duration) -> Self {
        Self {
            max_attempts: max_retry_attempts.saturating_add(1),
            base_delay: starting_delay,
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    /// Back-to-back attempts with no wait in between
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Statuses presumed likely to succeed on retry
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// Which outcomes a policy retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Retry 408/500/502/503/504 responses and transport failures
    RetryOnTransientOnly,
    /// Retry every outcome that is not a 2xx response
    RetryOnAnyFailure,
}

impl RetryStrategy {
    pub fn should_retry(&self, outcome: &ApiOutcome) -> bool {
        match (self, outcome) {
            // Nothing was sent; repeating cannot change that
            (_, ApiOutcome::NotAttempted(_)) => false,
            (RetryStrategy::RetryOnTransientOnly, ApiOutcome::Completed(response)) => {
                is_transient_status(response.status)
            }
            (RetryStrategy::RetryOnTransientOnly, ApiOutcome::TransportFailure(_)) => true,
            (RetryStrategy::RetryOnAnyFailure, outcome) => !outcome.is_success(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RetryStrategy::RetryOnTransientOnly => "transient",
            RetryStrategy::RetryOnAnyFailure => "any-failure",
        }
    }
}

/// Retry policy pairing a strategy with its backoff config
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    strategy: RetryStrategy,
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(strategy: RetryStrategy, config: RetryConfig) -> Self {
        Self { strategy, config }
    }

    pub fn transient_only(config: RetryConfig) -> Self {
        Self::new(RetryStrategy::RetryOnTransientOnly, config)
    }

    pub fn any_failure(config: RetryConfig) -> Self {
        Self::new(RetryStrategy::RetryOnAnyFailure, config)
    }

    pub fn strategy(&self) -> RetryStrategy {
        self.strategy
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Run `operation` until it yields an outcome the strategy accepts or the
    /// attempt budget is spent. The last observed outcome is returned as-is.
    pub async fn execute<F, Fut>(&self, method: &Method, url: &str, mut operation: F) -> ApiOutcome
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ApiOutcome>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if attempt > 1 {
                debug!("{} for resource '{}'. Attempt #{}.", method, url, attempt);
            }

            let outcome = operation().await;

            if attempt >= max_attempts || !self.strategy.should_retry(&outcome) {
                if attempt > 1 && outcome.is_success() {
                    debug!("{} for resource '{}' succeeded after {} attempts", method, url, attempt);
                }
                return outcome;
            }

            let delay = self.calculate_delay(attempt);
            warn!(
                "Retrying {} for resource '{}'. Failed with {}. Retrying... ({} retry #{} of {} with {:.1}s delay)",
                method,
                url,
                outcome.describe(),
                self.strategy.name(),
                attempt,
                max_attempts - 1,
                delay.as_secs_f64()
            );

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    /// Exponential backoff delay before retry number `retry` (1-based)
    fn calculate_delay(&self, retry: u32) -> Duration {
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(retry as i32 - 1);

        let mut delay = Duration::from_millis(delay_ms as u64);

        if delay > self.config.max_delay {
            delay = self.config.max_delay;
        }

        if self.config.jitter && !delay.is_zero() {
            let jitter_factor = rand::rng().random_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }
}
