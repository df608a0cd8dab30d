//! Bounded exponential-backoff retry around any [`SubmissionClient`]
//!
//! Only [`Outcome::TransportError`] is retried. A transport error can hide a
//! request the remote side did accept (e.g. a timeout after the ticket was
//! created), so every retry risks a duplicate ticket. The service desk API
//! offers no idempotency key, which is why retries are off by default.
//!
//! With [`RetryingClient::with_attempt_timeout`] each attempt gets its own
//! deadline, so a hung first attempt still leaves room for the next one. The
//! caller's overall deadline should be at least [`RetryPolicy::budget`].

use super::{Outcome, SubmissionClient};
use crate::normalize::NormalizedRequest;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Default cap on a single backoff delay
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Attempt budget and delay schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; 1 disables retrying
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`, capped
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Worst-case wall time of every attempt plus every backoff sleep
    pub fn budget(&self, per_attempt: Duration) -> Duration {
        let attempts = per_attempt.saturating_mul(self.max_attempts);
        (1..self.max_attempts)
            .map(|attempt| self.delay_after(attempt))
            .fold(attempts, Duration::saturating_add)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Decorator that retries transport errors of the wrapped client
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
    attempt_timeout: Option<Duration>,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            attempt_timeout: None,
        }
    }

    /// Bound each attempt; an expired attempt counts as a transport error
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: SubmissionClient> RetryingClient<C> {
    async fn attempt(&self, request: &NormalizedRequest) -> Outcome {
        let Some(limit) = self.attempt_timeout else {
            return self.inner.submit(request).await;
        };
        match timeout(limit, self.inner.submit(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Outcome::TransportError(format!("attempt timed out after {:?}", limit)),
        }
    }
}

#[async_trait]
impl<C: SubmissionClient> SubmissionClient for RetryingClient<C> {
    async fn submit(&self, request: &NormalizedRequest) -> Outcome {
        let mut attempt = 1;
        loop {
            let outcome = self.attempt(request).await;

            if !outcome.is_retryable() || attempt >= self.policy.max_attempts {
                return outcome;
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                outcome = ?outcome,
                "Submission attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
