use rand::Rng;
use std::time::Duration;

use super::classify::classify;
use super::outcome::AttemptOutcome;

/// Verdict for a single attempt outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// 2xx: the device is done.
    Success,
    /// Transport error, 429 or 5xx: worth another attempt.
    Retryable,
    /// Any other status (401, 404, ...) or a non-retryable transport error.
    Terminal,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The attempt succeeded; record it.
    Succeeded,
    /// Retry after the given delay.
    RetryAfter(Duration),
    /// Stop and record the last outcome as the failure.
    GiveUp,
}

/// Exponential backoff with additive uniform jitter:
/// `backoff(i) = base_delay * 2^i + uniform[0, jitter_max)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Exclusive upper bound of the jitter term.
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(500),
            jitter_max: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Upper bound on attempts per device (`retries + 1`).
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Deterministic part of the backoff: `base_delay * 2^attempt_index`, saturating.
    pub fn base_backoff(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Backoff with an explicit jitter sample; the sample is clamped below `jitter_max`.
    pub fn backoff_with_jitter(&self, attempt_index: u32, jitter: Duration) -> Duration {
        let jitter = if self.jitter_max.is_zero() {
            Duration::ZERO
        } else {
            jitter.min(self.jitter_max - Duration::from_nanos(1))
        };
        self.base_backoff(attempt_index).saturating_add(jitter)
    }

    /// Delay to sleep before attempt `attempt_index + 1`.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let nanos = u64::try_from(self.jitter_max.as_nanos()).unwrap_or(u64::MAX);
        let jitter = if nanos == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(rand::thread_rng().gen_range(0..nanos))
        };
        self.backoff_with_jitter(attempt_index, jitter)
    }

    /// Decide what to do after attempt `attempt_index` (0-based) produced `outcome`.
    pub fn decide(&self, attempt_index: u32, outcome: &AttemptOutcome) -> RetryDecision {
        match classify(outcome) {
            Verdict::Success => RetryDecision::Succeeded,
            Verdict::Terminal => RetryDecision::GiveUp,
            Verdict::Retryable if attempt_index >= self.retries => RetryDecision::GiveUp,
            Verdict::Retryable => RetryDecision::RetryAfter(self.backoff(attempt_index)),
        }
    }
}
