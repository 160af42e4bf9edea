use std::time::Duration;

use super::error::ErrorClass;

/// Hard ceiling on delivery attempts, including the first. Not configurable.
pub const MAX_ATTEMPTS: u32 = 3;

/// Growth factor between consecutive delays.
pub const DEFAULT_MULTIPLIER: f64 = 1.5;

/// Decision returned by the backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff bounded by `max_delay` and [`MAX_ATTEMPTS`].
///
/// Only the delay bounds (and multiplier) are tunable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    min_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_secs(1, 60)
    }
}

impl BackoffPolicy {
    /// `max_delay` is raised to `min_delay` if smaller; multipliers below 1.0
    /// (or NaN) are treated as 1.0 so the sequence never shrinks.
    pub fn new(min_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        let multiplier = if multiplier >= 1.0 { multiplier } else { 1.0 };
        Self {
            min_delay,
            max_delay: max_delay.max(min_delay),
            multiplier,
        }
    }

    /// Delay bounds in seconds with the default multiplier.
    pub fn from_secs(min_secs: u64, max_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(min_secs),
            Duration::from_secs(max_secs),
            DEFAULT_MULTIPLIER,
        )
    }

    /// Same multiplier, different bounds. Tests use this with tiny delays.
    pub fn with_delays(self, min_delay: Duration, max_delay: Duration) -> Self {
        Self::new(min_delay, max_delay, self.multiplier)
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn max_attempts(&self) -> u32 {
        MAX_ATTEMPTS
    }

    /// Delay to wait after failed attempt `attempt` (1-based):
    /// `min_delay * multiplier^(attempt-1)`, capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(64) as i32;
        let secs = self.min_delay.as_secs_f64() * self.multiplier.powi(exp);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// The full sequence of delays a fully transient run would sleep through.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..MAX_ATTEMPTS).map(move |attempt| self.delay_after(attempt))
    }

    /// Decide what to do after attempt `attempt` (1-based) failed with `class`.
    pub fn decide(&self, attempt: u32, class: ErrorClass) -> RetryDecision {
        if attempt >= MAX_ATTEMPTS {
            return RetryDecision::NoRetry;
        }
        match class {
            ErrorClass::Permanent => RetryDecision::NoRetry,
            ErrorClass::Transient => RetryDecision::RetryAfter(self.delay_after(attempt)),
        }
    }
}
