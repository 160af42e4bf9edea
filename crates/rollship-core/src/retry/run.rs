//! Retry loop: run an operation until success, a non-retryable error, or the attempt ceiling.

use std::fmt::Display;
use std::time::Duration;

use super::error::ErrorClass;
use super::policy::{BackoffPolicy, RetryDecision};

/// Value produced by the attempt that succeeded.
#[derive(Debug)]
pub struct Succeeded<T> {
    pub value: T,
    /// 1-based number of the successful attempt.
    pub attempts: u32,
}

/// The loop gave up: either the last error was not retryable or no attempts remain.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub last_error: E,
    pub attempts: u32,
}

/// Runs `operation` under `policy`, sleeping the calling thread between attempts.
///
/// `operation` receives the 1-based attempt number.
pub fn execute<T, E, F, P>(
    policy: &BackoffPolicy,
    operation: F,
    should_retry: P,
) -> Result<Succeeded<T>, Exhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
    P: FnMut(&E) -> bool,
{
    execute_with_sleep(policy, operation, should_retry, std::thread::sleep)
}

/// Like [`execute`] with an injectable sleep.
pub fn execute_with_sleep<T, E, F, P, S>(
    policy: &BackoffPolicy,
    mut operation: F,
    mut should_retry: P,
    mut sleep: S,
) -> Result<Succeeded<T>, Exhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
    P: FnMut(&E) -> bool,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match operation(attempt) {
            Ok(value) => {
                return Ok(Succeeded {
                    value,
                    attempts: attempt,
                })
            }
            Err(e) => {
                let class = if should_retry(&e) {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Permanent
                };
                match policy.decide(attempt, class) {
                    RetryDecision::NoRetry => {
                        return Err(Exhausted {
                            last_error: e,
                            attempts: attempt,
                        })
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt,
                            max_attempts = policy.max_attempts(),
                            delay_ms = d.as_millis() as u64,
                            error = %e,
                            "attempt failed, retrying"
                        );
                        sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
