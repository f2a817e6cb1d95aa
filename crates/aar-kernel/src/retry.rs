//! Retry policies and async retry helper, used by the Core's bounded LLM
//! retry (spec §4.1 "up to 2 retries with exponential backoff").

use std::future::Future;
use std::time::Duration;

use crate::error::{AarError, AarResult};

/// Delay strategy between retry attempts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Same delay every attempt.
    Fixed { delay_ms: u64 },
    /// Delay increases linearly: `base_ms * attempt`.
    Linear { base_ms: u64 },
    /// Exponential backoff capped at `max_ms`, with deterministic jitter.
    ExponentialBackoff { base_ms: u64, max_ms: u64, jitter: bool },
}

impl RetryPolicy {
    /// Returns the sleep duration before the given retry attempt (0-indexed).
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let ms = match self {
            RetryPolicy::Fixed { delay_ms } => *delay_ms,
            RetryPolicy::Linear { base_ms } => base_ms.saturating_mul((attempt + 1) as u64),
            RetryPolicy::ExponentialBackoff { base_ms, max_ms, jitter } => {
                let exp = 1u64
                    .checked_shl(attempt as u32)
                    .and_then(|s| base_ms.checked_mul(s))
                    .unwrap_or(*max_ms);
                let capped = exp.min(*max_ms);
                if *jitter {
                    // Deterministic jitter: ±12.5% alternation, avoids a
                    // dependency on a PRNG for a runtime that must stay
                    // reproducible in tests.
                    let eighth = capped / 8;
                    if attempt % 2 == 0 {
                        capped.saturating_add(eighth)
                    } else {
                        capped.saturating_sub(eighth)
                    }
                    .min(*max_ms)
                } else {
                    capped
                }
            }
        };
        Duration::from_millis(ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::ExponentialBackoff { base_ms: 250, max_ms: 2_000, jitter: true }
    }
}

/// How many attempts to make and which [`RetryPolicy`] to use.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RetryConfig {
    /// Total attempts (1 = no retry).
    pub max_attempts: usize,
    pub policy: RetryPolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        // spec §4.1: "up to 2 retries" — 3 total attempts.
        Self { max_attempts: 3, policy: RetryPolicy::default() }
    }
}

/// Retry `f` up to `config.max_attempts` times, sleeping between attempts
/// according to `config.policy`. Stops early when `is_retryable` returns
/// false for the observed error.
pub async fn retry_with_policy<F, Fut, T>(
    config: &RetryConfig,
    is_retryable: impl Fn(&AarError) -> bool,
    mut f: F,
) -> AarResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AarResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 0..max_attempts {
        if attempt > 0 {
            tokio::time::sleep(config.policy.delay_for(attempt - 1)).await;
        }
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| AarError::Internal("no attempts made".into())))
}
