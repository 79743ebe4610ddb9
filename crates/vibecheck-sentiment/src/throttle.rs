//! Pacing and retry for reasoning backend calls.
//!
//! Every attempt, retries included, goes through [`InferenceThrottle::wait`]
//! so each call starts at least `min_interval` (plus jitter) after the
//! previous one finished.
//! [`infer_with_retry`] retries transient failures (timeouts, connect errors,
//! HTTP 429 and 5xx) with exponential back-off.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::SentimentError;
use crate::reasoning::ReasoningBackend;

const MAX_BACKOFF_MS: u64 = 60_000;

/// Enforces a minimum randomized gap between inference calls.
#[derive(Debug)]
pub struct InferenceThrottle {
    min_interval: Duration,
    jitter: Duration,
    last_done: Mutex<Option<Instant>>,
}

impl InferenceThrottle {
    #[must_use]
    pub fn new(min_interval: Duration, jitter: Duration) -> Self {
        Self {
            min_interval,
            jitter,
            last_done: Mutex::new(None),
        }
    }

    /// No pacing at all. Used by tests and dry runs.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    fn next_gap(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.min_interval;
        }
        self.min_interval + self.jitter.mul_f64(rand::random::<f64>())
    }

    /// Sleep until the gap since the previous call finished has elapsed.
    /// Nothing is waited for before the first [`mark_done`](Self::mark_done).
    pub async fn wait(&self) {
        let last_done = self.last_done.lock().await;
        if let Some(previous) = *last_done {
            let ready_at = previous + self.next_gap();
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(
                    delay_ms = u64::try_from((ready_at - now).as_millis()).unwrap_or(u64::MAX),
                    "throttling inference"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    /// Record that a call just finished, successfully or not.
    pub async fn mark_done(&self) {
        *self.last_done.lock().await = Some(Instant::now());
    }
}

/// Returns `true` for errors worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &SentimentError) -> bool {
    match err {
        SentimentError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SentimentError::InferenceStatus { status, .. } => *status == 429 || *status >= 500,
        SentimentError::UnsupportedPlatform { .. }
        | SentimentError::Extraction { .. }
        | SentimentError::Inference(_)
        | SentimentError::Parse(_)
        | SentimentError::Persistence { .. } => false,
    }
}

fn backoff_delay(attempt: u32, backoff_base_ms: u64) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_BACKOFF_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

/// Call `backend` with up to `max_retries` additional attempts on transient
/// errors. Back-off is `backoff_base_ms * 2^(attempt-1)` with ±25 % jitter,
/// capped at 60 s.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error.
pub async fn infer_with_retry(
    backend: &dyn ReasoningBackend,
    throttle: &InferenceThrottle,
    prompt: &str,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Result<String, SentimentError> {
    let mut attempt = 0u32;
    loop {
        throttle.wait().await;
        let result = backend.infer(prompt).await;
        throttle.mark_done().await;
        match result {
            Ok(reply) => return Ok(reply),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = backoff_delay(attempt, backoff_base_ms);
                tracing::warn!(
                    backend = backend.name(),
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient inference error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
