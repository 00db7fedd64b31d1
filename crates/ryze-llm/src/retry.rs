//! Retry policy primitives.
//!
//! Pure functions only: the delay calculator takes its randomness as an
//! argument so callers and tests control it.

use std::time::Duration;

use ryze_config::GatewayConfig;

use crate::error::LlmError;

/// Upper bound on the exponent so the shift never overflows.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Message fragments that indicate a transient upstream condition.
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "connection refused",
    "connection closed",
    "broken pipe",
    "econnreset",
    "socket hang up",
    "temporarily unavailable",
    "service unavailable",
    "overloaded",
    "rate limit",
    "too many requests",
    "resource_exhausted",
    "unavailable",
];

/// Subset of [`TRANSIENT_MARKERS`] that means throttling.
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "too many requests", "resource_exhausted"];

/// Status reported for transient errors that arrive without one.
const INFERRED_RATE_LIMIT_STATUS: u16 = 429;
const INFERRED_SERVER_STATUS: u16 = 503;

/// Bounded exponential backoff with jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay randomized in both directions, in `[0, 1]`.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_ratio: 0.25,
        }
    }
}

impl From<&GatewayConfig> for RetryPolicy {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter_ratio: config.jitter_ratio.clamp(0.0, 1.0),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Delay before the retry that follows failed attempt `attempt` (0-based).
///
/// `jitter_unit` is a sample from `[0, 1)`; 0.5 means no jitter. The result
/// never exceeds `policy.max_delay`.
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32, jitter_unit: f64) -> Duration {
    let factor = 1u64 << attempt.min(MAX_BACKOFF_EXPONENT);
    let base_ms = policy.base_delay.as_millis() as f64;
    let max_ms = policy.max_delay.as_millis() as f64;
    let exp_ms = (base_ms * factor as f64).min(max_ms);

    let unit = jitter_unit.clamp(0.0, 1.0);
    let spread = exp_ms * policy.jitter_ratio.clamp(0.0, 1.0);
    let jittered = exp_ms + spread * (2.0 * unit - 1.0);

    Duration::from_millis(jittered.clamp(0.0, max_ms).round() as u64)
}

/// HTTP statuses worth retrying: request timeout, rate limit and any 5xx.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

/// Best-effort transient check for failures that carry no status code.
pub fn is_transient_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Map an error that carries no status code (a mid-stream error payload or
/// an error object inside a 200 body) to an error, inferring transience
/// from the message.
pub fn classify_message(message: &str) -> LlmError {
    let message = message.trim().to_string();
    let lower = message.to_ascii_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return LlmError::RateLimited {
            status: INFERRED_RATE_LIMIT_STATUS,
            message,
        };
    }
    if is_transient_message(&message) {
        return LlmError::Server {
            status: INFERRED_SERVER_STATUS,
            message,
        };
    }
    LlmError::Response(message)
}

/// Map a non-success HTTP response to an error.
pub fn classify_status(status: u16, body: &str) -> LlmError {
    let message = body.trim().to_string();
    match status {
        408 | 429 => LlmError::RateLimited { status, message },
        500..=599 => LlmError::Server { status, message },
        401 | 403 => LlmError::Auth { status, message },
        404 => LlmError::NotFound(message),
        400..=499 => LlmError::BadRequest(format!("HTTP {}: {}", status, message)),
        _ => LlmError::Response(format!("unexpected HTTP {}: {}", status, message)),
    }
}
