use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// LLM errors
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("API key environment variable '{0}' is not set")]
    MissingApiKey(String),
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    #[error("rate limited (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("response blocked by safety filters: {0}")]
    SafetyBlocked(String),
    #[error("client configuration error: {0}")]
    Config(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("model call failed after {attempts} attempts ({cause}): {last}")]
    RetriesExhausted {
        attempts: u32,
        cause: RetryCause,
        last: Box<LlmError>,
    },
}

/// Transient failure family named in `RetriesExhausted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCause {
    Timeout,
    Network,
    Server,
    RateLimit,
}

impl fmt::Display for RetryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Server => "server",
            Self::RateLimit => "rate limit",
        })
    }
}

impl LlmError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        self.retry_cause().is_some()
    }

    pub fn retry_cause(&self) -> Option<RetryCause> {
        match self {
            Self::Timeout(_) => Some(RetryCause::Timeout),
            Self::Network(_) => Some(RetryCause::Network),
            Self::Server { .. } => Some(RetryCause::Server),
            Self::RateLimited { .. } => Some(RetryCause::RateLimit),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Network(format!("request timed out: {}", err));
        }
        if err.is_decode() {
            return Self::Serialization(err.to_string());
        }
        if let Some(status) = err.status() {
            return crate::retry::classify_status(status.as_u16(), &err.to_string());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(LlmError::Network("reset".into()).is_transient());
        assert!(LlmError::Server {
            status: 503,
            message: String::new()
        }
        .is_transient());
        assert!(LlmError::RateLimited {
            status: 429,
            message: String::new()
        }
        .is_transient());

        assert!(!LlmError::MissingApiKey("GEMINI_API_KEY".into()).is_transient());
        assert!(!LlmError::BadRequest("bad".into()).is_transient());
        assert!(!LlmError::SafetyBlocked("SAFETY".into()).is_transient());
        assert!(!LlmError::Auth {
            status: 401,
            message: String::new()
        }
        .is_transient());
    }

    #[test]
    fn test_exhausted_message_names_cause() {
        let err = LlmError::RetriesExhausted {
            attempts: 3,
            cause: RetryCause::RateLimit,
            last: Box::new(LlmError::RateLimited {
                status: 429,
                message: "slow down".into(),
            }),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("rate limit"));
        assert!(text.contains("slow down"));
        assert!(!err.is_transient());
    }
}
