//! Analytics and engine error types.
//!
//! `AnalyticsError` represents failures when talking to the behavior and
//! mistake analytics services. It lives in `adaptquiz-core` so the engine can
//! downcast and classify collaborator failures without string matching.

use thiserror::Error;

/// Errors that can occur when interacting with an analytics service.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The service returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (missing or expired token).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested resource (session, learner) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl AnalyticsError {
    /// Returns `true` if repeating the request cannot succeed without intervention.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AnalyticsError::AuthenticationFailed(_) | AnalyticsError::NotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            AnalyticsError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors raised by the engine itself rather than its collaborators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// An operation that needs a session id ran without one.
    #[error("no active session")]
    MissingSession,

    /// A response arrived for a session generation that has since been reset,
    /// or for an attempt that a new one has replaced.
    #[error("stale response for session '{session_id}' (generation {received}, current {current})")]
    StaleSession {
        session_id: String,
        received: u64,
        current: u64,
    },

    /// No engine is registered under the given session id.
    #[error("unknown session: {0}")]
    UnknownSession(String),
}

/// Short classification of a collaborator failure, for logging.
pub fn classify(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<AnalyticsError>() {
        Some(e) if e.is_permanent() => "permanent",
        Some(AnalyticsError::RateLimited { .. }) => "rate_limited",
        Some(AnalyticsError::Timeout(_)) => "timeout",
        Some(AnalyticsError::MalformedResponse(_)) => "data_shape",
        Some(_) => "transient",
        None => "unknown",
    }
}
