//! Typed failure taxonomy for QuickBooks API calls.
//!
//! Every request through the resilient client resolves to either a
//! parsed body or one of these variants. Handlers never see a panic
//! or a raw transport error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable category assigned to an upstream HTTP status code.
///
/// This is the single source of truth for retry policy: the request
/// executor consults the category table and nothing else when deciding
/// whether a status is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    ServerError,
    ServiceUnavailable,
    Unknown,
}

impl ErrorKind {
    /// Stable snake_case label used in API responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the resilient QuickBooks client.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
    /// No access token is held; the OAuth flow has not completed.
    #[error("Not authenticated with QuickBooks")]
    NotAuthenticated,

    /// No company id resolvable from argument, token, or configuration.
    #[error("No QuickBooks company ID available")]
    NoCompanyContext,

    /// The refresh token was rejected; stored credentials were cleared
    /// and a human must re-authorize.
    #[error("QuickBooks credentials invalid, re-authorization required")]
    InvalidCredentials,

    /// Network or server trouble during token refresh; safe to retry later.
    #[error("Transient failure talking to QuickBooks: {message}")]
    TransientFailure { message: String },

    /// Upstream returned 429 on every attempt.
    #[error("Rate limited by QuickBooks")]
    RateLimited,

    /// Upstream returned 5xx on every attempt.
    #[error("QuickBooks server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Circuit breaker is open; no network call was made.
    #[error("Circuit breaker open, retry after {retry_after_secs}s")]
    CircuitOpen { retry_after_secs: u64 },

    /// Every attempt timed out.
    #[error("Request to QuickBooks timed out")]
    Timeout,

    /// Could not establish a connection on any attempt.
    #[error("Connection to QuickBooks failed: {message}")]
    ConnectionFailed { message: String },

    /// Categorized non-retryable upstream response (400, 403, 404, other 4xx).
    #[error("QuickBooks rejected the request ({kind}, status {status}): {message}")]
    Upstream {
        kind: ErrorKind,
        status: u16,
        message: String,
    },
}

impl ApiError {
    /// Stable label for the failure, used in API responses and logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            ApiError::NotAuthenticated => "not_authenticated",
            ApiError::NoCompanyContext => "no_company_context",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::TransientFailure { .. } => "transient_failure",
            ApiError::RateLimited => "rate_limited",
            ApiError::ServerError { .. } => "server_error",
            ApiError::CircuitOpen { .. } => "circuit_open",
            ApiError::Timeout => "timeout",
            ApiError::ConnectionFailed { .. } => "connection_failed",
            ApiError::Upstream { kind, .. } => kind.as_str(),
        }
    }
}

/// Result type for QuickBooks API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization_round_trip() {
        let err = ApiError::Upstream {
            kind: ErrorKind::Forbidden,
            status: 403,
            message: "insufficient scope".to_string(),
        };

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Upstream"));
        assert!(json.contains("forbidden"));

        let back: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn test_kind_labels_are_snake_case() {
        assert_eq!(ApiError::NotAuthenticated.kind_label(), "not_authenticated");
        assert_eq!(
            ApiError::CircuitOpen { retry_after_secs: 60 }.kind_label(),
            "circuit_open"
        );
        assert_eq!(ErrorKind::ServiceUnavailable.as_str(), "service_unavailable");
    }
}
