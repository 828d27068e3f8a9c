//! HTTP status categorization.
//!
//! The fixed table mapping an upstream status code to a stable
//! (kind, message, retryable) triple. This is the single source of
//! truth for retry policy; the executor consults nothing else.

use qbo_types::ErrorKind;

/// Category assigned to an upstream HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCategory {
    pub kind: ErrorKind,
    pub message: &'static str,
    /// Whether the executor may retry this status under backoff. A 401
    /// is "retryable" in the sense of one refresh-and-retry, handled by
    /// the executor's refresh path rather than the backoff loop.
    pub retryable: bool,
}

/// Map a status code to its category.
pub fn categorize(status: u16) -> ErrorCategory {
    match status {
        400 => ErrorCategory {
            kind: ErrorKind::BadRequest,
            message: "bad request",
            retryable: false,
        },
        401 => ErrorCategory {
            kind: ErrorKind::Unauthorized,
            message: "unauthorized",
            retryable: true,
        },
        403 => ErrorCategory {
            kind: ErrorKind::Forbidden,
            message: "forbidden",
            retryable: false,
        },
        404 => ErrorCategory {
            kind: ErrorKind::NotFound,
            message: "not found",
            retryable: false,
        },
        429 => ErrorCategory {
            kind: ErrorKind::RateLimited,
            message: "rate limited",
            retryable: true,
        },
        503 => ErrorCategory {
            kind: ErrorKind::ServiceUnavailable,
            message: "service unavailable",
            retryable: true,
        },
        500..=599 => ErrorCategory {
            kind: ErrorKind::ServerError,
            message: "server error",
            retryable: true,
        },
        _ => ErrorCategory {
            kind: ErrorKind::Unknown,
            message: "unexpected status",
            retryable: false,
        },
    }
}
