//! Error types for colligo operations.
//!
//! This module defines the main error type [`ColligoError`] which represents
//! every failure the pipeline can report to its caller. Only the fetch and
//! scrape path produces errors; extraction, rewriting and filtering degrade
//! to a no-op on malformed input instead.
//!
//! # Example
//!
//! ```rust
//! use colligo_core::{ColligoError, FailureReason};
//!
//! let err = ColligoError::ServerFailure { status: 404, reason: FailureReason::from_status(404) };
//! assert!(err.to_string().contains("404"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the content pipeline.
///
/// Every variant is recoverable at the call site: a caller that scrapes an
/// entry logs the error and keeps the entry's pre-scrape content.
#[derive(Error, Debug)]
pub enum ColligoError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, TLS failures and
    /// connection issues.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when a fetch exceeds the caller-supplied timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, most often an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The remote server answered with a failure status (4xx or 5xx).
    #[error("Unable to download web page: server answered {status} ({reason})")]
    ServerFailure { status: u16, reason: FailureReason },

    /// The fetched resource is not an HTML document.
    ///
    /// No extraction is attempted on such responses.
    #[error("This resource is not a HTML document ({0})")]
    UnsupportedContentType(String),

    /// The server answered with a success status but no body.
    #[error("The server returned an empty body")]
    EmptyBody,

    /// Single-link resolution followed more hops than allowed.
    #[error("Too many single-link hops (limit {max_hops})")]
    TooManyHops { max_hops: usize },

    /// Single-link resolution came back to a page it already visited.
    #[error("Single-link resolution loops back to {0}")]
    RedirectLoop(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read and write errors.
    #[error("I/O error: {0}")]
    WriteError(#[from] std::io::Error),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Rule table file errors.
    ///
    /// Returned when parsing a `scraper(...)` / `rewrite(...)` rules file fails.
    #[error("Rule configuration error: {0}")]
    RuleConfigError(String),
}

impl ColligoError {
    /// Whether retrying the same request later could plausibly succeed.
    ///
    /// The core itself never retries; this is a hint for the scheduler.
    pub fn is_retryable(&self) -> bool {
        match self {
            #[cfg(feature = "fetch")]
            ColligoError::HttpError(e) => e.is_timeout() || e.is_connect(),
            ColligoError::Timeout { .. } => true,
            ColligoError::ServerFailure { reason, .. } => !reason.is_terminal(),
            _ => false,
        }
    }
}

/// Typed reason behind a failed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Unauthorized,
    Forbidden,
    NotFound,
    Gone,
    TooManyRequests,
    ServerError,
    Other(u16),
}

impl FailureReason {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => FailureReason::Unauthorized,
            403 => FailureReason::Forbidden,
            404 => FailureReason::NotFound,
            410 => FailureReason::Gone,
            429 => FailureReason::TooManyRequests,
            500..=599 => FailureReason::ServerError,
            other => FailureReason::Other(other),
        }
    }

    /// Terminal reasons are reported as non-retryable failures.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FailureReason::Other(_))
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::Unauthorized => write!(f, "unauthorized"),
            FailureReason::Forbidden => write!(f, "forbidden"),
            FailureReason::NotFound => write!(f, "not found"),
            FailureReason::Gone => write!(f, "gone"),
            FailureReason::TooManyRequests => write!(f, "too many requests"),
            FailureReason::ServerError => write!(f, "server error"),
            FailureReason::Other(code) => write!(f, "unexpected status {}", code),
        }
    }
}

/// Result type alias for ColligoError.
pub type Result<T> = std::result::Result<T, ColligoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ColligoError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = ColligoError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_failure_reason_classification() {
        assert_eq!(FailureReason::from_status(401), FailureReason::Unauthorized);
        assert_eq!(FailureReason::from_status(403), FailureReason::Forbidden);
        assert_eq!(FailureReason::from_status(404), FailureReason::NotFound);
        assert_eq!(FailureReason::from_status(410), FailureReason::Gone);
        assert_eq!(FailureReason::from_status(429), FailureReason::TooManyRequests);
        assert_eq!(FailureReason::from_status(503), FailureReason::ServerError);
        assert_eq!(FailureReason::from_status(418), FailureReason::Other(418));
    }

    #[test]
    fn test_terminal_failures_are_not_retryable() {
        let err = ColligoError::ServerFailure { status: 410, reason: FailureReason::Gone };
        assert!(!err.is_retryable());

        let err = ColligoError::ServerFailure { status: 418, reason: FailureReason::Other(418) };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unsupported_content_type_message() {
        let err = ColligoError::UnsupportedContentType("application/pdf".to_string());
        assert!(err.to_string().contains("application/pdf"));
    }
}
