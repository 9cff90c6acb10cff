//! Error types for the fine-tuning runner.
//!
//! Provides the error taxonomy covering API failures, transport failures,
//! dataset validation failures, and polling-deadline expiry.

use std::time::Duration;
use thiserror::Error;

use crate::types::fine_tuning::JobStatus;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Error type for runner operations.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Configuration error (invalid API key, base URL, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Authentication error (invalid or missing API key).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message from the API.
        message: String,
    },

    /// Permission denied (insufficient access rights).
    #[error("Permission denied: {message}")]
    Permission {
        /// Error message describing the permission issue.
        message: String,
    },

    /// Bad request (invalid request parameters).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message describing the validation issue.
        message: String,
        /// The type of error.
        error_type: Option<String>,
        /// The parameter that caused the error.
        param: Option<String>,
        /// Error code from the API.
        code: Option<String>,
    },

    /// Request validation failed server-side.
    #[error("Validation error: {message}")]
    Validation {
        /// Error message describing the validation issue.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Error message.
        message: String,
        /// The type of resource that was not found.
        resource: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message.
        message: String,
        /// Duration to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Internal server error.
    #[error("Internal server error: {message}")]
    Internal {
        /// Error message.
        message: String,
        /// Request ID for debugging.
        request_id: Option<String>,
    },

    /// Bad gateway error.
    #[error("Bad gateway: {message}")]
    BadGateway {
        /// Error message.
        message: String,
    },

    /// Service unavailable.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message.
        message: String,
        /// Duration to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Gateway timeout.
    #[error("Gateway timeout: {message}")]
    GatewayTimeout {
        /// Error message.
        message: String,
    },

    /// Request timeout.
    #[error("Request timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// Network/connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Deserialization error with the offending body.
    #[error("Deserialization error: {message}")]
    Deserialization {
        /// Error message.
        message: String,
        /// The response body that failed to parse.
        body: String,
    },

    /// Dataset validation failed (no usable records).
    #[error("Dataset validation failed: {message}")]
    Dataset {
        /// Error message describing the dataset issue.
        message: String,
    },

    /// Polling deadline exceeded before the job reached a terminal status.
    #[error("Polling deadline exceeded after {elapsed:?} (last observed status: {last_status:?})")]
    PollDeadline {
        /// Total time spent polling.
        elapsed: Duration,
        /// The last status observed, or `None` if no fetch ever succeeded.
        last_status: Option<JobStatus>,
    },

    /// Local I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
    },

    /// Unknown error.
    #[error("Unknown error (HTTP {status}): {message}")]
    Unknown {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Raw response body.
        body: Option<String>,
    },
}

/// API error response body.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The error details.
    pub error: ApiErrorDetail,
}

/// Detailed API error information.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// The error type.
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    /// The error message.
    pub message: String,
    /// The parameter that caused the error.
    pub param: Option<String>,
    /// The error code.
    pub code: Option<String>,
}

impl From<reqwest::Error> for RunnerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RunnerError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_connect() {
            RunnerError::Connection {
                message: err.to_string(),
            }
        } else {
            RunnerError::Unknown {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
                body: None,
            }
        }
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(err: serde_json::Error) -> Self {
        RunnerError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for RunnerError {
    fn from(err: url::ParseError) -> Self {
        RunnerError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::Io {
            message: err.to_string(),
        }
    }
}
