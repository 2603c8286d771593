//! BuyLocal API client library
//!
//! This crate provides the request layer shared by every BuyLocal screen:
//! the configured HTTP client, the session token accessor, the test-mode
//! switch, envelope normalization, and the request descriptor invoker.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod descriptor;
pub mod envelope;
pub mod http;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigSource, EnvConfig, StaticConfig, TestModeSwitch};
pub use descriptor::{ApiContext, Clock, FixedClock, MockEnv, RequestDescriptor, Strategy, SystemClock};
pub use envelope::Envelope;
pub use http::{ApiClient, ApiClientConfig, ApiRequest, HttpMethod, HttpTransport, RawResponse};
pub use session::{Session, SessionHandle, SessionWriter};

use std::fmt;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Class of network failure, i.e. no response was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    /// The request exceeded the configured timeout
    Timeout,
    /// The connection could not be established
    Connect,
    /// Any other transport failure
    Other,
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NetworkErrorKind::Timeout => "timeout",
            NetworkErrorKind::Connect => "connect",
            NetworkErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Error types for API operations
///
/// Descriptors propagate these unchanged; translating them into a
/// user-facing message is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response was received
    #[error("Network error ({kind}): {message}")]
    Network {
        /// Failure class
        kind: NetworkErrorKind,
        /// Transport message
        message: String,
    },

    /// The server responded with a non-2xx status
    #[error("HTTP error {status_code}")]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Raw response body
        body: String,
    },

    /// The response lacked a required field or was not valid JSON
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A descriptor precondition failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Client configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request body could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl ApiError {
    /// Create a network error
    pub fn network(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        ApiError::Network { kind, message: message.into() }
    }

    /// Create an HTTP status error
    pub fn http(status_code: u16, body: impl Into<String>) -> Self {
        ApiError::Http { status_code, body: body.into() }
    }

    /// Create a malformed response error
    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::MalformedResponse(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    /// HTTP status code, if the server responded
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Check whether no response was received
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}
