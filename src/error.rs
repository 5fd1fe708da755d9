//! Error types for the request pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error body returned by the chat API for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Server specific error code
    pub code: i64,
    /// Human readable message
    pub message: String,
    /// HTTP status code echoed by the server
    #[serde(rename = "StatusCode")]
    pub status_code: u16,
}

impl ErrorPayload {
    /// Codes the server uses for an invalid, expired or unparsable token.
    pub const TOKEN_INVALID_CODES: std::ops::RangeInclusive<i64> = 40..=42;

    /// Check if the server rejected the user token
    pub fn is_token_invalid(&self) -> bool {
        Self::TOKEN_INVALID_CODES.contains(&self.code)
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (code: {}, status: {})",
            self.message, self.code, self.status_code
        )
    }
}

/// Main error type for the request pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Missing connection id: {message}")]
    MissingConnectionId { message: String },

    #[error("Transport error (status: {status:?}): {message}")]
    Transport { status: Option<u16>, message: String },

    #[error("Server error: {0}")]
    Server(ErrorPayload),

    #[error("Decoding error: {message}")]
    Decoding { message: String },

    #[error("Empty response body: {message}")]
    EmptyBody { message: String },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Request cancelled: {message}")]
    Cancelled { message: String },
}

impl ClientError {
    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: msg.into(),
        }
    }

    pub fn invalid_json(msg: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: msg.into(),
        }
    }

    pub fn missing_connection_id(msg: impl Into<String>) -> Self {
        Self::MissingConnectionId {
            message: msg.into(),
        }
    }

    pub fn transport(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: msg.into(),
        }
    }

    pub fn decoding(msg: impl Into<String>) -> Self {
        Self::Decoding {
            message: msg.into(),
        }
    }

    pub fn empty_body(msg: impl Into<String>) -> Self {
        Self::EmptyBody {
            message: msg.into(),
        }
    }

    pub fn unexpected_response(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled {
            message: msg.into(),
        }
    }

    /// Check if the error was produced before anything hit the network
    pub fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::InvalidJson { .. } | Self::MissingConnectionId { .. }
        )
    }

    /// The server error payload, if the API rejected the request
    pub fn server_payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Server(payload) => Some(payload),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_json(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_url(err.to_string())
    }
}
