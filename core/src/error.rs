//! Error type for the dispatcher.
//!
//! # Design
//! A failed HTTP exchange has a single error type, `TransportError`. The
//! variants only say where the exchange broke; callers that just want to
//! know "did it work" match on `Err(_)`, callers that care about the status
//! use `TransportError::status`.

use thiserror::Error;

/// Errors returned by `Dispatcher::dispatch` and `Transport::execute`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection, IO or timeout fault reported by the transport.
    #[error("network error: {0}")]
    Network(String),

    /// The URL, method or a header could not form a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request body or query string could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A 2xx response body could not be decoded as the expected JSON.
    #[error("decoding failed: {0}")]
    Decode(String),
}

impl TransportError {
    /// HTTP status code of the failed exchange, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<serde_urlencoded::ser::Error> for TransportError {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        TransportError::Serialization(err.to_string())
    }
}
