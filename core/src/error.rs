//! Error types for the curlish client.
//!
//! # Design
//! Construction and configuration failures are `RequestError`s returned to
//! the caller. Failures while a request is on the wire (DNS, refused
//! connection, timeout) are not errors here: the transport reports them
//! in-band and they surface through `ResponseSnapshot::error_code`.

use thiserror::Error;

use crate::option::OptionKey;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Code reported when a transport rejects an option.
pub const OPTION_REJECTED_CODE: u32 = 99101;

/// Code reported when no transport handle is available.
pub const NOT_INITIALIZED_CODE: u32 = 99102;

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The transport handle could not be acquired. The client never existed.
    #[error("transport init failed: {0}")]
    TransportInit(#[from] TransportError),

    /// A configuration call was refused by the transport.
    #[error("option {option} rejected by transport (code {code}): {message}")]
    OptionRejected {
        option: OptionKey,
        code: i32,
        message: String,
    },

    /// The client was closed, or its handle was never acquired.
    #[error("transport not initialized")]
    NotInitialized,

    /// Form fields could not be URL-encoded.
    #[error("form encoding failed: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    /// A JSON payload could not be serialized.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
}

impl RequestError {
    /// Stable numeric code for the client-level failures.
    pub fn code(&self) -> Option<u32> {
        match self {
            RequestError::OptionRejected { .. } => Some(OPTION_REJECTED_CODE),
            RequestError::TransportInit(_) | RequestError::NotInitialized => {
                Some(NOT_INITIALIZED_CODE)
            }
            _ => None,
        }
    }
}

/// Why a transport could not hand out a handle.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("transport resources exhausted: {0}")]
    Exhausted(String),
}

/// Diagnostic returned by a transport that refuses an option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct OptionError {
    pub code: i32,
    pub message: String,
}

impl OptionError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
