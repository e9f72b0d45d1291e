//! Error types for the Ontraport client.
//!
//! # Design
//! Validation failures are raised before any request is built, so a caller
//! matching on `Validation` knows nothing was sent. The remote service
//! reports its own failures inside a 200 body, which is why there is no
//! status-code variant: the raw body is handed back and `Parse` only fires
//! when the caller asks for it to be read as XML.

use thiserror::Error;

/// Errors returned by `OntraportClient` and the payload builders.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required argument was missing or malformed. No request was sent.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// The HTTP round-trip itself failed (DNS, TLS, connection, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body is not well-formed XML.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Client configuration could not be assembled.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}
