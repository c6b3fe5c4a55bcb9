//! Error types for the short-link API client.
//!
//! # Design
//! Three failure sources exist at the HTTP boundary: the request never
//! completed (`Transport`), the server answered with an application error
//! (`Server`), or the body could not be understood (`Malformed`). The service
//! layer collapses all of them into a single message string; the variants
//! stay distinct here so tests and hosts can still tell them apart.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Connectivity failure: no response was received.
    #[error("failed to connect to server: {0}")]
    Transport(String),

    /// The server reported an error, either with a non-2xx status or with
    /// `success:false` in the envelope.
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body was not JSON or did not have the expected shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Message shown to the user for this failure.
    ///
    /// Server-provided messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Server { status: 404, .. })
    }
}
