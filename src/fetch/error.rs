//! Error types surfaced by the fetch layer

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a `Transport` for a single attempt
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not valid JSON
    #[error("Invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Any other connection-level failure
    #[error("{0}")]
    Other(String),
}

/// Errors returned to callers of `ResilientClient::fetch`
///
/// Callers receive exactly one of these per logical request, carrying the last
/// failure observed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure on the last attempt
    #[error("Network error: {0}")]
    Network(#[source] TransportError),

    /// Server answered with a non-success status on the last attempt
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The shared deadline for the whole call elapsed
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The caller aborted the request
    #[error("Request to {url} was aborted")]
    Aborted { url: String },

    /// The body did not match the requested type
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A spawned batch task ended without producing a result
    #[error("Batch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        FetchError::Network(err)
    }
}

impl FetchError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for errors that stop the attempt loop outright
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FetchError::Timeout { .. }
                | FetchError::Aborted { .. }
                | FetchError::Decode(_)
                | FetchError::Join(_)
        )
    }
}
