//! IDOL client error types.

use thiserror::Error;

/// Errors that can occur when talking to IDOL.
#[derive(Debug, Error)]
pub enum IdolError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IDOL returned a non-success HTTP status code.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// An ACI action answered with `response != SUCCESS`.
    #[error("ACI {action} failed: {message}")]
    Aci { action: String, message: String },

    /// An index command was not acknowledged with an `INDEXID`.
    #[error("index command {command} failed: {message}")]
    Index { command: String, message: String },

    /// Failed to parse an IDOL response.
    #[error("parse error: {0}")]
    Parse(String),
}
