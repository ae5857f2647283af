//! Doccano client error types.

use thiserror::Error;

/// Errors that can occur when talking to Doccano.
#[derive(Debug, Error)]
pub enum DoccanoError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Doccano returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by Doccano.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Failed to parse a Doccano response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The login response did not contain a token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Reading a file to upload failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
