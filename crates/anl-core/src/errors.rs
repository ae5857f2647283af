//! Cross-cutting error types for annoloop.
//!
//! Client- and toolkit-specific errors (`DoccanoError`, `IdolError`,
//! `NlpError`) live in their own crates. They converge into `anyhow` in
//! `anl-cli`.

use thiserror::Error;

/// Errors that can be raised by any annoloop crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A label field held something that is not valid JSON.
    #[error("Invalid label JSON for document {reference}: {source}")]
    InvalidLabels {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    /// An annotation did not have the expected shape.
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
