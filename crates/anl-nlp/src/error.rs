//! Toolkit error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    /// Reading or writing a model directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A model file could not be (de)serialized.
    #[error("Model file {path} is invalid: {source}")]
    Serde {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A tensor operation or a safetensors file failed.
    #[error("Tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// The pre-tokenizer rejected the input.
    #[error("Tokenizer error: {0}")]
    Tokenize(String),

    /// A weights file is missing a tensor or has the wrong shape.
    #[error("Weights in {path} are invalid: {message}")]
    Weights { path: String, message: String },

    /// The directory does not contain a `meta.json`.
    #[error("Not a model directory (no meta.json): {0}")]
    NotAModel(String),

    /// The pipeline already contains a component with this name.
    #[error("Pipeline already has a '{0}' component")]
    DuplicatePipe(String),

    /// `meta.json` names a component this toolkit does not provide.
    #[error("Unknown pipeline component '{0}'")]
    UnknownPipe(String),
}
