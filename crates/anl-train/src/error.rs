use anl_core::errors::CoreError;
use anl_nlp::NlpError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid row {row} in {path}: {message}")]
    InvalidRow {
        path: String,
        row: usize,
        message: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No training examples in {0}")]
    Empty(String),

    #[error("Pipeline has no '{0}' component")]
    MissingPipe(&'static str),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Nlp(#[from] NlpError),
}
