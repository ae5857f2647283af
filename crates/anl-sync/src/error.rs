use anl_config::ConfigError;
use anl_core::errors::CoreError;
use anl_doccano::DoccanoError;
use anl_idol::IdolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Doccano: {0}")]
    Doccano(#[from] DoccanoError),

    #[error("IDOL: {0}")]
    Idol(#[from] IdolError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// An operation needs IDOL but no `[idol]` section is configured.
    #[error("IDOL is not configured (set [idol] aci_url)")]
    NoIndex,

    /// Export would move documents without a destination database.
    #[error("Project '{0}' has no IDOL database to move exported documents into")]
    NoDatabase(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A downloaded JSONL line could not be parsed.
    #[error("Invalid line {line} in Doccano download: {source}")]
    Download {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl SyncError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
