//! General application configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default runtime worker count.
const fn default_threads() -> usize {
    2
}

/// Default staging folder.
fn default_tempfolder() -> PathBuf {
    PathBuf::from("data")
}

/// Default HTTP request timeout in seconds.
const fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Worker threads for the async runtime.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Folder holding staging and downloaded JSONL files.
    #[serde(default = "default_tempfolder")]
    pub tempfolder: PathBuf,

    /// Timeout applied to every Doccano and IDOL request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            tempfolder: default_tempfolder(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeneralConfig {
    /// Worker count, never below one.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.threads.max(1)
    }
}
