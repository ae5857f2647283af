//! Results of sync operations, printed as JSON by `anl`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of `anl export`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub project: String,
    pub file: PathBuf,
    pub queries: usize,
    pub records_written: usize,
    pub references_moved: usize,
}

/// Result of `anl import`.
///
/// Every variant except `Uploaded` leaves the staging file on disk so the
/// upload can be retried by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// The project name did not match any Doccano project.
    ProjectNotFound { project: String },
    /// There was no staging file to upload.
    MissingFile { file: PathBuf },
    /// Doccano accepted the file; the local copy was removed.
    Uploaded {
        project_id: u64,
        file: PathBuf,
        status: u16,
    },
    /// Doccano answered with a non-2xx status; the local copy was kept.
    Rejected {
        project_id: u64,
        file: PathBuf,
        status: u16,
    },
}

impl ImportOutcome {
    #[must_use]
    pub const fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Result of `anl push`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSummary {
    pub export: ExportSummary,
    pub import: ImportOutcome,
}

/// Result of `anl pull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PullOutcome {
    ProjectNotFound {
        project: String,
    },
    Downloaded {
        project_id: u64,
        file: PathBuf,
        records: usize,
        /// Documents indexed back into IDOL, when requested.
        indexed: usize,
    },
}

/// Result of `anl project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResolution {
    pub name: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
}
