//! Annotation project definitions.
//!
//! A [`Project`] starts life from configuration with only its name, queries
//! and field mappings. Resolving it against Doccano fills in the numeric
//! `id` and `project_type`; until then it cannot be uploaded to or
//! downloaded from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::query::QuerySpec;

/// Default IDOL field holding the document text.
pub const DEFAULT_TEXT_FIELD: &str = "DRECONTENT";

/// Default IDOL field holding the JSON-encoded labels.
pub const DEFAULT_LABEL_FIELD: &str = "LABELS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Doccano project name; matched exactly after trimming.
    pub name: String,

    /// Doccano project id, set by resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Doccano project type (e.g. `SequenceLabeling`), set by resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,

    /// IDOL queries selecting documents to export.
    #[serde(default)]
    pub queries: Vec<QuerySpec>,

    /// IDOL field holding the document text.
    #[serde(default = "default_text_field")]
    pub textfield: String,

    /// IDOL field holding the JSON-encoded labels.
    #[serde(default = "default_label_field")]
    pub datafield: String,

    /// IDOL database that exported documents are moved into.
    #[serde(default)]
    pub database: String,

    /// Staging file name override. Defaults to `{name}.tmp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempfile: Option<String>,
}

fn default_text_field() -> String {
    DEFAULT_TEXT_FIELD.to_string()
}

fn default_label_field() -> String {
    DEFAULT_LABEL_FIELD.to_string()
}

impl Project {
    /// A project with default field mappings and no queries.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            project_type: None,
            queries: Vec::new(),
            textfield: default_text_field(),
            datafield: default_label_field(),
            database: String::new(),
            tempfile: None,
        }
    }

    /// Name used for lookups against Doccano.
    #[must_use]
    pub fn lookup_name(&self) -> &str {
        self.name.trim()
    }

    /// Whether the project has been matched to a Doccano project.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.id.is_some()
    }

    /// File name of the JSONL staging file.
    #[must_use]
    pub fn staging_file_name(&self) -> String {
        self.tempfile
            .clone()
            .unwrap_or_else(|| format!("{}.tmp", self.name))
    }

    /// Full path of the staging file inside `folder`.
    #[must_use]
    pub fn staging_path(&self, folder: &Path) -> PathBuf {
        folder.join(self.staging_file_name())
    }

    /// Full path of the downloaded annotations inside `folder`.
    #[must_use]
    pub fn annotated_path(&self, folder: &Path) -> PathBuf {
        folder.join(format!("{}.annotated.jsonl", self.lookup_name()))
    }
}
