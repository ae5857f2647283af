//! Records exchanged through JSONL files.
//!
//! The staging file bridges export and import: one [`StagingRecord`] per
//! line, `{"text": ..., "labels": ...}`, UTF-8 with no ASCII escaping.
//! Doccano hands annotated documents back as [`AnnotatedRecord`] lines.

use serde::{Deserialize, Serialize};

/// Texts whose trimmed length does not exceed this are never exported.
pub const MIN_TEXT_CHARS: usize = 10;

/// One line of the staging file.
///
/// `labels` is either a list of class names (`["positive"]`) or a list of
/// `[start, end, label]` spans, depending on the project type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRecord {
    pub text: String,
    pub labels: serde_json::Value,
}

impl StagingRecord {
    /// Whether `text` carries enough content to be worth annotating.
    #[must_use]
    pub fn is_exportable(text: &str) -> bool {
        text.trim().chars().count() > MIN_TEXT_CHARS
    }
}

/// One line of a Doccano JSONL download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub text: String,
    /// Doccano writes `labels` for sequence labeling and `label` for
    /// classification projects.
    #[serde(default, alias = "label")]
    pub labels: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

impl From<AnnotatedRecord> for StagingRecord {
    fn from(record: AnnotatedRecord) -> Self {
        Self {
            text: record.text,
            labels: record.labels,
        }
    }
}
