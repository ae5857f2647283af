//! IDOL query definitions.
//!
//! A [`QuerySpec`] is what the user configures per project. A [`QueryRecord`]
//! is the ephemeral request built from it for one export run: the configured
//! field text is narrowed so that only documents without a label field match.

use serde::{Deserialize, Serialize};

/// A configured IDOL query for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Free-text query (`Text` parameter). `*` matches everything.
    #[serde(default = "default_query_text")]
    pub text: String,

    /// Optional field restriction expression (`FieldText` parameter).
    #[serde(default)]
    pub fieldtext: String,
}

fn default_query_text() -> String {
    "*".to_string()
}

/// How much of each hit IDOL should return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintMode {
    /// Return every field of the document.
    #[default]
    All,
    /// Return only the fields IDOL is configured to print.
    Fields,
    /// Return no document content.
    None,
}

impl PrintMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Fields => "fields",
            Self::None => "none",
        }
    }
}

/// A single query request sent to IDOL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRecord {
    pub text: String,
    pub fieldtext: String,
    pub print: PrintMode,
}

impl QueryRecord {
    /// Build a query that only matches documents missing `label_field`.
    ///
    /// A configured field text longer than one character is combined with the
    /// `NOT EXISTS` filter; anything shorter is replaced by it.
    #[must_use]
    pub fn unlabeled(spec: &QuerySpec, label_field: &str) -> Self {
        let filter = format!("NOT EXISTS{{}}:{label_field}");
        let fieldtext = if spec.fieldtext.chars().count() > 1 {
            format!("({}) AND ({filter})", spec.fieldtext)
        } else {
            filter
        };

        Self {
            text: spec.text.clone(),
            fieldtext,
            print: PrintMode::All,
        }
    }
}
