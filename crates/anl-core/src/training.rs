//! Training examples for the entity and sentiment models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::staging::AnnotatedRecord;

/// Positive sentiment category.
pub const POSITIVE: &str = "POSITIVE";

/// Negative sentiment category.
pub const NEGATIVE: &str = "NEGATIVE";

/// Category name to probability.
pub type Cats = BTreeMap<String, f64>;

/// An entity annotation with character offsets, end exclusive.
///
/// Serialized as a `[start, end, label]` triple, the shape Doccano uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize, String)", into = "(usize, usize, String)")]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl EntitySpan {
    #[must_use]
    pub fn new(start: usize, end: usize, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}

impl From<(usize, usize, String)> for EntitySpan {
    fn from((start, end, label): (usize, usize, String)) -> Self {
        Self { start, end, label }
    }
}

impl From<EntitySpan> for (usize, usize, String) {
    fn from(span: EntitySpan) -> Self {
        (span.start, span.end, span.label)
    }
}

/// Gold annotation attached to a training text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Annotation {
    Entities(Vec<EntitySpan>),
    Cats(Cats),
}

impl Annotation {
    /// Sentiment categories for a binary label: `1` is positive.
    #[must_use]
    pub fn sentiment(label: i64) -> Self {
        let positive = label == 1;
        let mut cats = Cats::new();
        cats.insert(POSITIVE.to_string(), if positive { 1.0 } else { 0.0 });
        cats.insert(NEGATIVE.to_string(), if positive { 0.0 } else { 1.0 });
        Self::Cats(cats)
    }

    #[must_use]
    pub fn entities(&self) -> &[EntitySpan] {
        match self {
            Self::Entities(spans) => spans,
            Self::Cats(_) => &[],
        }
    }

    #[must_use]
    pub const fn cats(&self) -> Option<&Cats> {
        match self {
            Self::Cats(cats) => Some(cats),
            Self::Entities(_) => None,
        }
    }
}

/// A `(text, annotation)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub annotation: Annotation,
}

impl TrainingExample {
    #[must_use]
    pub fn new(text: impl Into<String>, annotation: Annotation) -> Self {
        Self {
            text: text.into(),
            annotation,
        }
    }
}

impl TryFrom<AnnotatedRecord> for TrainingExample {
    type Error = CoreError;

    /// Interpret a Doccano sequence-labeling record as an entity example.
    ///
    /// A null label list is treated as "no entities".
    fn try_from(record: AnnotatedRecord) -> Result<Self, Self::Error> {
        let spans: Vec<EntitySpan> = if record.labels.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(record.labels).map_err(|e| {
                CoreError::InvalidAnnotation(format!("expected [start, end, label] spans: {e}"))
            })?
        };

        let length = record.text.chars().count();
        if let Some(bad) = spans.iter().find(|s| s.start >= s.end || s.end > length) {
            return Err(CoreError::InvalidAnnotation(format!(
                "span [{}, {}, {}] out of bounds for text of {length} characters",
                bad.start, bad.end, bad.label
            )));
        }

        Ok(Self::new(record.text, Annotation::Entities(spans)))
    }
}
