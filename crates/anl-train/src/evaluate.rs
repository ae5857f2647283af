//! Precision/recall/F1 for the sentiment categorizer.

use anl_core::training::{Cats, NEGATIVE};
use anl_nlp::{Language, NlpError};
use serde::Serialize;

const THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scores {
    pub precision: f64,
    pub recall: f64,
    pub f_score: f64,
}

impl Scores {
    /// Scores from raw counts. Precision and recall start from `1e-8` false
    /// positives/negatives so empty counts do not divide by zero.
    #[must_use]
    pub fn from_counts(tp: f64, fp: f64, fn_: f64) -> Self {
        let precision = tp / (tp + fp + 1e-8);
        let recall = tp / (tp + fn_ + 1e-8);
        let f_score = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * (precision * recall) / (precision + recall)
        };
        Self {
            precision,
            recall,
            f_score,
        }
    }
}

/// Compare predicted categories with `gold` for every text.
///
/// Only labels present in the gold map count, and `NEGATIVE` is ignored, so
/// the score reflects the positive class.
///
/// # Errors
///
/// Returns toolkit errors from annotating a text.
pub fn evaluate(nlp: &Language, texts: &[String], gold: &[Cats]) -> Result<Scores, NlpError> {
    let (mut tp, mut fp, mut fn_) = (0.0, 0.0, 0.0);

    for (text, gold) in texts.iter().zip(gold) {
        let doc = nlp.annotate(text)?;
        for (label, score) in &doc.cats {
            if label == NEGATIVE {
                continue;
            }
            let Some(&truth) = gold.get(label) else {
                continue;
            };
            match (*score >= THRESHOLD, truth >= THRESHOLD) {
                (true, true) => tp += 1.0,
                (true, false) => fp += 1.0,
                (false, true) => fn_ += 1.0,
                (false, false) => {}
            }
        }
    }

    Ok(Scores::from_counts(tp, fp, fn_))
}
