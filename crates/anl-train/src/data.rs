//! Training data loaders.

use std::path::Path;

use anl_core::staging::AnnotatedRecord;
use anl_core::training::{Annotation, Cats, TrainingExample};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::TrainError;

/// Fraction of sentiment rows used for training; the rest is the dev split.
pub const DEFAULT_SPLIT: f64 = 0.8;

/// One `(text, label)` row from a four-column CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledText {
    pub text: String,
    pub label: i64,
}

/// Sentiment examples split into training and evaluation sets.
#[derive(Debug, Clone, Default)]
pub struct SentimentData {
    pub train: Vec<TrainingExample>,
    pub dev_texts: Vec<String>,
    pub dev_cats: Vec<Cats>,
}

/// Read a headerless CSV whose third column is an integer label and whose
/// fourth column is the text. Spaces after a delimiter are skipped.
///
/// # Errors
///
/// Returns [`TrainError::Io`] when the file cannot be read,
/// [`TrainError::Csv`] for malformed CSV and
/// [`TrainError::InvalidRow`] for short rows or non-integer labels.
pub fn load_labeled_csv(path: &Path) -> Result<Vec<LabeledText>, TrainError> {
    let raw = std::fs::read_to_string(path).map_err(|source| TrainError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let records = read_records(&raw).map_err(|source| TrainError::Csv {
        path: path.display().to_string(),
        source,
    })?;

    let mut rows = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let invalid = |message: String| TrainError::InvalidRow {
            path: path.display().to_string(),
            row: idx + 1,
            message,
        };
        let (Some(label), Some(text)) = (record.get(2), record.get(3)) else {
            return Err(invalid(format!(
                "expected at least 4 columns, found {}",
                record.len()
            )));
        };
        let label = label
            .parse::<i64>()
            .map_err(|e| invalid(format!("label '{label}' is not an integer: {e}")))?;
        rows.push(LabeledText {
            text: text.to_string(),
            label,
        });
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded labeled CSV");
    Ok(rows)
}

/// Parse headerless, ragged CSV after [`skip_initial_space`].
fn read_records(raw: &str) -> Result<Vec<csv::StringRecord>, csv::Error> {
    let normalized = skip_initial_space(raw);
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote(b'"')
        .from_reader(normalized.as_bytes())
        .records()
        .collect()
}

/// Drop spaces that follow a delimiter outside quotes, so `1, "a, b"` parses
/// as a quoted field.
///
/// A quote opens a quoted field only as the field's first character; inside
/// one, `""` is an escaped quote and any other `"` closes it.
fn skip_initial_space(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    out.push('"');
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        if field_start && c == ' ' {
            out.pop();
            continue;
        }
        in_quotes = field_start && c == '"';
        field_start = c == ',' || c == '\n';
    }
    out
}

/// Load sentiment rows, shuffle them, keep the last `limit` (`0` keeps all)
/// and split at `split`.
///
/// # Errors
///
/// Propagates [`load_labeled_csv`] errors; returns [`TrainError::Empty`]
/// when the file has no rows.
pub fn load_sentiment_data<R: Rng + ?Sized>(
    path: &Path,
    limit: usize,
    split: f64,
    rng: &mut R,
) -> Result<SentimentData, TrainError> {
    let mut rows = load_labeled_csv(path)?;
    if rows.is_empty() {
        return Err(TrainError::Empty(path.display().to_string()));
    }
    rows.shuffle(rng);
    if limit > 0 && limit < rows.len() {
        rows.drain(..rows.len() - limit);
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let cut = ((rows.len() as f64) * split.clamp(0.0, 1.0)) as usize;
    let dev = rows.split_off(cut);

    let mut data = SentimentData {
        train: rows
            .into_iter()
            .map(|row| TrainingExample::new(row.text, Annotation::sentiment(row.label)))
            .collect(),
        ..SentimentData::default()
    };
    for row in dev {
        if let Annotation::Cats(cats) = Annotation::sentiment(row.label) {
            data.dev_cats.push(cats);
            data.dev_texts.push(row.text);
        }
    }
    Ok(data)
}

/// Load entity examples from Doccano JSONL (`labels` as `[start, end, label]`).
///
/// # Errors
///
/// Returns [`TrainError::Io`] for unreadable or malformed lines and
/// [`TrainError::Core`] for labels that are not valid spans.
pub fn load_entity_data(path: &Path) -> Result<Vec<TrainingExample>, TrainError> {
    let io_error = |source| TrainError::Io {
        path: path.display().to_string(),
        source,
    };
    let records: Vec<AnnotatedRecord> = serde_jsonlines::json_lines(path)
        .map_err(io_error)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_error)?;

    let examples = records
        .into_iter()
        .map(TrainingExample::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(path = %path.display(), examples = examples.len(), "loaded entity data");
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn skips_spaces_after_delimiters_only() {
        assert_eq!(
            skip_initial_space("1,  2, \"a, b\"\n 3,x y"),
            "1,2,\"a, b\"\n3,x y"
        );
    }

    #[test]
    fn keeps_spaces_inside_quotes() {
        assert_eq!(skip_initial_space("\"a,  b\", c"), "\"a,  b\",c");
    }

    fn rows(raw: &str) -> Vec<Vec<String>> {
        read_records(raw)
            .unwrap()
            .iter()
            .map(|record| record.iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        assert_eq!(
            rows("0, 1, 1, 5\" screen is great\n1, 2, 0, \"bad, really\"\n"),
            vec![
                vec!["0", "1", "1", "5\" screen is great"],
                vec!["1", "2", "0", "bad, really"],
            ]
        );
    }

    #[test]
    fn doubled_quote_does_not_close_a_quoted_field() {
        assert_eq!(
            rows("1, 2, 1, \"a \"\"b\"\", c\", d\n"),
            vec![vec!["1", "2", "1", "a \"b\", c", "d"]]
        );
    }
}
