//! # anl-train
//!
//! Training loops for the entity recognizer and the sentiment categorizer,
//! plus the CSV/JSONL loaders that feed them.

pub mod data;
pub mod error;
pub mod evaluate;
pub mod ner;
pub mod sentiment;

use std::path::Path;

use anl_nlp::Language;

pub use data::{
    DEFAULT_SPLIT, LabeledText, SentimentData, load_entity_data, load_labeled_csv,
    load_sentiment_data,
};
pub use error::TrainError;
pub use evaluate::{Scores, evaluate};
pub use ner::{NerOptions, NerReport, Prediction, train_ner};
pub use sentiment::{
    DEFAULT_TEST_TEXT, EpochScores, SentimentOptions, SentimentReport, train_sentiment,
};

fn load_or_blank(model: Option<&Path>) -> Result<Language, TrainError> {
    if let Some(dir) = model {
        let nlp = Language::load(dir)?;
        tracing::info!(model = %dir.display(), "Loaded model");
        Ok(nlp)
    } else {
        tracing::info!("Created blank 'en' model");
        Ok(Language::blank("en"))
    }
}

/// Every pipe except `keep`, to be disabled while `keep` trains.
fn other_pipes(nlp: &Language, keep: &str) -> Vec<String> {
    nlp.pipe_names()
        .into_iter()
        .filter(|name| *name != keep)
        .map(ToString::to_string)
        .collect()
}
