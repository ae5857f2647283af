//! Default inputs for the training commands.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_ner_data() -> PathBuf {
    PathBuf::from("data/entity.jsonl")
}

fn default_sentiment_data() -> PathBuf {
    PathBuf::from("data/sentiment.csv")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingConfig {
    /// Doccano JSONL export used by `anl train ner`.
    #[serde(default = "default_ner_data")]
    pub ner_data: PathBuf,

    /// Four-column CSV used by `anl train sentiment`.
    #[serde(default = "default_sentiment_data")]
    pub sentiment_data: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            ner_data: default_ner_data(),
            sentiment_data: default_sentiment_data(),
        }
    }
}
