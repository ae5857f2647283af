use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Training commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TrainCommands {
    /// Train the entity recognizer on Doccano JSONL.
    Ner(NerArgs),
    /// Train the sentiment categorizer on labeled CSV.
    Sentiment(SentimentArgs),
}

#[derive(Clone, Debug, Args)]
pub struct NerArgs {
    /// Training data (defaults to training.ner_data)
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Existing model directory to continue from
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Where to save the trained model
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,
    /// Seed for shuffling and dropout
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, Args)]
pub struct SentimentArgs {
    /// Training data (defaults to training.sentiment_data)
    #[arg(long)]
    pub data: Option<PathBuf>,
    /// Existing model directory to continue from
    #[arg(long)]
    pub model: Option<PathBuf>,
    /// Where to save the trained model
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long, default_value_t = 20)]
    pub iterations: usize,
    /// Maximum number of training texts
    #[arg(long, default_value_t = 2000)]
    pub texts: usize,
    /// Keep only the last N shuffled rows (0 keeps all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Text to classify after training
    #[arg(long)]
    pub test_text: Option<String>,
    /// Seed for shuffling and dropout
    #[arg(long)]
    pub seed: Option<u64>,
}
