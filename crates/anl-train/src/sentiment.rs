//! Sentiment text categorizer training loop.

use std::path::PathBuf;

use anl_core::training::{Cats, NEGATIVE, POSITIVE};
use anl_nlp::{Language, Losses, TEXTCAT, compounding, minibatch};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::data::SentimentData;
use crate::error::TrainError;
use crate::evaluate::{Scores, evaluate};
use crate::{load_or_blank, other_pipes};

/// Text classified after training.
pub const DEFAULT_TEST_TEXT: &str = "Aggressive treatment against covid war in all countries";

#[derive(Debug, Clone)]
pub struct SentimentOptions {
    pub model: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub n_iter: usize,
    /// Maximum number of training texts.
    pub n_texts: usize,
    pub drop: f64,
    pub test_text: String,
}

impl Default for SentimentOptions {
    fn default() -> Self {
        Self {
            model: None,
            output_dir: None,
            n_iter: 20,
            n_texts: 2000,
            drop: 0.2,
            test_text: DEFAULT_TEST_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochScores {
    pub loss: f64,
    #[serde(flatten)]
    pub scores: Scores,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentimentReport {
    pub train_examples: usize,
    pub dev_examples: usize,
    pub epochs: Vec<EpochScores>,
    pub test_text: String,
    pub test_cats: Cats,
    pub saved_to: Option<PathBuf>,
    pub reloaded_cats: Option<Cats>,
}

/// Train the exclusive `textcat` pipe on `data` and score each epoch on the
/// dev split using averaged weights.
///
/// # Errors
///
/// Returns toolkit errors from loading, training or saving the model.
pub fn train_sentiment<R: Rng + ?Sized>(
    data: SentimentData,
    options: &SentimentOptions,
    rng: &mut R,
) -> Result<SentimentReport, TrainError> {
    let mut nlp = load_or_blank(options.model.as_deref())?;
    if !nlp.has_pipe(TEXTCAT) {
        nlp.add_pipe(TEXTCAT)?;
    }
    let textcat = nlp.textcat_mut().ok_or(TrainError::MissingPipe(TEXTCAT))?;
    textcat.add_label(POSITIVE)?;
    textcat.add_label(NEGATIVE)?;

    let SentimentData {
        mut train,
        dev_texts,
        dev_cats,
    } = data;
    train.truncate(options.n_texts);
    tracing::info!(
        "Using {} examples ({} training, {} evaluation)",
        options.n_texts,
        train.len(),
        dev_texts.len()
    );

    let others = other_pipes(&nlp, TEXTCAT);
    let others: Vec<&str> = others.iter().map(String::as_str).collect();

    let epochs = nlp.with_disabled(&others, |nlp| -> Result<_, TrainError> {
        nlp.begin_training()?;
        tracing::info!("Training the model...");
        tracing::info!("{:^5}\t{:^5}\t{:^5}\t{:^5}", "LOSS", "P", "R", "F");

        let mut batch_sizes = compounding(4.0, 32.0, 1.001);
        let mut epochs = Vec::with_capacity(options.n_iter);
        for _ in 0..options.n_iter {
            let mut losses = Losses::new();
            train.shuffle(rng);
            for batch in minibatch(&train, batch_sizes.by_ref()) {
                nlp.update(batch, options.drop, &mut losses, rng)?;
            }
            let scores = evaluate(&nlp.averaged()?, &dev_texts, &dev_cats)?;
            let loss = losses.get(TEXTCAT).copied().unwrap_or(0.0);
            tracing::info!(
                "{:.3}\t{:.3}\t{:.3}\t{:.3}",
                loss,
                scores.precision,
                scores.recall,
                scores.f_score
            );
            epochs.push(EpochScores { loss, scores });
        }
        Ok(epochs)
    })?;

    let test_cats = nlp.annotate(&options.test_text)?.cats;
    tracing::info!(text = %options.test_text, cats = ?test_cats, "classified test text");

    let mut reloaded_cats = None;
    if let Some(dir) = &options.output_dir {
        nlp.averaged()?.to_disk(dir)?;
        tracing::info!(dir = %dir.display(), "Saved model");

        tracing::info!(dir = %dir.display(), "Loading saved model");
        let nlp2 = Language::load(dir)?;
        let cats = nlp2.annotate(&options.test_text)?.cats;
        tracing::info!(text = %options.test_text, ?cats, "classified test text with saved model");
        reloaded_cats = Some(cats);
    }

    Ok(SentimentReport {
        train_examples: train.len(),
        dev_examples: dev_texts.len(),
        epochs,
        test_text: options.test_text.clone(),
        test_cats,
        saved_to: options.output_dir.clone(),
        reloaded_cats,
    })
}
