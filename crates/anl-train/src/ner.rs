//! Entity recognizer training loop.

use std::path::PathBuf;

use anl_core::training::TrainingExample;
use anl_nlp::{Entity, Language, Losses, NER, compounding, minibatch};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::error::TrainError;
use crate::{load_or_blank, other_pipes};

#[derive(Debug, Clone)]
pub struct NerOptions {
    /// Existing model directory; a blank `en` pipeline when `None`.
    pub model: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub n_iter: usize,
    pub drop: f64,
}

impl Default for NerOptions {
    fn default() -> Self {
        Self {
            model: None,
            output_dir: None,
            n_iter: 100,
            drop: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub text: String,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NerReport {
    pub examples: usize,
    pub labels: Vec<String>,
    /// Loss per pipe for every epoch.
    pub losses: Vec<Losses>,
    pub predictions: Vec<Prediction>,
    pub saved_to: Option<PathBuf>,
    /// Predictions of the model reloaded from `saved_to`.
    pub reloaded: Option<Vec<Prediction>>,
}

/// Train the `ner` pipe on `examples`.
///
/// # Errors
///
/// Returns toolkit errors from loading, training or saving the model.
pub fn train_ner<R: Rng + ?Sized>(
    mut examples: Vec<TrainingExample>,
    options: &NerOptions,
    rng: &mut R,
) -> Result<NerReport, TrainError> {
    let mut nlp = load_or_blank(options.model.as_deref())?;
    if !nlp.has_pipe(NER) {
        nlp.add_pipe(NER)?;
    }
    let ner = nlp.ner_mut().ok_or(TrainError::MissingPipe(NER))?;
    for example in &examples {
        for span in example.annotation.entities() {
            ner.add_label(&span.label)?;
        }
    }
    let labels: Vec<String> = ner.labels().iter().cloned().collect();

    let others = other_pipes(&nlp, NER);
    let others: Vec<&str> = others.iter().map(String::as_str).collect();
    let blank = options.model.is_none();

    let losses = nlp.with_disabled(&others, |nlp| -> Result<_, TrainError> {
        if blank {
            nlp.begin_training()?;
        }
        let mut history = Vec::with_capacity(options.n_iter);
        for epoch in 1..=options.n_iter {
            examples.shuffle(rng);
            let mut losses = Losses::new();
            for batch in minibatch(&examples, compounding(4.0, 32.0, 1.001)) {
                nlp.update(batch, options.drop, &mut losses, rng)?;
            }
            tracing::info!(epoch, ?losses, "Losses");
            history.push(losses);
        }
        Ok(history)
    })?;

    let predictions = predict(&nlp, &examples)?;

    let mut reloaded = None;
    if let Some(dir) = &options.output_dir {
        nlp.to_disk(dir)?;
        tracing::info!(dir = %dir.display(), "Saved model");

        tracing::info!(dir = %dir.display(), "Loading saved model");
        let nlp2 = Language::load(dir)?;
        reloaded = Some(predict(&nlp2, &examples)?);
    }

    Ok(NerReport {
        examples: examples.len(),
        labels,
        losses,
        predictions,
        saved_to: options.output_dir.clone(),
        reloaded,
    })
}

fn predict(nlp: &Language, examples: &[TrainingExample]) -> Result<Vec<Prediction>, TrainError> {
    examples
        .iter()
        .map(|example| {
            let doc = nlp.annotate(&example.text)?;
            let ents: Vec<(&str, &str)> = doc
                .ents
                .iter()
                .map(|e| (e.text.as_str(), e.label.as_str()))
                .collect();
            let tokens: Vec<(&str, &str)> = doc
                .tokens
                .iter()
                .zip(&doc.tags)
                .map(|(t, tag)| (t.text.as_str(), tag.as_str()))
                .collect();
            tracing::info!("Entities {ents:?}");
            tracing::info!("Tokens {tokens:?}");
            Ok(Prediction {
                text: example.text.clone(),
                entities: doc.ents,
            })
        })
        .collect()
}
