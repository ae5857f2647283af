//! Exclusive-class text categorizer over unigram and bigram features.

use std::path::Path;

use anl_core::training::Cats;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NlpError;
use crate::language::{read_json, write_json};
use crate::linear::{LinearModel, buckets};
use crate::tokenizer::Token;

#[derive(Debug, Serialize, Deserialize)]
struct TextcatConfig {
    labels: Vec<String>,
}

#[derive(Debug)]
pub struct TextCategorizer {
    /// Labels in weight-column order.
    labels: Vec<String>,
    model: LinearModel,
}

impl TextCategorizer {
    /// A categorizer with no labels.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the weights cannot be allocated.
    pub fn new() -> Result<Self, NlpError> {
        Ok(Self {
            labels: Vec::new(),
            model: LinearModel::new(0)?,
        })
    }

    /// Register a category. Adding a known label is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the weights cannot be grown.
    pub fn add_label(&mut self, label: &str) -> Result<(), NlpError> {
        if !self.labels.iter().any(|l| l == label) {
            self.labels.push(label.to_string());
            self.model.grow(1)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.labels.iter().map(String::as_str).collect()
    }

    /// Forget all learned weights.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the weights cannot be reallocated.
    pub fn begin_training(&mut self) -> Result<(), NlpError> {
        self.model.reset()
    }

    /// A copy using weights averaged over training.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the weights cannot be copied.
    pub fn averaged(&self) -> Result<Self, NlpError> {
        Ok(Self {
            labels: self.labels.clone(),
            model: self.model.averaged()?,
        })
    }

    /// Category probabilities. Empty when no labels are registered.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on scoring failures.
    pub fn predict(&self, tokens: &[Token]) -> Result<Cats, NlpError> {
        if self.labels.is_empty() {
            return Ok(Cats::new());
        }
        let probs = self.model.probabilities(&[buckets(&features(tokens))])?;
        Ok(self
            .labels
            .iter()
            .cloned()
            .zip(probs.into_iter().flatten().map(f64::from))
            .collect())
    }

    /// One optimizer step over a batch of tokenized examples.
    ///
    /// The gold class of an example is its highest-valued known category;
    /// examples with no known category are skipped. Returns the summed
    /// cross-entropy.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on training failures.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        batch: &[(Vec<Token>, &Cats)],
        drop: f64,
        rng: &mut R,
    ) -> Result<f64, NlpError> {
        let mut instances = Vec::new();
        let mut targets = Vec::new();
        for (tokens, gold) in batch {
            let Some(class) = self.gold_class(gold) else {
                continue;
            };
            instances.push(buckets(&features(tokens)));
            targets.push(class);
        }
        self.model.train_step(&instances, &targets, drop, rng)
    }

    /// Column of the highest-valued known label; ties go to the
    /// alphabetically first label.
    #[allow(clippy::cast_possible_truncation)]
    fn gold_class(&self, gold: &Cats) -> Option<u32> {
        let mut best: Option<(&String, f64)> = None;
        for (label, &value) in gold {
            if self.labels.contains(label) && best.is_none_or(|(_, v)| value > v) {
                best = Some((label, value));
            }
        }
        let (label, _) = best?;
        self.labels.iter().position(|l| l == label).map(|i| i as u32)
    }

    pub(crate) fn save(&self, config: &Path, weights: &Path) -> Result<(), NlpError> {
        write_json(
            config,
            &TextcatConfig {
                labels: self.labels.clone(),
            },
        )?;
        self.model.save(weights)
    }

    pub(crate) fn load(config: &Path, weights: &Path) -> Result<Self, NlpError> {
        let TextcatConfig { labels } = read_json(config)?;
        let model = LinearModel::load(weights, labels.len())?;
        Ok(Self { labels, model })
    }
}

/// Lowercased unigrams and bigrams plus a bias feature.
fn features(tokens: &[Token]) -> Vec<String> {
    let words: Vec<String> = tokens.iter().map(|t| t.text.to_lowercase()).collect();
    let mut features = Vec::with_capacity(words.len() * 2 + 1);
    features.push("bias".to_string());
    features.extend(words.iter().map(|w| format!("u={w}")));
    features.extend(words.windows(2).map(|w| format!("b={}|{}", w[0], w[1])));
    features
}
