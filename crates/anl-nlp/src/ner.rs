//! BILUO entity recognizer.
//!
//! Each token gets one of `O`, `B-L`, `I-L`, `L-L` or `U-L` for every entity
//! label `L`. Tag scores come from a [`LinearModel`] over window features;
//! decoding walks left to right and only picks tags that continue a valid
//! BILUO sequence.

use std::collections::BTreeSet;
use std::path::Path;

use anl_core::training::EntitySpan;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::doc::Entity;
use crate::error::NlpError;
use crate::language::{read_json, write_json};
use crate::linear::{LinearModel, buckets};
use crate::tokenizer::Token;

const OUTSIDE: &str = "O";
const START: &str = "-START-";
const END: &str = "-END-";

#[derive(Debug, Serialize, Deserialize)]
struct NerConfig {
    classes: Vec<String>,
}

#[derive(Debug)]
pub struct EntityRecognizer {
    labels: BTreeSet<String>,
    /// Output classes in weight-column order; `O` is always first.
    classes: Vec<String>,
    model: LinearModel,
}

impl EntityRecognizer {
    /// A recognizer with no labels.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the weights cannot be allocated.
    pub fn new() -> Result<Self, NlpError> {
        Ok(Self {
            labels: BTreeSet::new(),
            classes: vec![OUTSIDE.to_string()],
            model: LinearModel::new(1)?,
        })
    }

    /// Register an entity label. Adding a known label is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if the weights cannot be grown.
    pub fn add_label(&mut self, label: &str) -> Result<(), NlpError> {
        if self.labels.insert(label.to_string()) {
            for prefix in ["B", "I", "L", "U"] {
                self.classes.push(format!("{prefix}-{label}"));
            }
            self.model.grow(4)?;
        }
        Ok(())
    }

    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
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
            classes: self.classes.clone(),
            model: self.model.averaged()?,
        })
    }

    /// Predict one tag per token.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on scoring failures.
    pub fn predict_tags(&self, tokens: &[Token]) -> Result<Vec<String>, NlpError> {
        let instances: Vec<Vec<u32>> = (0..tokens.len())
            .map(|i| buckets(&features(tokens, i)))
            .collect();
        let probs = self.model.probabilities(&instances)?;

        let mut tags: Vec<String> = Vec::with_capacity(tokens.len());
        for (i, row) in probs.iter().enumerate() {
            let prev = tags.last().map_or(START, String::as_str);
            let last = i + 1 == tokens.len();
            let best = self
                .classes
                .iter()
                .zip(row)
                .filter(|(class, _)| allowed(prev, class, last))
                .fold(None::<(&String, f32)>, |best, (class, &p)| match best {
                    Some((_, bp)) if bp >= p => best,
                    _ => Some((class, p)),
                });
            tags.push(best.map_or_else(|| OUTSIDE.to_string(), |(class, _)| class.clone()));
        }
        Ok(tags)
    }

    /// Predict entities for an already tokenized text.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on scoring failures.
    pub fn entities(
        &self,
        text: &str,
        tokens: &[Token],
    ) -> Result<(Vec<String>, Vec<Entity>), NlpError> {
        let tags = self.predict_tags(tokens)?;
        let ents = tags_to_entities(text, tokens, &tags);
        Ok((tags, ents))
    }

    /// One optimizer step over a batch of tokenized examples.
    ///
    /// Tokens whose gold tag is unknown (span boundaries not on token
    /// boundaries) are left out. Returns the summed per-token loss.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] on training failures.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        batch: &[(Vec<Token>, &[EntitySpan])],
        drop: f64,
        rng: &mut R,
    ) -> Result<f64, NlpError> {
        let mut instances = Vec::new();
        let mut targets = Vec::new();
        for (tokens, spans) in batch {
            for (i, gold) in biluo_tags(tokens, spans).iter().enumerate() {
                let Some(class) = gold
                    .as_ref()
                    .and_then(|tag| self.classes.iter().position(|c| c == tag))
                else {
                    continue;
                };
                instances.push(buckets(&features(tokens, i)));
                #[allow(clippy::cast_possible_truncation)]
                targets.push(class as u32);
            }
        }
        self.model.train_step(&instances, &targets, drop, rng)
    }

    pub(crate) fn save(&self, config: &Path, weights: &Path) -> Result<(), NlpError> {
        write_json(
            config,
            &NerConfig {
                classes: self.classes.clone(),
            },
        )?;
        self.model.save(weights)
    }

    pub(crate) fn load(config: &Path, weights: &Path) -> Result<Self, NlpError> {
        let NerConfig { classes } = read_json(config)?;
        let labels = classes
            .iter()
            .filter_map(|c| c.strip_prefix("U-"))
            .map(ToString::to_string)
            .collect();
        let model = LinearModel::load(weights, classes.len())?;
        Ok(Self {
            labels,
            classes,
            model,
        })
    }
}

/// Whether `next` may follow `prev` in a BILUO sequence.
fn allowed(prev: &str, next: &str, last: bool) -> bool {
    let (prev_prefix, prev_label) = prev.split_once('-').unwrap_or((OUTSIDE, ""));
    let (next_prefix, next_label) = next.split_once('-').unwrap_or((OUTSIDE, ""));
    let inside = matches!(prev_prefix, "B" | "I");
    match next_prefix {
        "I" => inside && prev_label == next_label && !last,
        "L" => inside && prev_label == next_label,
        "B" => !inside && !last,
        _ => !inside,
    }
}

/// Window features for token `i`.
fn features(tokens: &[Token], i: usize) -> Vec<String> {
    let lower = |j: usize| tokens[j].text.to_lowercase();
    let word = lower(i);
    let prev = i.checked_sub(1).map_or_else(|| START.to_string(), lower);
    let prev2 = i.checked_sub(2).map_or_else(|| START.to_string(), lower);
    let next = if i + 1 < tokens.len() { lower(i + 1) } else { END.to_string() };
    let next2 = if i + 2 < tokens.len() { lower(i + 2) } else { END.to_string() };

    vec![
        "bias".to_string(),
        format!("w={word}"),
        format!("p3={}", prefix(&word, 3)),
        format!("s3={}", suffix(&word, 3)),
        format!("shape={}", shape(&tokens[i].text)),
        format!("pw={prev}"),
        format!("p2w={prev2}"),
        format!("nw={next}"),
        format!("n2w={next2}"),
        format!("pw+w={prev}|{word}"),
        format!("w+nw={word}|{next}"),
    ]
}

fn prefix(word: &str, n: usize) -> String {
    word.chars().take(n).collect()
}

fn suffix(word: &str, n: usize) -> String {
    let count = word.chars().count();
    word.chars().skip(count.saturating_sub(n)).collect()
}

/// Word shape: `Xxxx`, `dd`, etc., with runs capped at four characters.
fn shape(word: &str) -> String {
    let mut out = String::new();
    let mut last = None;
    let mut run = 0;
    for c in word.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };
        if Some(class) == last {
            run += 1;
        } else {
            run = 1;
            last = Some(class);
        }
        if run <= 4 {
            out.push(class);
        }
    }
    out
}

/// Gold BILUO tags for `tokens`.
///
/// Tokens outside every span are `O`. Tokens touched by a span whose
/// boundaries fall inside a token get `None`.
#[must_use]
pub fn biluo_tags(tokens: &[Token], spans: &[EntitySpan]) -> Vec<Option<String>> {
    let mut tags: Vec<Option<String>> = vec![Some(OUTSIDE.to_string()); tokens.len()];

    for span in spans {
        let first = tokens.iter().position(|t| t.start == span.start);
        let last = tokens.iter().rposition(|t| t.end == span.end);

        match (first, last) {
            (Some(first), Some(last)) if first <= last => {
                if first == last {
                    tags[first] = Some(format!("U-{}", span.label));
                } else {
                    tags[first] = Some(format!("B-{}", span.label));
                    for tag in &mut tags[first + 1..last] {
                        *tag = Some(format!("I-{}", span.label));
                    }
                    tags[last] = Some(format!("L-{}", span.label));
                }
            }
            _ => {
                for (token, tag) in tokens.iter().zip(tags.iter_mut()) {
                    if token.end > span.start && token.start < span.end {
                        *tag = None;
                    }
                }
            }
        }
    }

    tags
}

/// Decode predicted tags into entities, tolerating malformed sequences.
///
/// An entity opens on `B-` or `U-`; `I-`/`L-` tags continue it only when the
/// label matches. A stray `I-`/`L-` opens a new entity.
#[must_use]
pub fn tags_to_entities(text: &str, tokens: &[Token], tags: &[String]) -> Vec<Entity> {
    let chars: Vec<char> = text.chars().collect();
    let mut ents = Vec::new();
    let mut open: Option<(usize, usize, String)> = None;

    let close = |open: &mut Option<(usize, usize, String)>, ents: &mut Vec<Entity>| {
        if let Some((start, end, label)) = open.take() {
            ents.push(Entity {
                text: chars[start..end].iter().collect(),
                label,
                start,
                end,
            });
        }
    };

    for (token, tag) in tokens.iter().zip(tags) {
        let (prefix, label) = tag.split_once('-').unwrap_or((OUTSIDE, ""));
        match prefix {
            "B" | "U" => {
                close(&mut open, &mut ents);
                open = Some((token.start, token.end, label.to_string()));
                if prefix == "U" {
                    close(&mut open, &mut ents);
                }
            }
            "I" | "L" => {
                let continues = matches!(&open, Some((_, _, open_label)) if open_label == label);
                if continues {
                    if let Some((_, end, _)) = open.as_mut() {
                        *end = token.end;
                    }
                } else {
                    close(&mut open, &mut ents);
                    open = Some((token.start, token.end, label.to_string()));
                }
                if prefix == "L" {
                    close(&mut open, &mut ents);
                }
            }
            _ => close(&mut open, &mut ents),
        }
    }
    close(&mut open, &mut ents);
    ents
}
