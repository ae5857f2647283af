//! The processing pipeline and its on-disk format.
//!
//! A model directory holds `meta.json` (language code and ordered pipe
//! names) plus, per component, `<pipe>.json` with its labels and
//! `<pipe>.safetensors` with its weights.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anl_core::training::{Annotation, Cats, EntitySpan, TrainingExample};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::doc::Doc;
use crate::error::NlpError;
use crate::ner::EntityRecognizer;
use crate::textcat::TextCategorizer;
use crate::tokenizer::{Token, tokenize};

/// Name of the entity recognizer pipe.
pub const NER: &str = "ner";

/// Name of the text categorizer pipe.
pub const TEXTCAT: &str = "textcat";

const META_FILE: &str = "meta.json";

/// Accumulated loss per pipe name.
pub type Losses = BTreeMap<String, f64>;

#[derive(Debug)]
pub enum Component {
    Ner(EntityRecognizer),
    Textcat(TextCategorizer),
}

impl Component {
    /// Build an empty component from its registered name.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::UnknownPipe`] for names other than `ner` and
    /// `textcat`.
    pub fn create(name: &str) -> Result<Self, NlpError> {
        match name {
            NER => Ok(Self::Ner(EntityRecognizer::new()?)),
            TEXTCAT => Ok(Self::Textcat(TextCategorizer::new()?)),
            other => Err(NlpError::UnknownPipe(other.to_string())),
        }
    }

    fn begin_training(&mut self) -> Result<(), NlpError> {
        match self {
            Self::Ner(ner) => ner.begin_training(),
            Self::Textcat(textcat) => textcat.begin_training(),
        }
    }

    fn averaged(&self) -> Result<Self, NlpError> {
        Ok(match self {
            Self::Ner(ner) => Self::Ner(ner.averaged()?),
            Self::Textcat(textcat) => Self::Textcat(textcat.averaged()?),
        })
    }

    fn save(&self, dir: &Path, name: &str) -> Result<(), NlpError> {
        let (config, weights) = component_files(dir, name);
        match self {
            Self::Ner(ner) => ner.save(&config, &weights),
            Self::Textcat(textcat) => textcat.save(&config, &weights),
        }
    }

    fn load(dir: &Path, name: &str) -> Result<Self, NlpError> {
        let (config, weights) = component_files(dir, name);
        match name {
            NER => EntityRecognizer::load(&config, &weights).map(Self::Ner),
            TEXTCAT => TextCategorizer::load(&config, &weights).map(Self::Textcat),
            other => Err(NlpError::UnknownPipe(other.to_string())),
        }
    }
}

fn component_files(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.json")),
        dir.join(format!("{name}.safetensors")),
    )
}

#[derive(Debug)]
struct Pipe {
    name: String,
    component: Component,
}

#[derive(Debug, Serialize, Deserialize)]
struct Meta {
    lang: String,
    pipeline: Vec<String>,
}

#[derive(Debug)]
pub struct Language {
    lang: String,
    pipeline: Vec<Pipe>,
    disabled: BTreeSet<String>,
}

impl Language {
    /// An empty pipeline for `lang`.
    #[must_use]
    pub fn blank(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            pipeline: Vec::new(),
            disabled: BTreeSet::new(),
        }
    }

    /// Load a model directory written by [`Language::to_disk`].
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::NotAModel`] when `meta.json` is missing, and
    /// I/O or deserialization errors for unreadable component files.
    pub fn load(dir: &Path) -> Result<Self, NlpError> {
        let meta_path = dir.join(META_FILE);
        if !meta_path.is_file() {
            return Err(NlpError::NotAModel(dir.display().to_string()));
        }
        let meta: Meta = read_json(&meta_path)?;

        let mut nlp = Self::blank(meta.lang);
        for name in meta.pipeline {
            let component = Component::load(dir, &name)?;
            nlp.pipeline.push(Pipe { name, component });
        }
        tracing::debug!(dir = %dir.display(), pipes = ?nlp.pipe_names(), "loaded model");
        Ok(nlp)
    }

    /// Write `meta.json` and one file per component, creating `dir`.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from creating the directory or writing files, and
    /// tensor errors from writing weights.
    pub fn to_disk(&self, dir: &Path) -> Result<(), NlpError> {
        fs::create_dir_all(dir).map_err(|source| NlpError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let meta = Meta {
            lang: self.lang.clone(),
            pipeline: self.pipeline.iter().map(|p| p.name.clone()).collect(),
        };
        write_json(&dir.join(META_FILE), &meta)?;

        for pipe in &self.pipeline {
            pipe.component.save(dir, &pipe.name)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Names of all pipes in order, including disabled ones.
    #[must_use]
    pub fn pipe_names(&self) -> Vec<&str> {
        self.pipeline.iter().map(|p| p.name.as_str()).collect()
    }

    #[must_use]
    pub fn has_pipe(&self, name: &str) -> bool {
        self.pipeline.iter().any(|p| p.name == name)
    }

    /// Append a new, empty component.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::DuplicatePipe`] if the pipe exists, or
    /// [`NlpError::UnknownPipe`] for unsupported names.
    pub fn add_pipe(&mut self, name: &str) -> Result<(), NlpError> {
        if self.has_pipe(name) {
            return Err(NlpError::DuplicatePipe(name.to_string()));
        }
        let component = Component::create(name)?;
        self.pipeline.push(Pipe {
            name: name.to_string(),
            component,
        });
        Ok(())
    }

    pub fn ner_mut(&mut self) -> Option<&mut EntityRecognizer> {
        self.pipeline.iter_mut().find_map(|p| match &mut p.component {
            Component::Ner(ner) => Some(ner),
            Component::Textcat(_) => None,
        })
    }

    pub fn textcat_mut(&mut self) -> Option<&mut TextCategorizer> {
        self.pipeline.iter_mut().find_map(|p| match &mut p.component {
            Component::Textcat(textcat) => Some(textcat),
            Component::Ner(_) => None,
        })
    }

    /// Run `f` with the named pipes disabled, then restore the previous set.
    pub fn with_disabled<T>(&mut self, names: &[&str], f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = self.disabled.clone();
        self.disabled.extend(names.iter().map(ToString::to_string));
        let out = f(self);
        self.disabled = previous;
        out
    }

    /// Reset the weights of every enabled component.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if weights cannot be reallocated.
    pub fn begin_training(&mut self) -> Result<(), NlpError> {
        for pipe in self.enabled_mut() {
            pipe.component.begin_training()?;
        }
        Ok(())
    }

    /// One optimizer step over `batch` for every enabled pipe.
    ///
    /// Entity examples only train `ner`; category examples only train
    /// `textcat`. Loss is added to `losses` under the pipe's name.
    ///
    /// # Errors
    ///
    /// Returns tokenizer or tensor errors.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        batch: &[TrainingExample],
        drop: f64,
        losses: &mut Losses,
        rng: &mut R,
    ) -> Result<(), NlpError> {
        let mut entities: Vec<(Vec<Token>, &[EntitySpan])> = Vec::new();
        let mut categories: Vec<(Vec<Token>, &Cats)> = Vec::new();
        for example in batch {
            let tokens = tokenize(&example.text)?;
            match &example.annotation {
                Annotation::Entities(spans) => entities.push((tokens, spans.as_slice())),
                Annotation::Cats(cats) => categories.push((tokens, cats)),
            }
        }

        for pipe in self.enabled_mut() {
            let loss = match &mut pipe.component {
                Component::Ner(ner) if !entities.is_empty() => {
                    ner.update(&entities, drop, rng)?
                }
                Component::Textcat(textcat) if !categories.is_empty() => {
                    textcat.update(&categories, drop, rng)?
                }
                _ => continue,
            };
            *losses.entry(pipe.name.clone()).or_insert(0.0) += loss;
        }
        Ok(())
    }

    /// Tokenize `text` and run every enabled pipe over it.
    ///
    /// # Errors
    ///
    /// Returns tokenizer or tensor errors.
    pub fn annotate(&self, text: &str) -> Result<Doc, NlpError> {
        let tokens = tokenize(text)?;
        let mut doc = Doc {
            text: text.to_string(),
            ..Doc::default()
        };
        for pipe in self.pipeline.iter().filter(|p| !self.disabled.contains(&p.name)) {
            match &pipe.component {
                Component::Ner(ner) => {
                    let (tags, ents) = ner.entities(text, &tokens)?;
                    doc.tags = tags;
                    doc.ents = ents;
                }
                Component::Textcat(textcat) => doc.cats = textcat.predict(&tokens)?,
            }
        }
        doc.tokens = tokens;
        Ok(doc)
    }

    /// A copy whose components use averaged weights.
    ///
    /// # Errors
    ///
    /// Returns [`NlpError::Tensor`] if weights cannot be copied.
    pub fn averaged(&self) -> Result<Self, NlpError> {
        let pipeline = self
            .pipeline
            .iter()
            .map(|p| {
                Ok(Pipe {
                    name: p.name.clone(),
                    component: p.component.averaged()?,
                })
            })
            .collect::<Result<Vec<_>, NlpError>>()?;
        Ok(Self {
            lang: self.lang.clone(),
            pipeline,
            disabled: self.disabled.clone(),
        })
    }

    fn enabled_mut(&mut self) -> impl Iterator<Item = &mut Pipe> {
        let disabled = &self.disabled;
        self.pipeline
            .iter_mut()
            .filter(move |p| !disabled.contains(&p.name))
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, NlpError> {
    let json = fs::read_to_string(path).map_err(|source| NlpError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| NlpError::Serde {
        path: path.display().to_string(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), NlpError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| NlpError::Serde {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, json).map_err(|source| NlpError::Io {
        path: path.display().to_string(),
        source,
    })
}
