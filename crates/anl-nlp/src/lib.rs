//! # anl-nlp
//!
//! Small statistical NLP toolkit used by the training loops, built on
//! `tokenizers` for splitting and `candle` for the models.
//!
//! - [`tokenizer`]: word/punctuation tokens with character offsets
//! - [`Language`]: an ordered pipeline of named components with
//!   load/save, disable-for-a-block, update and annotate
//! - [`EntityRecognizer`] and [`TextCategorizer`]: hashed-feature linear
//!   components trained with AdamW, with averaged weights for evaluation
//! - [`compounding`] and [`minibatch`]: batch-size schedules for training

pub mod batch;
pub mod doc;
pub mod error;
pub mod language;
pub mod linear;
pub mod ner;
pub mod textcat;
pub mod tokenizer;

pub use batch::{compounding, minibatch};
pub use doc::{Doc, Entity};
pub use error::NlpError;
pub use language::{Component, Language, Losses, NER, TEXTCAT};
pub use ner::EntityRecognizer;
pub use textcat::TextCategorizer;
