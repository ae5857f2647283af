//! Annotated documents produced by [`crate::Language::annotate`].

use anl_core::training::Cats;
use serde::{Deserialize, Serialize};

use crate::tokenizer::Token;

/// A predicted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Doc {
    pub text: String,
    pub tokens: Vec<Token>,
    /// Per-token BILUO tag, empty when no entity recognizer ran.
    pub tags: Vec<String>,
    pub ents: Vec<Entity>,
    pub cats: Cats,
}
