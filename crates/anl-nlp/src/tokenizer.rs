//! Word and punctuation tokens with character offsets.
//!
//! Splitting is done by the `tokenizers` whitespace pre-tokenizer
//! (`\w+|[^\w\s]+`). Offsets count Unicode scalar values, matching the span
//! offsets Doccano stores in its annotations.

use serde::{Deserialize, Serialize};
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer};

use crate::error::NlpError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
}

/// Split `text` into word and punctuation tokens.
///
/// # Errors
///
/// Returns [`NlpError::Tokenize`] if the pre-tokenizer fails.
pub fn tokenize(text: &str) -> Result<Vec<Token>, NlpError> {
    let mut pretokenized = PreTokenizedString::from(text);
    Whitespace::default()
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| NlpError::Tokenize(e.to_string()))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Char)
        .into_iter()
        .map(|(piece, (start, end), _)| Token {
            text: piece.to_string(),
            start,
            end,
        })
        .collect())
}
