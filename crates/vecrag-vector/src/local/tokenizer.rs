//! Vocabulary loading and WordPiece-lite tokenization

use std::collections::HashMap;
use std::path::Path;

use vecrag_core::{RagError, Result};

pub const CLS_TOKEN: &str = "[CLS]";
pub const SEP_TOKEN: &str = "[SEP]";
pub const UNK_TOKEN: &str = "[UNK]";

/// Token to id mapping; the id is the 0-based line index of the token
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: HashMap<String, i64>,
}

impl Vocabulary {
    /// Load a newline-delimited vocabulary file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RagError::Configuration(format!(
                "Failed to read vocabulary {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self::from_lines(content.lines()))
    }

    /// Build from tokens in id order. Repeated tokens keep their first id.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens = HashMap::new();
        for (index, token) in lines.into_iter().enumerate() {
            tokens
                .entry(token.as_ref().to_string())
                .or_insert(index as i64);
        }
        Self { tokens }
    }

    /// Id of a token, if present
    pub fn id(&self, token: &str) -> Option<i64> {
        self.tokens.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Model input produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
}

impl TokenizedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Whitespace tokenizer with vocabulary lookup and `[UNK]` fallback,
/// bracketed by `[CLS]` and `[SEP]`
#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    vocab: Vocabulary,
    cls_id: i64,
    sep_id: i64,
    unk_id: i64,
}

impl WordPieceTokenizer {
    /// Create a tokenizer; the vocabulary must contain all three sentinels
    pub fn new(vocab: Vocabulary) -> Result<Self> {
        let sentinel = |token: &str| {
            vocab.id(token).ok_or_else(|| {
                RagError::Configuration(format!("Vocabulary is missing the {token} token"))
            })
        };

        Ok(Self {
            cls_id: sentinel(CLS_TOKEN)?,
            sep_id: sentinel(SEP_TOKEN)?,
            unk_id: sentinel(UNK_TOKEN)?,
            vocab,
        })
    }

    /// Load the vocabulary from disk and build a tokenizer
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::new(Vocabulary::from_file(path)?)
    }

    /// Tokenize text into ids and an all-ones attention mask
    pub fn tokenize(&self, text: &str) -> TokenizedInput {
        let mut input_ids = vec![self.cls_id];
        input_ids.extend(
            text.split_whitespace()
                .map(|word| self.vocab.id(word).unwrap_or(self.unk_id)),
        );
        input_ids.push(self.sep_id);

        let attention_mask = vec![1; input_ids.len()];
        TokenizedInput {
            input_ids,
            attention_mask,
        }
    }
}
