//! Tokenization for encoder models.
//!
//! The [`Tokenizer`] trait is the first half of the encoder capability: it
//! turns text into token ids plus an attention mask, truncated to the length
//! the model accepts. [`WordPieceTokenizer`] runs the model's own pipeline
//! through the `tokenizers` crate, either loaded from the `tokenizer.json`
//! shipped with the model or assembled as the standard BERT pipeline around
//! a `vocab.txt` listing.

use std::collections::HashMap;
use std::path::Path;

use tokenizers::{PostProcessor, TruncationDirection};
use tracing::info;

use crate::error::{EncodingError, Result};

const PAD_TOKEN: &str = "[PAD]";
const UNK_TOKEN: &str = "[UNK]";
const CLS_TOKEN: &str = "[CLS]";
const SEP_TOKEN: &str = "[SEP]";

/// Words longer than this are mapped straight to `[UNK]`.
const MAX_CHARS_PER_WORD: usize = 100;

/// Token ids and attention mask for one input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedText {
    /// Token ids, special tokens included.
    pub ids: Vec<u32>,

    /// 1 for real tokens, 0 for padding.
    pub attention_mask: Vec<u8>,
}

impl TokenizedText {
    /// Create a tokenized text where every position is valid.
    pub fn new(ids: Vec<u32>) -> Self {
        let attention_mask = vec![1; ids.len()];
        Self {
            ids,
            attention_mask,
        }
    }

    /// Number of positions, padding included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if there are no positions at all.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of positions covered by the attention mask.
    pub fn valid_tokens(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m != 0).count()
    }

    /// Right-pad to `len` positions with `pad_id` and a zero mask.
    pub fn pad_to(&mut self, len: usize, pad_id: u32) {
        if self.ids.len() < len {
            self.ids.resize(len, pad_id);
            self.attention_mask.resize(len, 0);
        }
    }
}

/// Turns text into model input.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text`, truncating the result to at most `max_tokens`
    /// positions (special tokens included).
    fn tokenize(&self, text: &str, max_tokens: usize) -> Result<TokenizedText>;

    /// Id used to pad sequences inside a batch.
    fn pad_id(&self) -> u32;
}

/// WordPiece tokenizer backed by the `tokenizers` pipeline.
///
/// Normalization (control character removal, CJK isolation, optional
/// lowercasing with accent stripping), punctuation splitting and the
/// `[CLS]`/`[SEP]` framing all come from the pipeline, so token ids match
/// what the model saw in training.
#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    inner: tokenizers::Tokenizer,
    pad_id: u32,
}

impl WordPieceTokenizer {
    /// Load a model's `tokenizer.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path).map_err(pipeline_error)?;
        let tokenizer = Self::from_pipeline(inner);
        info!(
            "Loaded tokenizer with {} tokens from {}",
            tokenizer.vocab_size(),
            path.display()
        );
        Ok(tokenizer)
    }

    /// Load a `vocab.txt` file, one token per line, into a BERT pipeline.
    pub fn from_vocab_file(path: impl AsRef<Path>, lowercase: bool) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let tokenizer = Self::from_tokens(content.lines().map(str::trim_end), lowercase)?;
        info!(
            "Loaded WordPiece vocabulary with {} tokens from {}",
            tokenizer.vocab_size(),
            path.display()
        );
        Ok(tokenizer)
    }

    /// Build a BERT pipeline from an ordered token listing; a token's id is
    /// its position in the listing.
    ///
    /// With `lowercase` set, input is lowercased and stripped of accents.
    pub fn from_tokens<I, S>(tokens: I, lowercase: bool) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = HashMap::new();
        for (id, token) in tokens.into_iter().enumerate() {
            let id = u32::try_from(id).map_err(|_| {
                EncodingError::InvalidVocabulary("vocabulary exceeds u32 ids".to_string())
            })?;
            vocab.entry(token.into()).or_insert(id);
        }

        let lookup = |token: &str| {
            vocab.get(token).copied().ok_or_else(|| {
                EncodingError::InvalidVocabulary(format!("missing special token {token}"))
            })
        };
        lookup(PAD_TOKEN)?;
        lookup(UNK_TOKEN)?;
        let cls_id = lookup(CLS_TOKEN)?;
        let sep_id = lookup(SEP_TOKEN)?;

        let definition = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": lowercase,
            },
            "pre_tokenizer": { "type": "BertPreTokenizer" },
            "post_processor": {
                "type": "BertProcessing",
                "sep": [SEP_TOKEN, sep_id],
                "cls": [CLS_TOKEN, cls_id],
            },
            "decoder": null,
            "model": {
                "type": "WordPiece",
                "unk_token": UNK_TOKEN,
                "continuing_subword_prefix": "##",
                "max_input_chars_per_word": MAX_CHARS_PER_WORD,
                "vocab": vocab,
            },
        });

        let inner = definition
            .to_string()
            .parse::<tokenizers::Tokenizer>()
            .map_err(pipeline_error)?;
        Ok(Self::from_pipeline(inner))
    }

    fn from_pipeline(inner: tokenizers::Tokenizer) -> Self {
        let pad_id = inner
            .get_padding()
            .map(|padding| padding.pad_id)
            .or_else(|| inner.token_to_id(PAD_TOKEN))
            .unwrap_or(0);
        Self { inner, pad_id }
    }

    /// Number of distinct tokens in the vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }

    /// Look up the id of a token.
    pub fn token_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    /// Number of special tokens the pipeline adds around a single text.
    fn reserved_tokens(&self) -> usize {
        self.inner
            .get_post_processor()
            .map_or(0, |processor| processor.added_tokens(false))
    }
}

impl Tokenizer for WordPieceTokenizer {
    fn tokenize(&self, text: &str, max_tokens: usize) -> Result<TokenizedText> {
        let mut encoding = self.inner.encode(text, false).map_err(pipeline_error)?;
        if encoding.is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        // Special tokens always survive truncation.
        let reserved = self.reserved_tokens();
        let budget = max_tokens.saturating_sub(reserved);
        if budget == 0 {
            return Err(EncodingError::TokenBudget {
                max_tokens,
                reserved,
            });
        }
        encoding.truncate(budget, 0, TruncationDirection::Right);

        let encoding = self
            .inner
            .post_process(encoding, None, true)
            .map_err(pipeline_error)?;
        Ok(TokenizedText {
            ids: encoding.get_ids().to_vec(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| u8::from(m != 0))
                .collect(),
        })
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }
}

fn pipeline_error(err: tokenizers::Error) -> EncodingError {
    EncodingError::Tokenizer(err.to_string())
}
