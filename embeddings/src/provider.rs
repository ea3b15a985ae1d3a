//! Embedding providers.
//!
//! [`MeanPoolingProvider`] combines a [`Tokenizer`] and a [`TokenEncoder`]
//! into a sentence embedder: inputs are tokenized with truncation, padded
//! per batch, encoded, and reduced to one vector by masked mean pooling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Embedding;
use crate::encoder::TokenEncoder;
use crate::error::{EncodingError, Result};
use crate::pooling::masked_mean_pool;
use crate::tokenizer::{TokenizedText, Tokenizer};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for multiple texts, preserving input order.
    ///
    /// Either every text is embedded or the call fails.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        // Default implementation: process sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Limits applied by [`MeanPoolingProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderOptions {
    /// Truncation length in tokens; the encoder's own limit still applies.
    pub max_tokens: usize,

    /// Texts longer than this many characters are rejected outright.
    pub max_text_chars: usize,

    /// Number of inputs sent to the encoder at once.
    pub batch_size: usize,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            max_text_chars: 100_000,
            batch_size: 32,
        }
    }
}

/// Sentence embedder built from a tokenizer and a token encoder.
pub struct MeanPoolingProvider<T, E> {
    tokenizer: T,
    encoder: E,
    options: EncoderOptions,
}

impl<T, E> MeanPoolingProvider<T, E>
where
    T: Tokenizer,
    E: TokenEncoder,
{
    /// Create a provider with default options.
    pub fn new(tokenizer: T, encoder: E) -> Self {
        Self {
            tokenizer,
            encoder,
            options: EncoderOptions::default(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Options in effect.
    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    fn token_limit(&self) -> usize {
        self.options.max_tokens.min(self.encoder.max_tokens())
    }

    fn prepare(&self, text: &str) -> Result<TokenizedText> {
        let length = text.chars().count();
        if length > self.options.max_text_chars {
            return Err(EncodingError::TextTooLong {
                length,
                max_length: self.options.max_text_chars,
            });
        }

        let tokens = self.tokenizer.tokenize(text, self.token_limit())?;
        if tokens.valid_tokens() == 0 {
            return Err(EncodingError::EmptyInput);
        }
        Ok(tokens)
    }

    async fn encode_chunk(&self, mut chunk: Vec<TokenizedText>) -> Result<Vec<Embedding>> {
        let padded_len = chunk.iter().map(TokenizedText::len).max().unwrap_or(0);
        let pad_id = self.tokenizer.pad_id();
        for tokens in &mut chunk {
            tokens.pad_to(padded_len, pad_id);
        }

        let states = self.encoder.encode(&chunk).await?;
        if states.len() != chunk.len() {
            return Err(EncodingError::InvalidResponse(format!(
                "expected {} encoded inputs, got {}",
                chunk.len(),
                states.len()
            )));
        }

        states
            .iter()
            .zip(&chunk)
            .map(|(token_states, tokens)| masked_mean_pool(token_states, &tokens.attention_mask))
            .collect()
    }
}

#[async_trait]
impl<T, E> EmbeddingProvider for MeanPoolingProvider<T, E>
where
    T: Tokenizer,
    E: TokenEncoder,
{
    fn name(&self) -> &str {
        self.encoder.model()
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EncodingError::InvalidResponse("no embedding produced".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let prepared = texts
            .iter()
            .map(|text| self.prepare(text))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Embedding {} texts with model: {}",
            prepared.len(),
            self.encoder.model()
        );

        let batch_size = self.options.batch_size.max(1);
        let mut embeddings = Vec::with_capacity(prepared.len());
        let mut pending = prepared.into_iter().peekable();
        while pending.peek().is_some() {
            let chunk: Vec<TokenizedText> = pending.by_ref().take(batch_size).collect();
            embeddings.extend(self.encode_chunk(chunk).await?);
        }

        if let Some(first) = embeddings.first() {
            let expected = first.len();
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(EncodingError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                });
            }
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::encoder::TokenStates;
    use pretty_assertions::assert_eq;

    /// Tokenizer mapping each whitespace-separated word to its length.
    struct LengthTokenizer;

    impl Tokenizer for LengthTokenizer {
        fn tokenize(&self, text: &str, max_tokens: usize) -> Result<TokenizedText> {
            let ids: Vec<u32> = text
                .split_whitespace()
                .take(max_tokens)
                .map(|w| w.len() as u32)
                .collect();
            Ok(TokenizedText::new(ids))
        }

        fn pad_id(&self) -> u32 {
            0
        }
    }

    /// Encoder emitting `[id, 1.0]` for every position and recording batches.
    #[derive(Default)]
    struct EchoEncoder {
        batches: Mutex<Vec<Vec<TokenizedText>>>,
    }

    #[async_trait]
    impl TokenEncoder for EchoEncoder {
        fn model(&self) -> &str {
            "echo"
        }

        fn max_tokens(&self) -> usize {
            3
        }

        async fn encode(&self, batch: &[TokenizedText]) -> Result<Vec<TokenStates>> {
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(batch
                .iter()
                .map(|t| t.ids.iter().map(|&id| vec![id as f32, 1.0]).collect())
                .collect())
        }
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn test_padding_does_not_change_embedding() {
        let provider = MeanPoolingProvider::new(LengthTokenizer, EchoEncoder::default());

        let alone = provider.embed("ab").await.unwrap();
        let batched = provider
            .embed_batch(&texts(&["ab", "abcd ab abc"]))
            .await
            .unwrap();

        assert_eq!(alone, vec![2.0, 1.0]);
        assert_eq!(batched[0], alone);
        assert_eq!(batched[1], vec![3.0, 1.0]);
    }

    #[tokio::test]
    async fn test_batches_are_split_and_padded() {
        let provider = MeanPoolingProvider::new(LengthTokenizer, EchoEncoder::default())
            .with_options(EncoderOptions {
                batch_size: 2,
                ..EncoderOptions::default()
            });

        let embeddings = provider
            .embed_batch(&texts(&["a", "ab abc", "abcd"]))
            .await
            .unwrap();
        assert_eq!(embeddings.len(), 3);
        assert_eq!(embeddings[2], vec![4.0, 1.0]);

        let batches = provider.encoder.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0][0].ids, vec![1, 0]);
        assert_eq!(batches[0][0].attention_mask, vec![1, 0]);
        assert_eq!(batches[1].len(), 1);
    }

    #[tokio::test]
    async fn test_truncates_to_encoder_limit() {
        let provider = MeanPoolingProvider::new(LengthTokenizer, EchoEncoder::default());
        let embedding = provider.embed("a a a abcdefgh").await.unwrap();
        assert_eq!(embedding, vec![1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_empty_text_fails_whole_batch() {
        let encoder = EchoEncoder::default();
        let provider = MeanPoolingProvider::new(LengthTokenizer, encoder);

        let result = provider.embed_batch(&texts(&["fine", "  "])).await;
        assert!(matches!(result, Err(EncodingError::EmptyInput)));
        assert!(provider.encoder.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlong_text_is_rejected() {
        let provider = MeanPoolingProvider::new(LengthTokenizer, EchoEncoder::default())
            .with_options(EncoderOptions {
                max_text_chars: 4,
                ..EncoderOptions::default()
            });

        let result = provider.embed("abcde").await;
        assert!(matches!(
            result,
            Err(EncodingError::TextTooLong {
                length: 5,
                max_length: 4
            })
        ));
    }
}
