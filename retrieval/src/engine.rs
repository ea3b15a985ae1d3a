//! Retrieval engine implementation.

use std::sync::Arc;
use std::time::Duration;

use lmkit_embeddings::{
    EmbeddingProvider, EncodingError, MeanPoolingProvider, RemoteTokenEncoder, ScoringFunction,
    WordPieceTokenizer,
};
use tracing::{debug, info, warn};

use crate::batch::{EmbeddedBatch, embed_all};
use crate::config::{RetrievalConfig, RetrieverConfig};
use crate::error::{Result, RetrievalError};
use crate::expander::expand;
use crate::ranker::rank;

/// Provider assembled by [`Retriever::from_config`].
pub type RemoteProvider = MeanPoolingProvider<WordPieceTokenizer, RemoteTokenEncoder>;

/// Semantic sentence retriever.
///
/// Given a pool of sentences and a query, the retriever embeds everything
/// with the shared provider, ranks the pool by similarity to the query and
/// returns the best matches, each followed by its next sentences:
/// - pool + query are embedded in one batch
/// - candidates are scored against the query and the top `k` kept
/// - every match is extended with up to `n` following pool sentences
///
/// The provider is loaded once and shared read-only; a `Retriever` holds no
/// other state between calls.
pub struct Retriever<P: ?Sized> {
    /// Shared embedding provider.
    provider: Arc<P>,

    /// Configuration.
    config: RetrieverConfig,
}

impl<P: ?Sized> Clone for Retriever<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

impl<P> Retriever<P>
where
    P: EmbeddingProvider + ?Sized,
{
    /// Create a retriever with the default configuration.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            config: RetrieverConfig::default(),
        }
    }

    /// Create a new retriever builder.
    pub fn builder(provider: Arc<P>) -> RetrieverBuilder<P> {
        RetrieverBuilder::new(provider)
    }

    /// Configuration in effect.
    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    /// The shared provider.
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Retrieve the `k` best matches for `query`, each followed by the
    /// configured number of context sentences.
    pub async fn retrieve(&self, pool: &[String], query: &str, k: usize) -> Result<Vec<String>> {
        self.retrieve_with_context(pool, query, k, self.config.context_window)
            .await
    }

    /// Retrieve the `k` best matches for `query`, each followed by up to
    /// `n` of the sentences that come after it in `pool`.
    ///
    /// When `k` exceeds the pool size the pool is returned unchanged and the
    /// encoder is not called. Callers are often language models that ask for
    /// more results than exist; this is a successful outcome, not an error.
    pub async fn retrieve_with_context(
        &self,
        pool: &[String],
        query: &str,
        k: usize,
        n: usize,
    ) -> Result<Vec<String>> {
        if k > pool.len() {
            warn!(
                "Requested {k} results from a pool of {}, returning the pool unchanged",
                pool.len()
            );
            return Ok(pool.to_vec());
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let batch = self.embed(pool, query).await?;
        let ranked = rank(&batch.candidates, &batch.query, k, self.config.scoring)?;
        debug!(
            "Ranked {} candidates, best: {:?}",
            pool.len(),
            ranked.first()
        );

        let selected: Vec<usize> = ranked.iter().map(|c| c.index).collect();
        Ok(expand(pool, &selected, n))
    }

    async fn embed(&self, pool: &[String], query: &str) -> Result<EmbeddedBatch> {
        let Some(limit) = self.config.embed_timeout() else {
            return embed_all(self.provider.as_ref(), pool, query).await;
        };

        match tokio::time::timeout(limit, embed_all(self.provider.as_ref(), pool, query)).await {
            Ok(result) => result,
            Err(_) => Err(EncodingError::Timeout {
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            }
            .into()),
        }
    }
}

impl Retriever<RemoteProvider> {
    /// Build a retriever backed by a remote encoder from configuration.
    ///
    /// The tokenizer is loaded from `encoder.tokenizer_path` when set,
    /// otherwise from the WordPiece vocabulary at `encoder.vocab_path`.
    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        let encoder_config = &config.encoder;
        let tokenizer = match (&encoder_config.tokenizer_path, &encoder_config.vocab_path) {
            (Some(path), _) => WordPieceTokenizer::from_file(path)?,
            (None, Some(path)) => {
                WordPieceTokenizer::from_vocab_file(path, encoder_config.lowercase)?
            }
            (None, None) => {
                return Err(RetrievalError::Config(
                    "encoder.tokenizer_path or encoder.vocab_path must be set".to_string(),
                ));
            }
        };

        let mut encoder = RemoteTokenEncoder::new(&encoder_config.base_url, &encoder_config.model)
            .with_max_tokens(encoder_config.max_tokens)
            .with_timeout(Duration::from_secs(encoder_config.request_timeout_secs));
        if let Some(key) = encoder_config.api_key() {
            encoder = encoder.with_api_key(key);
        }

        let provider = MeanPoolingProvider::new(tokenizer, encoder)
            .with_options(encoder_config.options());

        info!(
            "Initialized retriever with model {} at {}",
            encoder_config.model, encoder_config.base_url
        );

        Ok(Self::builder(Arc::new(provider))
            .with_config(config.retriever.clone())
            .build())
    }
}

/// Builder for [`Retriever`].
pub struct RetrieverBuilder<P: ?Sized> {
    provider: Arc<P>,
    config: RetrieverConfig,
}

impl<P> RetrieverBuilder<P>
where
    P: EmbeddingProvider + ?Sized,
{
    /// Create a new builder.
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            config: RetrieverConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: RetrieverConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default number of context sentences.
    pub fn with_context_window(mut self, window: usize) -> Self {
        self.config.context_window = window;
        self
    }

    /// Set the scoring function.
    pub fn with_scoring(mut self, scoring: ScoringFunction) -> Self {
        self.config.scoring = scoring;
        self
    }

    /// Bound the embedding stage of every call.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Build the retriever.
    pub fn build(self) -> Retriever<P> {
        Retriever {
            provider: self.provider,
            config: self.config,
        }
    }
}
