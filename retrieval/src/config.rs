//! Configuration for the retrieval engine.
//!
//! ```toml
//! [retriever]
//! context_window = 1
//! scoring = "dot_product"
//!
//! [encoder]
//! base_url = "http://localhost:8080"
//! model = "carptriever-1"
//! tokenizer_path = "models/carptriever-1/tokenizer.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use lmkit_embeddings::{EncoderOptions, ScoringFunction};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// Configuration for the retrieval engine and its encoder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Retrieval behaviour.
    #[serde(default)]
    pub retriever: RetrieverConfig,

    /// Encoder connection and limits.
    #[serde(default)]
    pub encoder: EncoderConfig,
}

impl RetrievalConfig {
    /// Load the configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a file that exists but cannot be
    /// read or parsed is an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(
                "No retrieval config at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        info!("Loaded retrieval config from {}", path.display());
        Ok(config)
    }

    /// Set the retriever configuration.
    pub fn with_retriever(mut self, config: RetrieverConfig) -> Self {
        self.retriever = config;
        self
    }

    /// Set the encoder configuration.
    pub fn with_encoder(mut self, config: EncoderConfig) -> Self {
        self.encoder = config;
        self
    }
}

/// Configuration for ranking and context expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Number of following sentences appended to each match.
    pub context_window: usize,

    /// How candidates are scored against the query.
    pub scoring: ScoringFunction,

    /// Upper bound for the embedding stage of one call (in milliseconds).
    pub embed_timeout_ms: Option<u64>,
}

impl RetrieverConfig {
    /// Embedding timeout as a duration.
    pub fn embed_timeout(&self) -> Option<Duration> {
        self.embed_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            context_window: 1,
            scoring: ScoringFunction::DotProduct,
            embed_timeout_ms: None,
        }
    }
}

/// Configuration for the remote encoder and its tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Base URL of the inference server.
    pub base_url: String,

    /// Model to request.
    pub model: String,

    /// The model's `tokenizer.json`; takes precedence over `vocab_path`.
    pub tokenizer_path: Option<PathBuf>,

    /// WordPiece vocabulary matching the model, run through a BERT pipeline.
    pub vocab_path: Option<PathBuf>,

    /// Whether the `vocab_path` pipeline lowercases and strips accents.
    pub lowercase: bool,

    /// Truncation length in tokens.
    pub max_tokens: usize,

    /// Hard limit on input length in characters.
    pub max_text_chars: usize,

    /// Number of inputs per encoder request.
    pub batch_size: usize,

    /// Per-request timeout (in seconds).
    pub request_timeout_secs: u64,

    /// Environment variable holding the API key, if the server needs one.
    pub api_key_env: Option<String>,
}

impl EncoderConfig {
    /// Limits for the pooling provider.
    pub fn options(&self) -> EncoderOptions {
        EncoderOptions {
            max_tokens: self.max_tokens,
            max_text_chars: self.max_text_chars,
            batch_size: self.batch_size,
        }
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        let options = EncoderOptions::default();
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "carptriever-1".to_string(),
            tokenizer_path: None,
            vocab_path: None,
            lowercase: true,
            max_tokens: options.max_tokens,
            max_text_chars: options.max_text_chars,
            batch_size: options.batch_size,
            request_timeout_secs: 30,
            api_key_env: None,
        }
    }
}
