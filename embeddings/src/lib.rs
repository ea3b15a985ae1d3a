//! # Embeddings
//!
//! This crate turns sentences into dense vectors for semantic retrieval.
//!
//! ## Features
//!
//! - **Tokenization**: The model's WordPiece pipeline with truncation
//! - **Token Encoding**: Per-token model output from a local or remote encoder
//! - **Pooling**: Masked mean pooling into one vector per sentence
//! - **Similarity**: Dot-product and cosine scoring
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Tokenizer ──► TokenEncoder ──► masked_mean_pool ──► Embedding  │
//! │       └──────────── MeanPoolingProvider ───────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod encoder;
pub mod error;
pub mod pooling;
pub mod provider;
pub mod similarity;
pub mod tokenizer;

pub use encoder::{RemoteTokenEncoder, TokenEncoder, TokenStates};
pub use error::{EncodingError, Result};
pub use pooling::masked_mean_pool;
pub use provider::{EmbeddingProvider, EncoderOptions, MeanPoolingProvider};
pub use similarity::{ScoringFunction, cosine_similarity, dot_product};
pub use tokenizer::{TokenizedText, Tokenizer, WordPieceTokenizer};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;
