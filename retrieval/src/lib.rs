//! # Retrieval Engine
//!
//! This crate finds the sentences of a pool that best match a query and
//! returns each of them together with the sentences that follow it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Retriever                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   pool + query ──► embed_all ──► rank ──► expand ──► results   │
//! │                       │            │         │                  │
//! │                       ▼            ▼         ▼                  │
//! │              EmbeddingProvider  top-k    n following            │
//! │                                 indices  sentences              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lmkit_retrieval::{RetrievalConfig, Retriever};
//!
//! let config = RetrievalConfig::load_from("lmkit.toml")?;
//! let retriever = Retriever::from_config(&config)?;
//!
//! let pool = vec!["A dog barked.".to_string(), "It was night.".to_string()];
//! let results = retriever.retrieve(&pool, "Tell me about the dog.", 1).await?;
//! ```

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod expander;
pub mod ranker;

pub use batch::{EmbeddedBatch, embed_all};
pub use config::{EncoderConfig, RetrievalConfig, RetrieverConfig};
pub use engine::{RemoteProvider, Retriever, RetrieverBuilder};
pub use error::{Result, RetrievalError};
pub use expander::expand;
pub use ranker::{RankedCandidate, rank, score_candidates};

// Re-export from dependencies for convenience
pub use lmkit_embeddings::{EmbeddingProvider, EncodingError, ScoringFunction};
