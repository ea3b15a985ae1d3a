//! Batch embedding of a sentence pool together with its query.

use lmkit_embeddings::{Embedding, EmbeddingProvider, EncodingError};
use tracing::debug;

use crate::error::Result;

/// Embeddings of one pool and its query.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedBatch {
    /// One vector per pool sentence, in pool order.
    pub candidates: Vec<Embedding>,

    /// Vector of the query text.
    pub query: Embedding,
}

/// Embed `pool` followed by `query` in a single provider call.
///
/// The query is appended to a private copy of the pool; the caller's pool is
/// left untouched. Either all vectors are produced or the call fails.
pub async fn embed_all<P>(provider: &P, pool: &[String], query: &str) -> Result<EmbeddedBatch>
where
    P: EmbeddingProvider + ?Sized,
{
    let mut working = Vec::with_capacity(pool.len() + 1);
    working.extend_from_slice(pool);
    working.push(query.to_string());

    debug!(
        "Embedding {} candidates plus query with {}",
        pool.len(),
        provider.name()
    );

    let mut candidates = provider.embed_batch(&working).await?;
    if candidates.len() != working.len() {
        return Err(EncodingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            working.len(),
            candidates.len()
        ))
        .into());
    }

    let query = candidates
        .pop()
        .ok_or_else(|| EncodingError::InvalidResponse("missing query embedding".to_string()))?;

    Ok(EmbeddedBatch { candidates, query })
}
