//! Similarity computation for embeddings.

use serde::{Deserialize, Serialize};

use crate::error::{EncodingError, Result};

/// Compute the dot product between two embeddings.
///
/// Unlike cosine similarity the result grows with vector magnitude.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EncodingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, where:
/// - 1.0 means identical vectors
/// - 0.0 means orthogonal vectors
/// - -1.0 means opposite vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (magnitude_a * magnitude_b))
}

/// How a query vector is compared with a candidate vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFunction {
    /// Raw dot product.
    #[default]
    DotProduct,
    /// Magnitude-normalized dot product.
    Cosine,
}

impl ScoringFunction {
    /// Score `candidate` against `query`.
    pub fn score(self, query: &[f32], candidate: &[f32]) -> Result<f32> {
        match self {
            Self::DotProduct => dot_product(query, candidate),
            Self::Cosine => cosine_similarity(query, candidate),
        }
    }
}
