//! Scoring and ranking of candidates against a query.

use std::cmp::Reverse;

use lmkit_embeddings::{Embedding, ScoringFunction};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A candidate's position in the pool and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// Index in the original pool.
    pub index: usize,

    /// Similarity to the query.
    pub score: f32,
}

/// Score every candidate against the query.
pub fn score_candidates(
    candidates: &[Embedding],
    query: &[f32],
    scoring: ScoringFunction,
) -> Result<Vec<f32>> {
    let scores = candidates
        .iter()
        .map(|candidate| scoring.score(query, candidate))
        .collect::<lmkit_embeddings::Result<Vec<_>>>()?;
    Ok(scores)
}

/// Rank candidates by descending score and keep the best `k`.
///
/// Equal scores keep pool order, so the lower index comes first. NaN scores
/// rank after every real score.
pub fn rank(
    candidates: &[Embedding],
    query: &[f32],
    k: usize,
    scoring: ScoringFunction,
) -> Result<Vec<RankedCandidate>> {
    let scores = score_candidates(candidates, query, scoring)?;

    let mut ranked: Vec<RankedCandidate> = scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| RankedCandidate { index, score })
        .collect();

    // Stable sort, ties stay in index order.
    ranked.sort_by_key(|c| {
        let score = if c.score.is_nan() {
            f32::NEG_INFINITY
        } else {
            c.score
        };
        (c.score.is_nan(), Reverse(OrderedFloat(score)))
    });
    ranked.truncate(k);

    Ok(ranked)
}
