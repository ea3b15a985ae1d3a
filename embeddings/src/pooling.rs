//! Pooling of per-token encoder output into one sentence vector.

use crate::Embedding;
use crate::error::{EncodingError, Result};

/// Average the token vectors selected by `mask`.
///
/// Every dimension is the sum of the token vectors whose mask entry is set,
/// divided by the number of set entries. Padding positions contribute zero.
pub fn masked_mean_pool(token_states: &[Vec<f32>], mask: &[u8]) -> Result<Embedding> {
    if token_states.len() != mask.len() {
        return Err(EncodingError::TokenCountMismatch {
            expected: mask.len(),
            actual: token_states.len(),
        });
    }

    let dim = token_states.first().map_or(0, Vec::len);
    let mut pooled = vec![0.0f32; dim];
    let mut valid = 0usize;

    for (state, &m) in token_states.iter().zip(mask) {
        if state.len() != dim {
            return Err(EncodingError::DimensionMismatch {
                expected: dim,
                actual: state.len(),
            });
        }
        if m == 0 {
            continue;
        }
        valid += 1;
        for (acc, value) in pooled.iter_mut().zip(state) {
            *acc += value;
        }
    }

    if valid == 0 {
        return Err(EncodingError::EmptyInput);
    }

    let count = valid as f32;
    for value in &mut pooled {
        *value /= count;
    }
    Ok(pooled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_mask_is_plain_average() {
        let states = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 9.0]];
        let pooled = masked_mean_pool(&states, &[1, 1, 1]).unwrap();
        assert_eq!(pooled, vec![3.0, 5.0]);
    }

    #[test]
    fn test_padding_is_ignored() {
        let states = vec![vec![2.0, 2.0], vec![4.0, 0.0], vec![100.0, 100.0]];
        let pooled = masked_mean_pool(&states, &[1, 1, 0]).unwrap();
        assert_eq!(pooled, vec![3.0, 1.0]);
    }

    #[test]
    fn test_all_masked_is_empty_input() {
        let states = vec![vec![1.0], vec![2.0]];
        let result = masked_mean_pool(&states, &[0, 0]);
        assert!(matches!(result, Err(EncodingError::EmptyInput)));
    }

    #[test]
    fn test_mask_length_mismatch() {
        let states = vec![vec![1.0]];
        let result = masked_mean_pool(&states, &[1, 1]);
        assert!(matches!(
            result,
            Err(EncodingError::TokenCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_ragged_token_states() {
        let states = vec![vec![1.0, 2.0], vec![1.0]];
        let result = masked_mean_pool(&states, &[1, 1]);
        assert!(matches!(result, Err(EncodingError::DimensionMismatch { .. })));
    }
}
