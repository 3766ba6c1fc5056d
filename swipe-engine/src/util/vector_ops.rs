//! Pure vector math over embedding vectors
//!
//! Every function here is stateless. Dimension mismatches fail fast with
//! `InvalidDimension` because they indicate a programming error, never bad
//! data.

use crate::error::EngineError;

fn check_dims(a: &[f32], b: &[f32]) -> Result<(), EngineError> {
    if a.len() != b.len() {
        return Err(EngineError::InvalidDimension {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Cosine similarity in [-1, 1]. Returns 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, EngineError> {
    check_dims(a, b)?;
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Euclidean (L2) distance.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32, EngineError> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt())
}

/// Manhattan (L1) distance.
pub fn manhattan_distance(a: &[f32], b: &[f32]) -> Result<f32, EngineError> {
    check_dims(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum())
}

/// Scale to unit Euclidean norm. The zero vector is returned unchanged.
pub fn normalize_l2(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Element-wise weighted sum. Weights are renormalized to sum to 1 first;
/// vectors shorter than the longest input are zero-padded.
pub fn combine_vectors(vectors: &[Vec<f32>], weights: &[f32]) -> Result<Vec<f32>, EngineError> {
    if vectors.len() != weights.len() {
        return Err(EngineError::InvalidDimension {
            expected: vectors.len(),
            actual: weights.len(),
        });
    }
    if vectors.is_empty() {
        return Ok(Vec::new());
    }
    let total: f32 = weights.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return Err(EngineError::InvalidConfig(
            "combine weights must sum to a non-zero finite value".to_string(),
        ));
    }

    let dimension = vectors.iter().map(Vec::len).max().unwrap_or(0);
    let mut combined = vec![0.0f32; dimension];
    for (vector, weight) in vectors.iter().zip(weights.iter()) {
        let weight = weight / total;
        for (slot, value) in combined.iter_mut().zip(vector.iter()) {
            *slot += value * weight;
        }
    }
    Ok(combined)
}

/// Element-wise arithmetic mean. All inputs must share one dimension.
pub fn average_vectors(vectors: &[Vec<f32>]) -> Result<Vec<f32>, EngineError> {
    if vectors.is_empty() {
        return Ok(Vec::new());
    }
    let dimension = vectors[0].len();
    for vector in vectors.iter() {
        if vector.len() != dimension {
            return Err(EngineError::InvalidDimension {
                expected: dimension,
                actual: vector.len(),
            });
        }
    }
    let count = vectors.len() as f32;
    let mut mean = vec![0.0f32; dimension];
    for vector in vectors {
        for (slot, value) in mean.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
    }
    for slot in mean.iter_mut() {
        *slot /= count;
    }
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.3, -0.7, 2.0];
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_opposite_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let negated: Vec<f32> = v.iter().map(|x| -x).collect();
        let sim = cosine_similarity(&v, &negated).unwrap();
        assert!((sim + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_dimension_mismatch_fails() {
        assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_err());
        assert!(euclidean_distance(&[1.0], &[1.0, 2.0]).is_err());
        assert!(manhattan_distance(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_distances() {
        let euclid = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((euclid - 5.0).abs() < 1e-6);
        let manhattan = manhattan_distance(&[0.0, 0.0], &[3.0, -4.0]).unwrap();
        assert!((manhattan - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_unchanged() {
        assert_eq!(normalize_l2(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_combine_renormalizes_weights_and_pads() {
        // Weights 2:2 renormalize to 0.5:0.5; the short vector is zero-padded
        let combined = combine_vectors(
            &[vec![2.0, 4.0, 6.0], vec![4.0]],
            &[2.0, 2.0],
        )
        .unwrap();
        assert_eq!(combined, vec![3.0, 2.0, 3.0]);
    }

    #[test]
    fn test_combine_zero_weight_sum_is_invalid() {
        let result = combine_vectors(&[vec![1.0], vec![2.0]], &[0.0, 0.0]);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_average() {
        let mean = average_vectors(&[vec![1.0, 3.0], vec![3.0, 5.0]]).unwrap();
        assert_eq!(mean, vec![2.0, 4.0]);
    }

    #[test]
    fn test_average_dimension_mismatch_fails() {
        assert!(average_vectors(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }

    proptest! {
        #[test]
        fn prop_normalized_norm_is_one_or_zero(v in proptest::collection::vec(-100.0f32..100.0, 1..16)) {
            let normalized = normalize_l2(&v);
            let norm: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
            let input_norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if input_norm == 0.0 {
                prop_assert_eq!(normalized, v);
            } else {
                prop_assert!((norm - 1.0).abs() < 1e-5);
            }
        }

        #[test]
        fn prop_cosine_self_similarity(v in proptest::collection::vec(-100.0f32..100.0, 1..16)) {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            prop_assume!(norm > 1e-3);
            let sim = cosine_similarity(&v, &v).unwrap();
            prop_assert!((sim - 1.0).abs() < 1e-4);
        }

        #[test]
        fn prop_cosine_bounded(
            a in proptest::collection::vec(-100.0f32..100.0, 4),
            b in proptest::collection::vec(-100.0f32..100.0, 4),
        ) {
            let sim = cosine_similarity(&a, &b).unwrap();
            prop_assert!((-1.0..=1.0).contains(&sim));
        }
    }
}
