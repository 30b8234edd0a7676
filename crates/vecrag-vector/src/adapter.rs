//! Fixed-dimension vector normalization
//!
//! Every embedding is resized to the collection dimension before it
//! reaches the store. Truncation is lossy: the tail of a longer vector
//! is discarded.

/// Resize a vector to exactly `target` elements.
///
/// Equal length is returned unchanged, longer vectors keep their first
/// `target` elements, shorter vectors are right-padded with zeros.
pub fn resize(mut vector: Vec<f32>, target: usize) -> Vec<f32> {
    if vector.len() > target {
        tracing::debug!(
            from = vector.len(),
            to = target,
            "Truncating embedding to collection dimension"
        );
    }
    vector.resize(target, 0.0);
    vector
}

/// Cosine similarity of two vectors; zero when either has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_equal_is_identity() {
        let v = vec![0.1, 0.2, 0.3];
        assert_eq!(resize(v.clone(), 3), v);
    }

    #[test]
    fn test_resize_truncates() {
        assert_eq!(resize(vec![1.0, 2.0, 3.0, 4.0], 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_resize_pads_with_zeros() {
        assert_eq!(resize(vec![1.0, 0.0, 0.0], 5), vec![1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_resize_empty_and_zero_target() {
        assert_eq!(resize(Vec::new(), 2), vec![0.0, 0.0]);
        assert!(resize(vec![1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_padding_preserves_cosine() {
        let a = resize(vec![1.0, 2.0], 8);
        let b = resize(vec![2.0, 4.0], 8);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }
}
