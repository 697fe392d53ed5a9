//! Vector similarity kernels.
//!
//! Pure-Rust implementations of:
//! - Squared Euclidean distance
//! - Inner product
//!
//! Accumulation happens in f64 to keep long embeddings stable.

/// Squared L2 distance. Returns `f32::INFINITY` on length mismatch.
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }

    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum();

    sum as f32
}

/// Dot product. Returns 0.0 on length mismatch.
pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum();

    dot as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_known_value() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert!((l2_distance_squared(&a, &b) - 25.0).abs() < 1e-6);
        assert_eq!(l2_distance_squared(&a, &a), 0.0);
    }

    #[test]
    fn l2_mismatched_lengths() {
        assert_eq!(l2_distance_squared(&[1.0], &[1.0, 2.0]), f32::INFINITY);
    }

    #[test]
    fn inner_product_known_value() {
        assert!((inner_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-6);
        assert_eq!(inner_product(&[1.0], &[]), 0.0);
    }
}
