//! Cosine similarity kernel.
//!
//! The three sums a cosine needs (dot product and both squared norms) are
//! accumulated in one pass over eight-lane `wide::f32x8` registers. The
//! largest multiple-of-eight prefix goes through the lanes, the remainder
//! through a scalar loop, and the lane partials are reduced horizontally
//! before the remainder is added.
//!
//! # Numerical behavior
//! - Lane count is fixed at eight regardless of the instruction set `wide`
//!   lowers to, so the summation order does not depend on the host CPU.
//! - Results agree with [`cosine_similarity_scalar`] to about 1e-6 for unit
//!   vectors; the difference comes purely from summation order.
//! - When `|a| * |b| <= 1e-8` the similarity is defined as `0.0`.
//! - Finite components large enough to overflow an f32 sum of squares
//!   (above about 1.8e19) are rescored in f64. Only NaN or infinite
//!   components can produce a NaN similarity.

use wide::f32x8;

use crate::error::VectorResult;
use crate::vector::types::VectorDimension;

/// Number of f32 lanes per SIMD accumulator.
pub const LANES: usize = 8;

/// Magnitude product at or below which similarity is defined as zero.
pub const MAGNITUDE_EPSILON: f32 = 1e-8;

/// Norm below which [`normalize`] leaves a vector untouched.
const NORMALIZE_EPSILON: f32 = 1e-10;

/// Checked cosine similarity between two vectors of the engine's dimension.
///
/// # Errors
///
/// Returns `VectorError::DimensionMismatch` when either vector's length
/// differs from `dimension`.
pub fn similarity(dimension: VectorDimension, a: &[f32], b: &[f32]) -> VectorResult<f32> {
    dimension.validate_vector(a)?;
    dimension.validate_vector(b)?;
    Ok(cosine_similarity(a, b))
}

/// Cosine similarity between two equal-length vectors.
///
/// Callers are responsible for the length check; [`similarity`] is the
/// validating entry point. Returns a value in `[-1.0, 1.0]`, or `0.0` when
/// either vector has near-zero magnitude.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let (dot, norm_a, norm_b) = accumulate(a, b);
    finish_or_widen(a, b, dot, norm_a, norm_b)
}

/// Plain scalar cosine similarity, used as the reference for the SIMD path.
pub fn cosine_similarity_scalar(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    finish_or_widen(a, b, dot, norm_a, norm_b)
}

/// L2-normalizes a vector in place.
///
/// Vectors with norm below 1e-10 are left unchanged.
pub fn normalize(vector: &mut [f32]) {
    let (_, norm_sq, _) = accumulate(&*vector, &*vector);
    let norm = if norm_sq.is_finite() {
        norm_sq.sqrt()
    } else {
        let wide_sq: f64 = vector.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
        wide_sq.sqrt() as f32
    };
    if norm > NORMALIZE_EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Returns `(a·b, a·a, b·b)`.
#[inline]
fn accumulate(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    let mut sum_dot = f32x8::splat(0.0);
    let mut sum_a = f32x8::splat(0.0);
    let mut sum_b = f32x8::splat(0.0);

    let mut a_chunks = a.chunks_exact(LANES);
    let mut b_chunks = b.chunks_exact(LANES);

    for (ca, cb) in a_chunks.by_ref().zip(b_chunks.by_ref()) {
        let va = load(ca);
        let vb = load(cb);
        sum_dot = va.mul_add(vb, sum_dot);
        sum_a = va.mul_add(va, sum_a);
        sum_b = vb.mul_add(vb, sum_b);
    }

    let mut dot = sum_dot.reduce_add();
    let mut norm_a = sum_a.reduce_add();
    let mut norm_b = sum_b.reduce_add();

    for (&x, &y) in a_chunks.remainder().iter().zip(b_chunks.remainder()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    (dot, norm_a, norm_b)
}

#[inline(always)]
fn load(chunk: &[f32]) -> f32x8 {
    f32x8::from([
        chunk[0], chunk[1], chunk[2], chunk[3], chunk[4], chunk[5], chunk[6], chunk[7],
    ])
}

/// Falls back to f64 sums when any f32 sum overflowed.
#[inline]
fn finish_or_widen(a: &[f32], b: &[f32], dot: f32, norm_a: f32, norm_b: f32) -> f32 {
    if dot.is_finite() && norm_a.is_finite() && norm_b.is_finite() {
        finish(dot, norm_a, norm_b)
    } else {
        cosine_similarity_f64(a, b)
    }
}

#[cold]
fn cosine_similarity_f64(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude > f64::from(MAGNITUDE_EPSILON) {
        (dot / magnitude).clamp(-1.0, 1.0) as f32
    } else {
        0.0
    }
}

#[inline]
fn finish(dot: f32, norm_a: f32, norm_b: f32) -> f32 {
    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude > MAGNITUDE_EPSILON {
        // Rounding can push parallel vectors a few ulps past 1.0.
        (dot / magnitude).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorError;

    fn wave(len: usize, phase: f32) -> Vec<f32> {
        (0..len).map(|i| (i as f32 * 0.37 + phase).sin()).collect()
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let v = wave(384, 0.0);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        let a = [1.0, 0.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0, 0.0];
        let c = [-1.0, 0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &c), -1.0);
    }

    #[test]
    fn test_zero_vector_falls_back_to_zero() {
        let zero = vec![0.0; 16];
        let v = wave(16, 1.0);
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);

        // Tiny but non-zero magnitudes are still below the floor.
        let tiny = vec![1e-6; 16];
        assert_eq!(cosine_similarity(&tiny, &tiny), 0.0);
    }

    #[test]
    fn test_simd_matches_scalar_across_tail_lengths() {
        // Every remainder length from 0 to 7, plus lengths shorter than one lane.
        for len in 1..=41 {
            let a = wave(len, 0.3);
            let b = wave(len, 1.7);
            let simd = cosine_similarity(&a, &b);
            let scalar = cosine_similarity_scalar(&a, &b);
            assert!(
                (simd - scalar).abs() < 1e-5,
                "len {len}: simd {simd} vs scalar {scalar}"
            );
        }
    }

    #[test]
    fn test_tail_only_components_are_counted() {
        // Length 9: the only non-zero component lives in the scalar remainder.
        let mut a = vec![0.0; 9];
        let mut b = vec![0.0; 9];
        a[8] = 2.0;
        b[8] = 3.0;
        assert_eq!(cosine_similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_result_is_clamped_to_unit_interval() {
        let v = vec![0.1f32; 1000];
        let s = cosine_similarity(&v, &v);
        assert!(s <= 1.0);
        assert!(s > 0.9999);
    }

    #[test]
    fn test_large_finite_components_stay_bounded() {
        let a = [3e19f32; 4];
        let b = [3e19f32, 1.0, 0.0, 0.0];

        let self_sim = cosine_similarity(&a, &a);
        assert!((self_sim - 1.0).abs() < 1e-6, "self similarity {self_sim}");

        // a is parallel to [1, 1, 1, 1], b is essentially [1, 0, 0, 0].
        let cross = cosine_similarity(&a, &b);
        assert!((cross - 0.5).abs() < 1e-6, "cross similarity {cross}");
        assert_eq!(cross, cosine_similarity_scalar(&a, &b));

        let big: Vec<f32> = (0..20).map(|i| f32::MAX / (i as f32 + 1.0)).collect();
        assert!((cosine_similarity(&big, &big) - 1.0).abs() < 1e-6);

        let mut v = vec![3e30f32, 4e30];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_checked_similarity_validates_both_sides() {
        let dim = VectorDimension::new(4).unwrap();
        let good = [1.0, 2.0, 3.0, 4.0];
        let short = [1.0, 2.0, 3.0];

        assert!(similarity(dim, &good, &good).is_ok());
        assert_eq!(
            similarity(dim, &short, &good),
            Err(VectorError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(
            similarity(dim, &good, &short),
            Err(VectorError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
        // Equal to each other but not to the engine dimension.
        assert!(similarity(dim, &short, &short).is_err());
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0; 5];
        normalize(&mut zero);
        assert!(zero.iter().all(|&x| x == 0.0));

        let mut long = wave(100, 0.5);
        normalize(&mut long);
        let norm: f32 = long.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}
