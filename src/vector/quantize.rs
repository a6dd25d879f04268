//! Per-vector scalar quantization to signed 8-bit.
//!
//! Each vector is mapped affinely from `[min, max]` onto `[-128, 127]`:
//! `q = round((v - min) * scale - 128)` with `scale = 255 / (max - min)`.
//! The `min` and `scale` parameters travel with the codes so the vector
//! can be approximately reconstructed.
//!
//! # Edge cases
//! - Empty input fails with `EmptyVector`.
//! - NaN or infinite components fail with `NonFiniteValue`.
//! - Constant input (`max == min`) fails with `DegenerateRange`; there is
//!   no meaningful scale for it.

use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};

/// Number of quantization steps across `[min, max]`.
const LEVELS: f64 = 255.0;

/// Offset that moves `[0, 255]` onto the signed range.
const ZERO_POINT: f64 = 128.0;

/// Signed 8-bit codes plus the affine parameters that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedVector {
    values: Vec<i8>,
    min: f32,
    /// Kept in f64: for ranges below about 7.5e-37 it exceeds `f32::MAX`.
    scale: f64,
}

impl QuantizedVector {
    /// The 8-bit codes, one per input component.
    #[must_use]
    pub fn values(&self) -> &[i8] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<i8> {
        self.values
    }

    /// Smallest component of the source vector.
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    /// Codes per unit of input, `255 / (max - min)`.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Width of one quantization step in input units.
    #[must_use]
    pub fn step(&self) -> f32 {
        (1.0 / self.scale) as f32
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Approximate reconstruction: `(q + 128) / scale + min`.
    #[must_use]
    pub fn dequantize(&self) -> Vec<f32> {
        let min = f64::from(self.min);
        self.values
            .iter()
            .map(|&q| ((f64::from(q) + ZERO_POINT) / self.scale + min) as f32)
            .collect()
    }
}

/// Quantizes `vector` to signed 8-bit codes.
///
/// # Errors
///
/// `EmptyVector`, `NonFiniteValue` or `DegenerateRange`, see module docs.
pub fn quantize(vector: &[f32]) -> VectorResult<QuantizedVector> {
    if vector.is_empty() {
        return Err(VectorError::EmptyVector);
    }
    if let Some(index) = vector.iter().position(|v| !v.is_finite()) {
        return Err(VectorError::NonFiniteValue { index });
    }

    let (min, max) = vector
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if max == min {
        return Err(VectorError::DegenerateRange { value: min });
    }

    // f64 so that `max - min` cannot overflow for extreme finite inputs.
    let min64 = f64::from(min);
    let scale = LEVELS / (f64::from(max) - min64);

    let values = vector
        .iter()
        .map(|&v| {
            let code = ((f64::from(v) - min64) * scale - ZERO_POINT).round();
            code.clamp(f64::from(i8::MIN), f64::from(i8::MAX)) as i8
        })
        .collect();

    Ok(QuantizedVector {
        values,
        min,
        scale,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_map_to_signed_extremes() {
        let q = quantize(&[-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(q.values()[0], -128);
        assert_eq!(q.values()[2], 127);
        // Midpoint: 127.5 - 128 = -0.5 rounds away from zero.
        assert_eq!(q.values()[1], -1);
        assert_eq!(q.len(), 3);
        assert_eq!(q.min(), -1.0);
        assert!((q.scale() - 127.5).abs() < 1e-4);
    }

    #[test]
    fn test_round_trip_within_one_step() {
        let v: Vec<f32> = (0..384).map(|i| (i as f32 * 0.13).sin() * 0.2).collect();
        let q = quantize(&v).unwrap();
        let restored = q.dequantize();
        let step = q.step();

        assert_eq!(restored.len(), v.len());
        for (orig, back) in v.iter().zip(&restored) {
            assert!(
                (orig - back).abs() <= step,
                "{orig} restored as {back}, step {step}"
            );
        }
    }

    #[test]
    fn test_constant_vector_is_degenerate() {
        assert_eq!(
            quantize(&[0.25; 8]),
            Err(VectorError::DegenerateRange { value: 0.25 })
        );
        // Single component is constant by definition.
        assert!(matches!(
            quantize(&[3.0]),
            Err(VectorError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_empty_and_non_finite_inputs() {
        assert_eq!(quantize(&[]), Err(VectorError::EmptyVector));
        assert_eq!(
            quantize(&[0.0, f32::NAN, 1.0]),
            Err(VectorError::NonFiniteValue { index: 1 })
        );
        assert_eq!(
            quantize(&[f32::NEG_INFINITY, 1.0]),
            Err(VectorError::NonFiniteValue { index: 0 })
        );
    }

    #[test]
    fn test_extreme_range_does_not_overflow() {
        let q = quantize(&[f32::MIN, f32::MAX]).unwrap();
        assert_eq!(q.values(), &[-128, 127]);
        assert!(q.scale() > 0.0 && q.scale().is_finite());
    }

    #[test]
    fn test_tiny_range_round_trips() {
        let v = [0.0f32, 1e-37, 5e-38];
        let q = quantize(&v).unwrap();
        assert!(q.scale().is_finite());
        assert!(q.step() > 0.0);
        assert_eq!(q.values()[0], -128);
        assert_eq!(q.values()[1], 127);

        let step = 1e-37f32 / 255.0;
        for (orig, back) in v.iter().zip(q.dequantize()) {
            assert!(
                (orig - back).abs() <= step,
                "{orig} restored as {back}, step {step}"
            );
        }
    }

    #[test]
    fn test_codes_stay_in_range() {
        let v: Vec<f32> = (0..1000).map(|i| i as f32 * 1e-3 - 0.5).collect();
        let q = quantize(&v).unwrap();
        assert_eq!(*q.values().iter().min().unwrap(), -128);
        assert_eq!(*q.values().iter().max().unwrap(), 127);
        // Monotone input yields monotone codes.
        assert!(q.values().windows(2).all(|w| w[0] <= w[1]));
    }
}
