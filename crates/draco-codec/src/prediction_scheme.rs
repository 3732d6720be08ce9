//! Prediction method and correction transform plumbing for the integer
//! attribute coding path. All schemes operate on i32 component tuples;
//! the correction transform turns (original, predicted) pairs into
//! residuals and back.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_indices::CornerIndex;
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::status::{corrupt, Status};

/// Prediction method ids on the wire (`prediction_method` i8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSchemeMethod {
    None = -2,
    Difference = 0,
    Parallelogram = 1,
    MultiParallelogram = 2,
    ConstrainedMultiParallelogram = 4,
    TexCoordsPortable = 5,
    GeometricNormal = 6,
}

impl PredictionSchemeMethod {
    pub fn from_i8(value: i8) -> Option<PredictionSchemeMethod> {
        match value {
            -2 => Some(PredictionSchemeMethod::None),
            0 => Some(PredictionSchemeMethod::Difference),
            1 => Some(PredictionSchemeMethod::Parallelogram),
            2 => Some(PredictionSchemeMethod::MultiParallelogram),
            4 => Some(PredictionSchemeMethod::ConstrainedMultiParallelogram),
            5 => Some(PredictionSchemeMethod::TexCoordsPortable),
            6 => Some(PredictionSchemeMethod::GeometricNormal),
            _ => None,
        }
    }
}

/// Correction transform ids on the wire (`transform_type` i8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSchemeTransformType {
    Delta = 0,
    Wrap = 1,
}

impl PredictionSchemeTransformType {
    pub fn from_i8(value: i8) -> Option<PredictionSchemeTransformType> {
        match value {
            0 => Some(PredictionSchemeTransformType::Delta),
            1 => Some(PredictionSchemeTransformType::Wrap),
            _ => None,
        }
    }
}

/// Mesh data handed to the mesh-aware prediction schemes: the traversal
/// connectivity plus the maps between attribute values, corners and
/// vertices produced by the sequencer.
pub struct MeshPredictionSchemeData<'a, T: TraversalCornerTable> {
    pub table: &'a T,
    pub data_to_corner_map: &'a [CornerIndex],
    pub vertex_to_data_map: &'a [i32],
}

/// Correction transform: identity (delta) or wrap.
#[derive(Debug, Clone)]
pub enum PredictionSchemeTransform {
    Delta,
    Wrap(WrapTransform),
}

impl PredictionSchemeTransform {
    pub fn transform_type(&self) -> PredictionSchemeTransformType {
        match self {
            PredictionSchemeTransform::Delta => PredictionSchemeTransformType::Delta,
            PredictionSchemeTransform::Wrap(_) => PredictionSchemeTransformType::Wrap,
        }
    }

    pub fn new_for_decoding(transform_type: PredictionSchemeTransformType) -> Self {
        match transform_type {
            PredictionSchemeTransformType::Delta => PredictionSchemeTransform::Delta,
            PredictionSchemeTransformType::Wrap => {
                PredictionSchemeTransform::Wrap(WrapTransform::default())
            }
        }
    }

    pub fn init_encoding(&mut self, values: &[i32]) {
        if let PredictionSchemeTransform::Wrap(wrap) = self {
            wrap.init_encoding(values);
        }
    }

    /// Replaces the original values in |slot| with corrections.
    pub fn compute_correction(&self, slot: &mut [i32], predicted: &[i32]) {
        match self {
            PredictionSchemeTransform::Delta => {
                for (value, &pred) in slot.iter_mut().zip(predicted) {
                    *value = value.wrapping_sub(pred);
                }
            }
            PredictionSchemeTransform::Wrap(wrap) => wrap.compute_correction(slot, predicted),
        }
    }

    /// Replaces the corrections in |slot| with original values.
    pub fn compute_original_value(&self, slot: &mut [i32], predicted: &[i32]) {
        match self {
            PredictionSchemeTransform::Delta => {
                for (value, &pred) in slot.iter_mut().zip(predicted) {
                    *value = value.wrapping_add(pred);
                }
            }
            PredictionSchemeTransform::Wrap(wrap) => wrap.compute_original_value(slot, predicted),
        }
    }

    pub fn encode_transform_data(&self, buffer: &mut EncoderBuffer) {
        if let PredictionSchemeTransform::Wrap(wrap) = self {
            buffer.encode_i32(wrap.min_value);
            buffer.encode_i32(wrap.max_value);
        }
    }

    pub fn decode_transform_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        if let PredictionSchemeTransform::Wrap(wrap) = self {
            wrap.min_value = buffer.decode_i32()?;
            wrap.max_value = buffer.decode_i32()?;
            if wrap.min_value > wrap.max_value {
                return Err(corrupt("wrap transform bounds are inverted"));
            }
            wrap.init_correction_bounds();
        }
        Ok(())
    }

    /// Whether the produced corrections are already nonnegative (no
    /// zigzag mapping needed before the symbol coder).
    pub fn are_corrections_positive(&self) -> bool {
        false
    }
}

/// Wraps residuals around the original value range so they stay within
/// [-N/2, N/2] for N = max - min + 1. Predicted values are clamped to
/// [min, max] before the difference is formed.
#[derive(Debug, Clone, Default)]
pub struct WrapTransform {
    pub min_value: i32,
    pub max_value: i32,
    max_dif: i32,
    max_correction: i32,
    min_correction: i32,
}

impl WrapTransform {
    pub fn init_encoding(&mut self, values: &[i32]) {
        if values.is_empty() {
            return;
        }
        self.min_value = values.iter().copied().min().unwrap();
        self.max_value = values.iter().copied().max().unwrap();
        self.init_correction_bounds();
    }

    pub(crate) fn init_correction_bounds(&mut self) {
        self.max_dif = 1i32
            .wrapping_add(self.max_value)
            .wrapping_sub(self.min_value);
        self.max_correction = self.max_dif / 2;
        self.min_correction = -self.max_correction;
        if self.max_dif & 1 == 0 {
            self.max_correction -= 1;
        }
    }

    fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min_value, self.max_value)
    }

    pub fn compute_correction(&self, slot: &mut [i32], predicted: &[i32]) {
        for (value, &pred) in slot.iter_mut().zip(predicted) {
            let mut corr = value.wrapping_sub(self.clamp(pred));
            if corr < self.min_correction {
                corr = corr.wrapping_add(self.max_dif);
            } else if corr > self.max_correction {
                corr = corr.wrapping_sub(self.max_dif);
            }
            *value = corr;
        }
    }

    pub fn compute_original_value(&self, slot: &mut [i32], predicted: &[i32]) {
        for (value, &pred) in slot.iter_mut().zip(predicted) {
            let mut orig = value.wrapping_add(self.clamp(pred));
            if orig > self.max_value {
                orig = orig.wrapping_sub(self.max_dif);
            } else if orig < self.min_value {
                orig = orig.wrapping_add(self.max_dif);
            }
            *value = orig;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_wrap_round_trip(
            values in proptest::collection::vec(-1000i32..1000, 1..50),
            pred in -5000i32..5000,
        ) {
            let mut wrap = WrapTransform::default();
            wrap.init_encoding(&values);
            let range = wrap.max_value as i64 - wrap.min_value as i64 + 1;
            for &orig in &values {
                let mut slot = [orig];
                wrap.compute_correction(&mut slot, &[pred]);
                // Wrapped corrections stay within half the value range.
                prop_assert!((slot[0] as i64).abs() <= range / 2 + 1);
                wrap.compute_original_value(&mut slot, &[pred]);
                prop_assert_eq!(slot[0], orig);
            }
        }

        #[test]
        fn prop_delta_round_trip(orig in any::<i32>(), pred in any::<i32>()) {
            let transform = PredictionSchemeTransform::Delta;
            let mut slot = [orig];
            transform.compute_correction(&mut slot, &[pred]);
            transform.compute_original_value(&mut slot, &[pred]);
            prop_assert_eq!(slot[0], orig);
        }
    }
}
