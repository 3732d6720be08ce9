//! Quantization of floating point attributes onto an integer grid. The
//! bounding box origin, the (single, largest-extent) range and the bit
//! count are carried on the wire so the decoder can restore the values.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::AttributeValueIndex;
use crate::quantization_utils::{Dequantizer, Quantizer};
use crate::status::{corrupt, DracoError, Status, StatusOr};

#[derive(Debug, Default, Clone)]
pub struct AttributeQuantizationTransform {
    pub quantization_bits: u32,
    pub min_values: Vec<f32>,
    pub range: f32,
}

impl AttributeQuantizationTransform {
    /// Computes the bounding box of the attribute values and derives the
    /// quantization parameters.
    pub fn compute_parameters(att: &PointAttribute, quantization_bits: u32) -> StatusOr<Self> {
        if quantization_bits == 0 || quantization_bits > 30 {
            return Err(DracoError::InvalidConfig(format!(
                "unsupported quantization bits: {}",
                quantization_bits
            )));
        }
        let num_components = att.num_components() as usize;
        let mut min_values = vec![f32::MAX; num_components];
        let mut max_values = vec![f32::MIN; num_components];
        let mut value = vec![0f32; num_components];
        for i in 0..att.size() {
            att.convert_value(AttributeValueIndex(i as u32), &mut value);
            for c in 0..num_components {
                min_values[c] = min_values[c].min(value[c]);
                max_values[c] = max_values[c].max(value[c]);
            }
        }
        let mut range = 0f32;
        for c in 0..num_components {
            range = range.max(max_values[c] - min_values[c]);
        }
        // Zero range still needs a nonzero delta to stay invertible.
        if range == 0.0 {
            range = 1.0;
        }
        Ok(Self {
            quantization_bits,
            min_values,
            range,
        })
    }

    /// Quantizes every value entry; output has one i32 per component per
    /// value, in value-index order.
    pub fn transform_attribute(&self, att: &PointAttribute) -> Vec<i32> {
        let num_components = att.num_components() as usize;
        let max_quantized_value = (1i32 << self.quantization_bits) - 1;
        let quantizer = Quantizer::new(self.range, max_quantized_value);
        let mut out = Vec::with_capacity(att.size() * num_components);
        let mut value = vec![0f32; num_components];
        for i in 0..att.size() {
            att.convert_value(AttributeValueIndex(i as u32), &mut value);
            for c in 0..num_components {
                out.push(quantizer.quantize_float(value[c] - self.min_values[c]));
            }
        }
        out
    }

    /// Restores float values from quantized integers into |att|.
    pub fn inverse_transform_attribute(
        &self,
        values: &[i32],
        att: &mut PointAttribute,
    ) -> Status {
        let num_components = att.num_components() as usize;
        let max_quantized_value = (1i32 << self.quantization_bits) - 1;
        let dequantizer = Dequantizer::new(self.range, max_quantized_value)
            .ok_or_else(|| corrupt("dequantizer range is empty"))?;
        let num_values = values.len() / num_components;
        att.resize(num_values);
        let mut entry = vec![0f32; num_components];
        for i in 0..num_values {
            for c in 0..num_components {
                entry[c] = dequantizer.dequantize_float(values[i * num_components + c])
                    + self.min_values[c];
            }
            att.set_value_from_f32(AttributeValueIndex(i as u32), &entry);
        }
        Ok(())
    }

    pub fn encode_parameters(&self, buffer: &mut EncoderBuffer) {
        for &min in &self.min_values {
            buffer.encode_f32(min);
        }
        buffer.encode_f32(self.range);
        buffer.encode_u8(self.quantization_bits as u8);
    }

    pub fn decode_parameters(
        buffer: &mut DecoderBuffer<'_>,
        num_components: usize,
    ) -> StatusOr<Self> {
        let mut min_values = Vec::with_capacity(num_components);
        for _ in 0..num_components {
            min_values.push(buffer.decode_f32()?);
        }
        let range = buffer.decode_f32()?;
        let quantization_bits = buffer.decode_u8()? as u32;
        if quantization_bits == 0 || quantization_bits > 30 {
            return Err(corrupt("quantization bits out of range"));
        }
        if !range.is_finite() || range <= 0.0 {
            return Err(corrupt("quantization range is not positive"));
        }
        Ok(Self {
            quantization_bits,
            min_values,
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draco_types::DataType;
    use crate::geometry_attribute::GeometryAttributeType;

    #[test]
    fn test_quantize_dequantize_error_bound() {
        let mut att = PointAttribute::new(
            GeometryAttributeType::Position,
            3,
            DataType::Float32,
            false,
            3,
        );
        att.set_value_from_f32(AttributeValueIndex(0), &[0.0, 0.25, 1.0]);
        att.set_value_from_f32(AttributeValueIndex(1), &[0.5, 0.5, 0.5]);
        att.set_value_from_f32(AttributeValueIndex(2), &[1.0, 0.0, 0.0]);

        let bits = 11;
        let transform = AttributeQuantizationTransform::compute_parameters(&att, bits).unwrap();
        let quantized = transform.transform_attribute(&att);

        let mut restored = PointAttribute::new(
            GeometryAttributeType::Position,
            3,
            DataType::Float32,
            false,
            3,
        );
        transform
            .inverse_transform_attribute(&quantized, &mut restored)
            .unwrap();

        let max_error = 1.0 / ((1 << bits) - 1) as f32;
        let mut orig = [0f32; 3];
        let mut back = [0f32; 3];
        for i in 0..3 {
            att.convert_value(AttributeValueIndex(i), &mut orig);
            restored.convert_value(AttributeValueIndex(i), &mut back);
            for c in 0..3 {
                assert!((orig[c] - back[c]).abs() <= max_error);
            }
        }
    }
}
