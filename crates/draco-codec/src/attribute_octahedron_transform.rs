//! Octahedral transform for unit normal attributes: each normal becomes
//! a pair of quantized octahedral coordinates.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::AttributeValueIndex;
use crate::normal_compression_utils::{
    quantized_octahedral_coords_to_unit_vector, unit_vector_to_quantized_octahedral_coords,
};
use crate::status::{corrupt, DracoError, Status, StatusOr};

#[derive(Debug, Clone)]
pub struct AttributeOctahedronTransform {
    pub quantization_bits: u32,
}

impl AttributeOctahedronTransform {
    pub fn new(quantization_bits: u32) -> StatusOr<Self> {
        if quantization_bits == 0 || quantization_bits > 30 {
            return Err(DracoError::InvalidConfig(format!(
                "unsupported normal quantization bits: {}",
                quantization_bits
            )));
        }
        Ok(Self { quantization_bits })
    }

    /// Projects every normal value onto the octahedron; output has two
    /// i32 coordinates per value, in value-index order.
    pub fn transform_attribute(&self, att: &PointAttribute) -> Vec<i32> {
        let mut out = Vec::with_capacity(att.size() * 2);
        let mut normal = [0f64; 3];
        for i in 0..att.size() {
            att.convert_value(AttributeValueIndex(i as u32), &mut normal);
            let (s, t) = unit_vector_to_quantized_octahedral_coords(normal, self.quantization_bits);
            out.push(s);
            out.push(t);
        }
        out
    }

    /// Restores unit normals from octahedral coordinates into |att|.
    pub fn inverse_transform_attribute(&self, values: &[i32], att: &mut PointAttribute) -> Status {
        let num_values = values.len() / 2;
        att.resize(num_values);
        for i in 0..num_values {
            let normal = quantized_octahedral_coords_to_unit_vector(
                values[i * 2],
                values[i * 2 + 1],
                self.quantization_bits,
            );
            att.set_value_from_f32(
                AttributeValueIndex(i as u32),
                &[normal[0] as f32, normal[1] as f32, normal[2] as f32],
            );
        }
        Ok(())
    }

    pub fn encode_parameters(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_u8(self.quantization_bits as u8);
    }

    pub fn decode_parameters(buffer: &mut DecoderBuffer<'_>) -> StatusOr<Self> {
        let quantization_bits = buffer.decode_u8()? as u32;
        if quantization_bits == 0 || quantization_bits > 30 {
            return Err(corrupt("normal quantization bits out of range"));
        }
        Ok(Self { quantization_bits })
    }
}
