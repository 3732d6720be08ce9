//! Geometric normal prediction. The normal of a vertex is predicted as
//! the area-weighted average of the one-ring face normals computed from
//! the decoded positions, then octahedral-quantized; corrections are
//! taken in octahedral (s, t) space. A per-entry flip bit resolves the
//! sign ambiguity of the predicted direction.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_indices::CornerIndex;
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::normal_compression_utils::unit_vector_to_quantized_octahedral_coords;
use crate::prediction_scheme::{MeshPredictionSchemeData, PredictionSchemeTransform};
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::{corrupt, Status};

pub const NUM_COMPONENTS: usize = 2;

/// Sum of cross products over the faces around the vertex of |corner|.
fn predict_normal_from_ring<T: TraversalCornerTable>(
    table: &T,
    start_corner: CornerIndex,
    pos_by_corner: &[[i64; 3]],
) -> [i64; 3] {
    let mut normal = [0i64; 3];
    let pos_cent = pos_by_corner[start_corner.index()];

    let mut corner = start_corner;
    let mut first_pass = true;
    while corner.is_valid() {
        let pos_next = pos_by_corner[table.next(corner).index()];
        let pos_prev = pos_by_corner[table.previous(corner).index()];
        let delta_next = sub3(pos_next, pos_cent);
        let delta_prev = sub3(pos_prev, pos_cent);
        let cross = cross3(delta_next, delta_prev);
        normal[0] += cross[0];
        normal[1] += cross[1];
        normal[2] += cross[2];

        if first_pass {
            corner = table.swing_left(corner);
        } else {
            corner = table.swing_right(corner);
        }
        if corner == start_corner {
            break;
        }
        if !corner.is_valid() && first_pass {
            first_pass = false;
            corner = table.swing_right(start_corner);
        }
    }
    normal
}

fn sub3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn octahedral_prediction(normal: [i64; 3], flip: bool, quantization_bits: u32) -> [i32; 2] {
    let sign = if flip { -1.0 } else { 1.0 };
    let float_normal = [
        normal[0] as f64 * sign,
        normal[1] as f64 * sign,
        normal[2] as f64 * sign,
    ];
    let (s, t) = unit_vector_to_quantized_octahedral_coords(float_normal, quantization_bits);
    [s, t]
}

pub struct GeometricNormalEncoder {
    quantization_bits: u32,
    flip_bits: Vec<bool>,
}

impl GeometricNormalEncoder {
    pub fn new(quantization_bits: u32) -> Self {
        Self {
            quantization_bits,
            flip_bits: Vec::new(),
        }
    }

    pub fn encode<T: TraversalCornerTable>(
        &mut self,
        values: &mut [i32],
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        transform: &mut PredictionSchemeTransform,
        pos_by_corner: &[[i64; 3]],
    ) -> Status {
        transform.init_encoding(values);
        for p in (1..mesh_data.data_to_corner_map.len()).rev() {
            let corner = mesh_data.data_to_corner_map[p];
            let normal = predict_normal_from_ring(mesh_data.table, corner, pos_by_corner);

            let actual = [
                values[p * NUM_COMPONENTS],
                values[p * NUM_COMPONENTS + 1],
            ];
            let pred = octahedral_prediction(normal, false, self.quantization_bits);
            let pred_flipped = octahedral_prediction(normal, true, self.quantization_bits);
            let err = (pred[0] - actual[0]).abs() as i64 + (pred[1] - actual[1]).abs() as i64;
            let err_flipped = (pred_flipped[0] - actual[0]).abs() as i64
                + (pred_flipped[1] - actual[1]).abs() as i64;
            let flip = err_flipped < err;
            self.flip_bits.push(flip);
            let predicted = if flip { pred_flipped } else { pred };

            transform.compute_correction(
                &mut values[p * NUM_COMPONENTS..(p + 1) * NUM_COMPONENTS],
                &predicted,
            );
        }
        if !mesh_data.data_to_corner_map.is_empty() {
            transform.compute_correction(&mut values[..NUM_COMPONENTS], &[0, 0]);
        }
        Ok(())
    }

    pub fn encode_prediction_data(&self, buffer: &mut EncoderBuffer) {
        // The prediction runs in octahedral space, so the decoder needs
        // the quantization before it can mirror the predictions.
        buffer.encode_u8(self.quantization_bits as u8);
        buffer.encode_varint(self.flip_bits.len() as u64);
        let mut encoder = RAnsBitEncoder::new();
        encoder.start_encoding();
        for &bit in &self.flip_bits {
            encoder.encode_bit(bit);
        }
        encoder.end_encoding(buffer);
    }
}

#[derive(Default)]
pub struct GeometricNormalDecoder {
    quantization_bits: u32,
    flip_bits: Vec<bool>,
}

impl GeometricNormalDecoder {
    pub fn new() -> Self {
        Self {
            quantization_bits: 0,
            flip_bits: Vec::new(),
        }
    }

    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        self.quantization_bits = buffer.decode_u8()? as u32;
        if self.quantization_bits == 0 || self.quantization_bits > 30 {
            return Err(corrupt("normal prediction quantization out of range"));
        }
        let num_flips = buffer.decode_varint_u32()? as usize;
        let mut decoder = RAnsBitDecoder::new();
        decoder.start_decoding(buffer)?;
        self.flip_bits.reserve(num_flips);
        for _ in 0..num_flips {
            self.flip_bits.push(decoder.decode_next_bit());
        }
        decoder.end_decoding();
        Ok(())
    }

    pub fn decode<T: TraversalCornerTable>(
        &mut self,
        values: &mut [i32],
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        transform: &PredictionSchemeTransform,
        pos_by_corner: &[[i64; 3]],
    ) -> Status {
        if mesh_data.data_to_corner_map.is_empty() {
            return Ok(());
        }
        transform.compute_original_value(&mut values[..NUM_COMPONENTS], &[0, 0]);
        for p in 1..mesh_data.data_to_corner_map.len() {
            let corner = mesh_data.data_to_corner_map[p];
            let normal = predict_normal_from_ring(mesh_data.table, corner, pos_by_corner);
            let flip = self
                .flip_bits
                .pop()
                .ok_or_else(|| corrupt("normal flip stream exhausted"))?;
            let predicted = octahedral_prediction(normal, flip, self.quantization_bits);
            transform.compute_original_value(
                &mut values[p * NUM_COMPONENTS..(p + 1) * NUM_COMPONENTS],
                &predicted,
            );
        }
        Ok(())
    }
}
