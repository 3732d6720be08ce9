//! Texture coordinate prediction. The UV of a tip vertex is predicted
//! from the already-coded UVs of the adjacent face corners using the
//! geometry of the corresponding 3D triangle: the tip is projected onto
//! the shared edge, and the same projection parameters are applied in UV
//! space. The side of the edge the tip falls on is ambiguous, so one
//! orientation bit per predicted entry is transmitted.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_indices::PointIndex;
use crate::math_utils::int_sqrt;
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::prediction_scheme::{MeshPredictionSchemeData, PredictionSchemeTransform};
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::{corrupt, Status};

pub const NUM_COMPONENTS: usize = 2;

struct PredictorState<'a> {
    /// Portable (integer) positions indexed by point id.
    pos_by_point: &'a [[i64; 3]],
    /// Point each UV entry was sampled at.
    entry_to_point: &'a [PointIndex],
    orientations: Vec<bool>,
}

impl<'a> PredictorState<'a> {
    fn position(&self, entry_id: i32) -> [i64; 3] {
        self.pos_by_point[self.entry_to_point[entry_id as usize].index()]
    }

    fn tex_coord(&self, data: &[i32], entry_id: i32) -> [i64; 2] {
        let offset = entry_id as usize * NUM_COMPONENTS;
        [data[offset] as i64, data[offset + 1] as i64]
    }

    /// Computes the prediction for |entry_id|. In encoding mode the true
    /// UV is consulted to pick (and record) the orientation; in decoding
    /// mode orientations are popped from the decoded stack.
    fn compute_predicted_value<T: TraversalCornerTable>(
        &mut self,
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        corner: crate::geometry_indices::CornerIndex,
        data: &[i32],
        entry_id: i32,
        encoding: bool,
        predicted: &mut [i32; 2],
    ) -> Status {
        let table = mesh_data.table;
        let next_corner = table.next(corner);
        let prev_corner = table.previous(corner);
        let next_entry = mesh_data.vertex_to_data_map[table.vertex(next_corner).index()];
        let prev_entry = mesh_data.vertex_to_data_map[table.vertex(prev_corner).index()];

        if prev_entry >= 0 && next_entry >= 0 && prev_entry < entry_id && next_entry < entry_id {
            let n_uv = self.tex_coord(data, next_entry);
            let p_uv = self.tex_coord(data, prev_entry);
            if n_uv == p_uv {
                predicted[0] = p_uv[0] as i32;
                predicted[1] = p_uv[1] as i32;
                return Ok(());
            }
            let tip_pos = self.position(entry_id);
            let next_pos = self.position(next_entry);
            let prev_pos = self.position(prev_entry);

            let pn = sub3(prev_pos, next_pos);
            let pn_norm2_squared = dot3(pn, pn);
            if pn_norm2_squared != 0 {
                let cn = sub3(tip_pos, next_pos);
                let cn_dot_pn = dot3(pn, cn);
                let pn_uv = [p_uv[0] - n_uv[0], p_uv[1] - n_uv[1]];

                // Projection of the tip onto the edge, scaled by the
                // squared edge length to stay in integers.
                let x_uv = [
                    n_uv[0] * pn_norm2_squared + cn_dot_pn * pn_uv[0],
                    n_uv[1] * pn_norm2_squared + cn_dot_pn * pn_uv[1],
                ];
                let x_pos = [
                    next_pos[0] + (cn_dot_pn * pn[0]) / pn_norm2_squared,
                    next_pos[1] + (cn_dot_pn * pn[1]) / pn_norm2_squared,
                    next_pos[2] + (cn_dot_pn * pn[2]) / pn_norm2_squared,
                ];
                let cx = sub3(tip_pos, x_pos);
                let cx_norm2_squared = dot3(cx, cx);

                // The perpendicular offset in UV space is the rotated
                // edge direction scaled to the 3D distance.
                let norm_squared = int_sqrt((cx_norm2_squared * pn_norm2_squared) as u64) as i64;
                let cx_uv = [pn_uv[1] * norm_squared, -pn_uv[0] * norm_squared];

                let orientation = if encoding {
                    // Pick the side that matches the true value.
                    let actual = self.tex_coord(data, entry_id);
                    let pred_pos = [
                        (x_uv[0] + cx_uv[0]) / pn_norm2_squared,
                        (x_uv[1] + cx_uv[1]) / pn_norm2_squared,
                    ];
                    let pred_neg = [
                        (x_uv[0] - cx_uv[0]) / pn_norm2_squared,
                        (x_uv[1] - cx_uv[1]) / pn_norm2_squared,
                    ];
                    let err_pos = (pred_pos[0] - actual[0]).abs() + (pred_pos[1] - actual[1]).abs();
                    let err_neg = (pred_neg[0] - actual[0]).abs() + (pred_neg[1] - actual[1]).abs();
                    let orientation = err_pos <= err_neg;
                    self.orientations.push(orientation);
                    orientation
                } else {
                    self.orientations
                        .pop()
                        .ok_or_else(|| corrupt("texture orientation stream exhausted"))?
                };

                let predicted_uv = if orientation {
                    [
                        (x_uv[0] + cx_uv[0]) / pn_norm2_squared,
                        (x_uv[1] + cx_uv[1]) / pn_norm2_squared,
                    ]
                } else {
                    [
                        (x_uv[0] - cx_uv[0]) / pn_norm2_squared,
                        (x_uv[1] - cx_uv[1]) / pn_norm2_squared,
                    ]
                };
                predicted[0] = predicted_uv[0] as i32;
                predicted[1] = predicted_uv[1] as i32;
                return Ok(());
            }
        }

        // Degenerate or incomplete neighborhood: fall back to the best
        // available earlier entry.
        let fallback_entry = if prev_entry >= 0 && prev_entry < entry_id {
            prev_entry
        } else if next_entry >= 0 && next_entry < entry_id {
            next_entry
        } else if entry_id > 0 {
            entry_id - 1
        } else {
            predicted[0] = 0;
            predicted[1] = 0;
            return Ok(());
        };
        let uv = self.tex_coord(data, fallback_entry);
        predicted[0] = uv[0] as i32;
        predicted[1] = uv[1] as i32;
        Ok(())
    }
}

fn sub3(a: [i64; 3], b: [i64; 3]) -> [i64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot3(a: [i64; 3], b: [i64; 3]) -> i64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub struct TexCoordsPortableEncoder {
    orientations: Vec<bool>,
}

impl TexCoordsPortableEncoder {
    pub fn new() -> Self {
        Self {
            orientations: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encode<T: TraversalCornerTable>(
        &mut self,
        values: &mut [i32],
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        transform: &mut PredictionSchemeTransform,
        pos_by_point: &[[i64; 3]],
        entry_to_point: &[PointIndex],
    ) -> Status {
        transform.init_encoding(values);
        let mut state = PredictorState {
            pos_by_point,
            entry_to_point,
            orientations: Vec::new(),
        };
        let mut predicted = [0i32; 2];
        for p in (1..mesh_data.data_to_corner_map.len()).rev() {
            let corner = mesh_data.data_to_corner_map[p];
            state.compute_predicted_value(mesh_data, corner, values, p as i32, true, &mut predicted)?;
            transform.compute_correction(
                &mut values[p * NUM_COMPONENTS..(p + 1) * NUM_COMPONENTS],
                &predicted,
            );
        }
        if !mesh_data.data_to_corner_map.is_empty() {
            transform.compute_correction(&mut values[..NUM_COMPONENTS], &[0, 0]);
        }
        self.orientations = state.orientations;
        Ok(())
    }

    pub fn encode_prediction_data(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_u32(self.orientations.len() as u32);
        let mut last_orientation = true;
        let mut encoder = RAnsBitEncoder::new();
        encoder.start_encoding();
        for &orientation in &self.orientations {
            encoder.encode_bit(orientation == last_orientation);
            last_orientation = orientation;
        }
        encoder.end_encoding(buffer);
    }
}

impl Default for TexCoordsPortableEncoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TexCoordsPortableDecoder {
    orientations: Vec<bool>,
}

impl TexCoordsPortableDecoder {
    pub fn new() -> Self {
        Self {
            orientations: Vec::new(),
        }
    }

    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        let num_orientations = buffer.decode_u32()? as usize;
        self.orientations.clear();
        self.orientations.reserve(num_orientations);
        let mut last_orientation = true;
        let mut decoder = RAnsBitDecoder::new();
        decoder.start_decoding(buffer)?;
        for _ in 0..num_orientations {
            if !decoder.decode_next_bit() {
                last_orientation = !last_orientation;
            }
            self.orientations.push(last_orientation);
        }
        decoder.end_decoding();
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn decode<T: TraversalCornerTable>(
        &mut self,
        values: &mut [i32],
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        transform: &PredictionSchemeTransform,
        pos_by_point: &[[i64; 3]],
        entry_to_point: &[PointIndex],
    ) -> Status {
        if mesh_data.data_to_corner_map.is_empty() {
            return Ok(());
        }
        let mut state = PredictorState {
            pos_by_point,
            entry_to_point,
            orientations: std::mem::take(&mut self.orientations),
        };
        let mut predicted = [0i32; 2];
        transform.compute_original_value(&mut values[..NUM_COMPONENTS], &[0, 0]);
        for p in 1..mesh_data.data_to_corner_map.len() {
            let corner = mesh_data.data_to_corner_map[p];
            state.compute_predicted_value(mesh_data, corner, values, p as i32, false, &mut predicted)?;
            transform.compute_original_value(
                &mut values[p * NUM_COMPONENTS..(p + 1) * NUM_COMPONENTS],
                &predicted,
            );
        }
        Ok(())
    }
}

impl Default for TexCoordsPortableDecoder {
    fn default() -> Self {
        Self::new()
    }
}
