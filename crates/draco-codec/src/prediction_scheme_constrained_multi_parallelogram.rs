//! Constrained multi-parallelogram prediction. The encoder selects, per
//! vertex, the subset of available parallelograms (at most four) that
//! minimizes the L1 prediction error, and transmits one crease bit per
//! candidate edge. The bits live in separate contexts indexed by the
//! number of available parallelograms, so the decoder always reads
//! exactly k bits in the k-available context.

use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::prediction_scheme::{MeshPredictionSchemeData, PredictionSchemeTransform};
use crate::prediction_scheme_parallelogram::compute_parallelogram_prediction;
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::{corrupt, Status};

const MAX_NUM_PARALLELOGRAMS: usize = 4;

/// Selected prediction mode; only the optimal search is defined.
const OPTIMAL_MULTI_PARALLELOGRAM: u8 = 0;

/// Lexicographic next permutation over a slice of bools (false < true).
fn next_permutation(flags: &mut [bool]) -> bool {
    if flags.len() < 2 {
        return false;
    }
    let mut i = flags.len() - 1;
    while i > 0 && flags[i - 1] >= flags[i] {
        i -= 1;
    }
    if i == 0 {
        flags.reverse();
        return false;
    }
    let mut j = flags.len() - 1;
    while flags[j] <= flags[i - 1] {
        j -= 1;
    }
    flags.swap(i - 1, j);
    flags[i..].reverse();
    true
}

/// Collects up to four parallelogram predictions around the vertex of
/// |start_corner| into |pred_vals|.
fn gather_parallelograms<T: TraversalCornerTable>(
    entry_id: usize,
    start_corner: crate::geometry_indices::CornerIndex,
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    values: &[i32],
    num_components: usize,
    pred_vals: &mut [Vec<i32>],
) -> usize {
    let mut num_parallelograms = 0;
    let mut corner = start_corner;
    let mut first_pass = true;
    while corner.is_valid() {
        if compute_parallelogram_prediction(
            entry_id,
            corner,
            mesh_data,
            values,
            num_components,
            &mut pred_vals[num_parallelograms],
        ) {
            num_parallelograms += 1;
            if num_parallelograms == MAX_NUM_PARALLELOGRAMS {
                break;
            }
        }
        if first_pass {
            corner = mesh_data.table.swing_left(corner);
        } else {
            corner = mesh_data.table.swing_right(corner);
        }
        if corner == start_corner {
            break;
        }
        if !corner.is_valid() && first_pass {
            first_pass = false;
            corner = mesh_data.table.swing_right(start_corner);
        }
    }
    num_parallelograms
}

#[derive(Default)]
pub struct ConstrainedMultiParallelogramEncoder {
    is_crease_edge: [Vec<bool>; MAX_NUM_PARALLELOGRAMS],
}

impl ConstrainedMultiParallelogramEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode<T: TraversalCornerTable>(
        &mut self,
        values: &mut [i32],
        num_components: usize,
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        transform: &mut PredictionSchemeTransform,
    ) {
        transform.init_encoding(values);
        let mut pred_vals: Vec<Vec<i32>> =
            vec![vec![0i32; num_components]; MAX_NUM_PARALLELOGRAMS];
        let mut multi_pred_vals = vec![0i32; num_components];
        let mut excluded = [false; MAX_NUM_PARALLELOGRAMS];

        for p in (1..mesh_data.data_to_corner_map.len()).rev() {
            let start_corner = mesh_data.data_to_corner_map[p];
            let num_parallelograms = gather_parallelograms(
                p,
                start_corner,
                mesh_data,
                values,
                num_components,
                &mut pred_vals,
            );

            let dst_offset = p * num_components;
            let src_offset = (p - 1) * num_components;

            // Baseline: plain difference from the previous entry.
            let mut best_error: i64 = (0..num_components)
                .map(|c| (values[dst_offset + c] as i64 - values[src_offset + c] as i64).abs())
                .sum();
            let mut best_configuration = 0u8;
            let mut best_prediction: Vec<i32> =
                values[src_offset..src_offset + num_components].to_vec();

            // Try every subset size, permuting over the excluded set.
            for num_used in 1..=num_parallelograms {
                excluded[..num_parallelograms].fill(true);
                excluded[..num_used].fill(false);
                loop {
                    multi_pred_vals.iter_mut().for_each(|v| *v = 0);
                    let mut configuration = 0u8;
                    for (j, &is_excluded) in excluded[..num_parallelograms].iter().enumerate() {
                        if is_excluded {
                            continue;
                        }
                        for c in 0..num_components {
                            multi_pred_vals[c] =
                                multi_pred_vals[c].wrapping_add(pred_vals[j][c]);
                        }
                        configuration |= 1 << j;
                    }
                    let mut error: i64 = 0;
                    for c in 0..num_components {
                        multi_pred_vals[c] /= num_used as i32;
                        error +=
                            (multi_pred_vals[c] as i64 - values[dst_offset + c] as i64).abs();
                    }
                    if error < best_error {
                        best_error = error;
                        best_configuration = configuration;
                        best_prediction.copy_from_slice(&multi_pred_vals);
                    }
                    if !next_permutation(&mut excluded[..num_parallelograms]) {
                        break;
                    }
                }
            }

            if num_parallelograms > 0 {
                let context = num_parallelograms - 1;
                for i in 0..num_parallelograms {
                    // Unused parallelogram means its edge is a crease.
                    self.is_crease_edge[context].push(best_configuration & (1 << i) == 0);
                }
            }
            transform.compute_correction(
                &mut values[dst_offset..dst_offset + num_components],
                &best_prediction,
            );
        }
        if !mesh_data.data_to_corner_map.is_empty() {
            let zero = vec![0i32; num_components];
            transform.compute_correction(&mut values[..num_components], &zero);
        }
    }

    pub fn encode_prediction_data(&self, buffer: &mut EncoderBuffer) {
        buffer.encode_u8(OPTIMAL_MULTI_PARALLELOGRAM);
        for (i, crease_edges) in self.is_crease_edge.iter().enumerate() {
            // Context i always holds groups of i + 1 bits per vertex.
            let group = i + 1;
            buffer.encode_varint(crease_edges.len() as u64);
            if crease_edges.is_empty() {
                continue;
            }
            let mut encoder = RAnsBitEncoder::new();
            encoder.start_encoding();
            // Vertex groups reversed to match decode order; bits within
            // a group stay in place.
            let mut j = crease_edges.len() - group;
            loop {
                for k in 0..group {
                    encoder.encode_bit(crease_edges[j + k]);
                }
                if j == 0 {
                    break;
                }
                j -= group;
            }
            encoder.end_encoding(buffer);
        }
    }
}

#[derive(Default)]
pub struct ConstrainedMultiParallelogramDecoder {
    is_crease_edge: [Vec<bool>; MAX_NUM_PARALLELOGRAMS],
}

impl ConstrainedMultiParallelogramDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode_prediction_data(&mut self, buffer: &mut DecoderBuffer<'_>) -> Status {
        let mode = buffer.decode_u8()?;
        if mode != OPTIMAL_MULTI_PARALLELOGRAM {
            return Err(corrupt(format!(
                "unsupported multi-parallelogram mode {}",
                mode
            )));
        }
        for crease_edges in self.is_crease_edge.iter_mut() {
            let num_flags = buffer.decode_varint_u32()? as usize;
            if num_flags > 0 {
                let mut decoder = RAnsBitDecoder::new();
                decoder.start_decoding(buffer)?;
                crease_edges.reserve(num_flags);
                for _ in 0..num_flags {
                    crease_edges.push(decoder.decode_next_bit());
                }
                decoder.end_decoding();
            }
        }
        Ok(())
    }

    pub fn decode<T: TraversalCornerTable>(
        &mut self,
        values: &mut [i32],
        num_components: usize,
        mesh_data: &MeshPredictionSchemeData<'_, T>,
        transform: &PredictionSchemeTransform,
    ) -> Status {
        if mesh_data.data_to_corner_map.is_empty() {
            return Ok(());
        }
        let mut pred_vals: Vec<Vec<i32>> =
            vec![vec![0i32; num_components]; MAX_NUM_PARALLELOGRAMS];
        let mut multi_pred_vals = vec![0i32; num_components];
        let mut is_crease_edge_pos = [0usize; MAX_NUM_PARALLELOGRAMS];

        let zero = vec![0i32; num_components];
        transform.compute_original_value(&mut values[..num_components], &zero);

        for p in 1..mesh_data.data_to_corner_map.len() {
            let start_corner = mesh_data.data_to_corner_map[p];
            let num_parallelograms = gather_parallelograms(
                p,
                start_corner,
                mesh_data,
                values,
                num_components,
                &mut pred_vals,
            );

            let mut num_used = 0usize;
            if num_parallelograms > 0 {
                multi_pred_vals.iter_mut().for_each(|v| *v = 0);
                let context = num_parallelograms - 1;
                for pred in pred_vals.iter().take(num_parallelograms) {
                    let pos = is_crease_edge_pos[context];
                    let is_crease = *self.is_crease_edge[context].get(pos).ok_or_else(|| {
                        corrupt("crease bit stream exhausted")
                    })?;
                    is_crease_edge_pos[context] += 1;
                    if !is_crease {
                        num_used += 1;
                        for c in 0..num_components {
                            multi_pred_vals[c] = multi_pred_vals[c].wrapping_add(pred[c]);
                        }
                    }
                }
            }
            let dst_offset = p * num_components;
            if num_used == 0 {
                let pred: Vec<i32> =
                    values[(p - 1) * num_components..p * num_components].to_vec();
                transform.compute_original_value(
                    &mut values[dst_offset..dst_offset + num_components],
                    &pred,
                );
            } else {
                for c in 0..num_components {
                    multi_pred_vals[c] /= num_used as i32;
                }
                transform.compute_original_value(
                    &mut values[dst_offset..dst_offset + num_components],
                    &multi_pred_vals,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_permutation_enumerates_subsets() {
        let mut flags = [false, true, true];
        let mut count = 1;
        while next_permutation(&mut flags) {
            count += 1;
        }
        // Three positions for the single zero.
        assert_eq!(count, 3);
    }

    #[test]
    fn test_next_permutation_single_element() {
        let mut flags = [true];
        assert!(!next_permutation(&mut flags));
    }
}
