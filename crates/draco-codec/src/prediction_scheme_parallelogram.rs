//! Parallelogram prediction. The tip value V of a face is predicted
//! from the opposite face as V = A + B - O, where A and B sit on the
//! shared edge and O is the opposite vertex:
//!
//! ```text
//!     V
//!    / \
//!   A---B
//!    \ /
//!     O
//! ```

use crate::geometry_indices::CornerIndex;
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::prediction_scheme::{MeshPredictionSchemeData, PredictionSchemeTransform};

/// Computes the parallelogram prediction for the data entry |entry_id|
/// reached at |corner|. Fails when the opposite face or any of its
/// entries has not been coded yet.
pub(crate) fn compute_parallelogram_prediction<T: TraversalCornerTable>(
    entry_id: usize,
    corner: CornerIndex,
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    in_data: &[i32],
    num_components: usize,
    out_prediction: &mut [i32],
) -> bool {
    let opp_corner = mesh_data.table.opposite(corner);
    if !opp_corner.is_valid() {
        return false;
    }
    let vertex_to_data = mesh_data.vertex_to_data_map;
    let opp_entry = vertex_to_data[mesh_data.table.vertex(opp_corner).index()];
    let next_entry = vertex_to_data[mesh_data
        .table
        .vertex(mesh_data.table.next(opp_corner))
        .index()];
    let prev_entry = vertex_to_data[mesh_data
        .table
        .vertex(mesh_data.table.previous(opp_corner))
        .index()];
    let entry_id = entry_id as i32;
    if opp_entry < 0
        || next_entry < 0
        || prev_entry < 0
        || opp_entry >= entry_id
        || next_entry >= entry_id
        || prev_entry >= entry_id
    {
        return false;
    }
    let opp = opp_entry as usize * num_components;
    let next = next_entry as usize * num_components;
    let prev = prev_entry as usize * num_components;
    for c in 0..num_components {
        out_prediction[c] = in_data[next + c]
            .wrapping_add(in_data[prev + c])
            .wrapping_sub(in_data[opp + c]);
    }
    true
}

pub fn encode<T: TraversalCornerTable>(
    values: &mut [i32],
    num_components: usize,
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    transform: &mut PredictionSchemeTransform,
) {
    transform.init_encoding(values);
    let mut pred = vec![0i32; num_components];
    // Back to front; prediction reads earlier (still original) entries.
    for p in (1..mesh_data.data_to_corner_map.len()).rev() {
        let corner = mesh_data.data_to_corner_map[p];
        let predicted =
            compute_parallelogram_prediction(p, corner, mesh_data, values, num_components, &mut pred);
        if !predicted {
            // Fall back to the previous entry (difference coding).
            pred.copy_from_slice(&values[(p - 1) * num_components..p * num_components]);
        }
        transform.compute_correction(
            &mut values[p * num_components..(p + 1) * num_components],
            &pred,
        );
    }
    if !mesh_data.data_to_corner_map.is_empty() {
        pred.iter_mut().for_each(|v| *v = 0);
        transform.compute_correction(&mut values[..num_components], &pred);
    }
}

pub fn decode<T: TraversalCornerTable>(
    values: &mut [i32],
    num_components: usize,
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    transform: &PredictionSchemeTransform,
) {
    if mesh_data.data_to_corner_map.is_empty() {
        return;
    }
    let mut pred = vec![0i32; num_components];
    transform.compute_original_value(&mut values[..num_components], &pred);
    for p in 1..mesh_data.data_to_corner_map.len() {
        let corner = mesh_data.data_to_corner_map[p];
        let predicted =
            compute_parallelogram_prediction(p, corner, mesh_data, values, num_components, &mut pred);
        if !predicted {
            pred.copy_from_slice(&values[(p - 1) * num_components..p * num_components]);
        }
        transform.compute_original_value(
            &mut values[p * num_components..(p + 1) * num_components],
            &pred,
        );
    }
}
