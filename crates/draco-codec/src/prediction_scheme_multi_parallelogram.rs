//! Multi-parallelogram prediction: the average of the parallelogram
//! predictions from every already-decoded face around the tip vertex.

use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::prediction_scheme::{MeshPredictionSchemeData, PredictionSchemeTransform};
use crate::prediction_scheme_parallelogram::compute_parallelogram_prediction;

/// Accumulates the valid parallelogram predictions around the vertex of
/// |start_corner|. Returns the number of parallelograms that applied.
fn accumulate_predictions<T: TraversalCornerTable>(
    entry_id: usize,
    start_corner: crate::geometry_indices::CornerIndex,
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    values: &[i32],
    num_components: usize,
    pred_sum: &mut [i32],
    single_pred: &mut [i32],
) -> usize {
    pred_sum.iter_mut().for_each(|v| *v = 0);
    let mut num_parallelograms = 0;

    // Circulate the 1-ring: swing left first, then right from the start
    // if a boundary interrupted the walk.
    let mut corner = start_corner;
    let mut first_pass = true;
    while corner.is_valid() {
        if compute_parallelogram_prediction(
            entry_id,
            corner,
            mesh_data,
            values,
            num_components,
            single_pred,
        ) {
            for c in 0..num_components {
                pred_sum[c] = pred_sum[c].wrapping_add(single_pred[c]);
            }
            num_parallelograms += 1;
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

pub fn encode<T: TraversalCornerTable>(
    values: &mut [i32],
    num_components: usize,
    mesh_data: &MeshPredictionSchemeData<'_, T>,
    transform: &mut PredictionSchemeTransform,
) {
    transform.init_encoding(values);
    let mut pred_sum = vec![0i32; num_components];
    let mut single_pred = vec![0i32; num_components];
    for p in (1..mesh_data.data_to_corner_map.len()).rev() {
        let corner = mesh_data.data_to_corner_map[p];
        let num_parallelograms = accumulate_predictions(
            p,
            corner,
            mesh_data,
            values,
            num_components,
            &mut pred_sum,
            &mut single_pred,
        );
        if num_parallelograms > 0 {
            for c in 0..num_components {
                pred_sum[c] /= num_parallelograms as i32;
            }
        } else {
            pred_sum.copy_from_slice(&values[(p - 1) * num_components..p * num_components]);
        }
        transform.compute_correction(
            &mut values[p * num_components..(p + 1) * num_components],
            &pred_sum,
        );
    }
    if !mesh_data.data_to_corner_map.is_empty() {
        pred_sum.iter_mut().for_each(|v| *v = 0);
        transform.compute_correction(&mut values[..num_components], &pred_sum);
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
    let mut pred_sum = vec![0i32; num_components];
    let mut single_pred = vec![0i32; num_components];
    transform.compute_original_value(&mut values[..num_components], &pred_sum);
    for p in 1..mesh_data.data_to_corner_map.len() {
        let corner = mesh_data.data_to_corner_map[p];
        let num_parallelograms = accumulate_predictions(
            p,
            corner,
            mesh_data,
            values,
            num_components,
            &mut pred_sum,
            &mut single_pred,
        );
        if num_parallelograms > 0 {
            for c in 0..num_components {
                pred_sum[c] /= num_parallelograms as i32;
            }
        } else {
            pred_sum.copy_from_slice(&values[(p - 1) * num_components..p * num_components]);
        }
        transform.compute_original_value(
            &mut values[p * num_components..(p + 1) * num_components],
            &pred_sum,
        );
    }
}
