//! Decoder counterpart of the integer attribute coding path.

use crate::bit_utils::convert_symbol_to_signed_int;
use crate::decoder_buffer::DecoderBuffer;
use crate::prediction_scheme::{
    MeshPredictionSchemeData, PredictionSchemeMethod, PredictionSchemeTransform,
    PredictionSchemeTransformType,
};
use crate::prediction_scheme_constrained_multi_parallelogram::ConstrainedMultiParallelogramDecoder;
use crate::prediction_scheme_difference as difference;
use crate::prediction_scheme_geometric_normal::GeometricNormalDecoder;
use crate::prediction_scheme_multi_parallelogram as multi_parallelogram;
use crate::prediction_scheme_parallelogram as parallelogram;
use crate::prediction_scheme_tex_coords::TexCoordsPortableDecoder;
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::sequential_integer_attribute_encoder::MeshPredictionContext;
use crate::status::{corrupt, StatusOr};
use crate::symbol_encoding::decode_symbols;

/// Decodes one integer attribute block into `num_values * num_components`
/// integers.
pub fn decode_integer_values<T: TraversalCornerTable>(
    num_values: usize,
    num_components: usize,
    context: Option<&MeshPredictionContext<'_, T>>,
    in_buffer: &mut DecoderBuffer<'_>,
) -> StatusOr<Vec<i32>> {
    if num_values == 0 {
        return Ok(Vec::new());
    }

    let method = PredictionSchemeMethod::from_i8(in_buffer.decode_i8()?)
        .ok_or_else(|| corrupt("unknown prediction method"))?;
    let mut transform = if method == PredictionSchemeMethod::None {
        PredictionSchemeTransform::Delta
    } else {
        let transform_type = PredictionSchemeTransformType::from_i8(in_buffer.decode_i8()?)
            .ok_or_else(|| corrupt("unknown prediction transform"))?;
        PredictionSchemeTransform::new_for_decoding(transform_type)
    };

    let mut values = vec![0i32; num_values * num_components];
    let compressed = in_buffer.decode_u8()?;
    if compressed == 1 {
        let mut symbols = vec![0u32; values.len()];
        decode_symbols(values.len(), num_components, in_buffer, &mut symbols)?;
        if transform.are_corrections_positive() {
            for (value, &symbol) in values.iter_mut().zip(&symbols) {
                *value = symbol as i32;
            }
        } else {
            for (value, &symbol) in values.iter_mut().zip(&symbols) {
                *value = convert_symbol_to_signed_int(symbol);
            }
        }
    } else {
        // Uncompressed fallback: raw little-endian entries of the
        // declared byte width.
        let num_bytes = in_buffer.decode_u8()? as usize;
        if num_bytes == 0 || num_bytes > 4 {
            return Err(corrupt("invalid raw integer width"));
        }
        let mut entry = [0u8; 4];
        for value in values.iter_mut() {
            in_buffer.decode_data(&mut entry[..num_bytes])?;
            *value = i32::from_le_bytes(entry);
            entry = [0u8; 4];
        }
    }

    let mesh_data = context.map(|ctx| MeshPredictionSchemeData {
        table: ctx.table,
        data_to_corner_map: ctx.data_to_corner_map,
        vertex_to_data_map: ctx.vertex_to_data_map,
    });
    let require_mesh_data = || corrupt("mesh prediction scheme without mesh data");

    match method {
        PredictionSchemeMethod::None => {}
        PredictionSchemeMethod::Difference => {
            transform.decode_transform_data(in_buffer)?;
            difference::decode(&mut values, num_components, &transform);
        }
        PredictionSchemeMethod::Parallelogram => {
            let data = mesh_data.as_ref().ok_or_else(require_mesh_data)?;
            transform.decode_transform_data(in_buffer)?;
            parallelogram::decode(&mut values, num_components, data, &transform);
        }
        PredictionSchemeMethod::MultiParallelogram => {
            let data = mesh_data.as_ref().ok_or_else(require_mesh_data)?;
            transform.decode_transform_data(in_buffer)?;
            multi_parallelogram::decode(&mut values, num_components, data, &transform);
        }
        PredictionSchemeMethod::ConstrainedMultiParallelogram => {
            let data = mesh_data.as_ref().ok_or_else(require_mesh_data)?;
            let mut decoder = ConstrainedMultiParallelogramDecoder::new();
            decoder.decode_prediction_data(in_buffer)?;
            transform.decode_transform_data(in_buffer)?;
            decoder.decode(&mut values, num_components, data, &transform)?;
        }
        PredictionSchemeMethod::TexCoordsPortable => {
            let ctx = context.ok_or_else(require_mesh_data)?;
            if num_components != 2 {
                return Err(corrupt("texture prediction needs two components"));
            }
            if ctx.pos_by_point.is_empty() {
                return Err(corrupt("texture prediction without decoded positions"));
            }
            let data = mesh_data.as_ref().unwrap();
            let mut decoder = TexCoordsPortableDecoder::new();
            decoder.decode_prediction_data(in_buffer)?;
            transform.decode_transform_data(in_buffer)?;
            decoder.decode(
                &mut values,
                data,
                &transform,
                ctx.pos_by_point,
                ctx.entry_to_point,
            )?;
        }
        PredictionSchemeMethod::GeometricNormal => {
            let ctx = context.ok_or_else(require_mesh_data)?;
            if num_components != 2 {
                return Err(corrupt("normal prediction runs in octahedral space"));
            }
            if ctx.pos_by_corner.is_empty() {
                return Err(corrupt("normal prediction without decoded positions"));
            }
            let data = mesh_data.as_ref().unwrap();
            let mut decoder = GeometricNormalDecoder::new();
            decoder.decode_prediction_data(in_buffer)?;
            transform.decode_transform_data(in_buffer)?;
            decoder.decode(&mut values, data, &transform, ctx.pos_by_corner)?;
        }
    }
    Ok(values)
}
