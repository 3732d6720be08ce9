//! Integer attribute coding: prediction, correction transform, signed
//! to unsigned symbol mapping and entropy coding, in that order. The
//! per-attribute block is `method:i8, [transform:i8], compressed:u8,
//! symbols, prediction data, transform data`.

use crate::bit_utils::convert_signed_int_to_symbol;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_indices::{CornerIndex, PointIndex};
use crate::mesh_traversal_sequencer::TraversalCornerTable;
use crate::prediction_scheme::{
    MeshPredictionSchemeData, PredictionSchemeMethod, PredictionSchemeTransform, WrapTransform,
};
use crate::prediction_scheme_constrained_multi_parallelogram::ConstrainedMultiParallelogramEncoder;
use crate::prediction_scheme_geometric_normal::GeometricNormalEncoder;
use crate::prediction_scheme_tex_coords::TexCoordsPortableEncoder;
use crate::prediction_scheme_difference as difference;
use crate::prediction_scheme_multi_parallelogram as multi_parallelogram;
use crate::prediction_scheme_parallelogram as parallelogram;
use crate::status::{DracoError, Status};
use crate::symbol_encoding::{encode_symbols, SymbolEncodingOptions};

/// Inputs the mesh-aware prediction schemes read. Position lookups are
/// in the portable (integer) domain shared with the decoder.
pub struct MeshPredictionContext<'a, T: TraversalCornerTable> {
    pub table: &'a T,
    pub data_to_corner_map: &'a [CornerIndex],
    pub vertex_to_data_map: &'a [i32],
    pub pos_by_point: &'a [[i64; 3]],
    pub pos_by_corner: &'a [[i64; 3]],
    pub entry_to_point: &'a [PointIndex],
    pub normal_quantization_bits: u32,
}

/// Encodes prepared integer values (one tuple per sequenced point).
pub fn encode_integer_values<T: TraversalCornerTable>(
    values: &mut [i32],
    num_components: usize,
    method: PredictionSchemeMethod,
    context: Option<&MeshPredictionContext<'_, T>>,
    options: &SymbolEncodingOptions,
    out_buffer: &mut EncoderBuffer,
) -> Status {
    if values.is_empty() {
        return Ok(());
    }

    out_buffer.encode_i8(method as i8);
    let mut transform = if method == PredictionSchemeMethod::None {
        PredictionSchemeTransform::Delta
    } else {
        let transform = PredictionSchemeTransform::Wrap(WrapTransform::default());
        out_buffer.encode_i8(transform.transform_type() as i8);
        transform
    };

    let mesh_data = context.map(|ctx| MeshPredictionSchemeData {
        table: ctx.table,
        data_to_corner_map: ctx.data_to_corner_map,
        vertex_to_data_map: ctx.vertex_to_data_map,
    });
    let require_mesh_data = || {
        DracoError::InvalidConfig("mesh prediction scheme without mesh data".to_string())
    };

    // Run the prediction; schemes replace values with corrections in
    // place and keep any side data for the prediction-data block.
    let mut constrained_encoder: Option<ConstrainedMultiParallelogramEncoder> = None;
    let mut tex_coords_encoder: Option<TexCoordsPortableEncoder> = None;
    let mut normal_encoder: Option<GeometricNormalEncoder> = None;
    match method {
        PredictionSchemeMethod::None => {}
        PredictionSchemeMethod::Difference => {
            difference::encode(values, num_components, &mut transform);
        }
        PredictionSchemeMethod::Parallelogram => {
            let data = mesh_data.as_ref().ok_or_else(require_mesh_data)?;
            parallelogram::encode(values, num_components, data, &mut transform);
        }
        PredictionSchemeMethod::MultiParallelogram => {
            let data = mesh_data.as_ref().ok_or_else(require_mesh_data)?;
            multi_parallelogram::encode(values, num_components, data, &mut transform);
        }
        PredictionSchemeMethod::ConstrainedMultiParallelogram => {
            let data = mesh_data.as_ref().ok_or_else(require_mesh_data)?;
            let mut encoder = ConstrainedMultiParallelogramEncoder::new();
            encoder.encode(values, num_components, data, &mut transform);
            constrained_encoder = Some(encoder);
        }
        PredictionSchemeMethod::TexCoordsPortable => {
            let ctx = context.ok_or_else(require_mesh_data)?;
            if num_components != 2 {
                return Err(DracoError::InvalidConfig(
                    "texture prediction needs two components".to_string(),
                ));
            }
            if ctx.pos_by_point.is_empty() {
                return Err(DracoError::InvalidConfig(
                    "texture prediction without portable positions".to_string(),
                ));
            }
            let data = mesh_data.as_ref().unwrap();
            let mut encoder = TexCoordsPortableEncoder::new();
            encoder.encode(
                values,
                data,
                &mut transform,
                ctx.pos_by_point,
                ctx.entry_to_point,
            )?;
            tex_coords_encoder = Some(encoder);
        }
        PredictionSchemeMethod::GeometricNormal => {
            let ctx = context.ok_or_else(require_mesh_data)?;
            if num_components != 2 {
                return Err(DracoError::InvalidConfig(
                    "normal prediction runs in octahedral space".to_string(),
                ));
            }
            if ctx.pos_by_corner.is_empty() {
                return Err(DracoError::InvalidConfig(
                    "normal prediction without portable positions".to_string(),
                ));
            }
            let data = mesh_data.as_ref().unwrap();
            let mut encoder = GeometricNormalEncoder::new(ctx.normal_quantization_bits);
            encoder.encode(values, data, &mut transform, ctx.pos_by_corner)?;
            normal_encoder = Some(encoder);
        }
    }

    let symbols: Vec<u32> = if transform.are_corrections_positive() {
        values.iter().map(|&v| v as u32).collect()
    } else {
        values.iter().map(|&v| convert_signed_int_to_symbol(v)).collect()
    };
    out_buffer.encode_u8(1);
    encode_symbols(&symbols, num_components, options, out_buffer)?;

    if let Some(encoder) = &constrained_encoder {
        encoder.encode_prediction_data(out_buffer);
    }
    if let Some(encoder) = &tex_coords_encoder {
        encoder.encode_prediction_data(out_buffer);
    }
    if let Some(encoder) = &normal_encoder {
        encoder.encode_prediction_data(out_buffer);
    }
    if method != PredictionSchemeMethod::None {
        transform.encode_transform_data(out_buffer);
    }
    Ok(())
}
