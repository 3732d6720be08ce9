//! Top-level mesh encoder: container header, edgebreaker connectivity
//! and the per-attribute coding pipeline.

use crate::attribute_octahedron_transform::AttributeOctahedronTransform;
use crate::attribute_quantization_transform::AttributeQuantizationTransform;
use crate::compression_config::{
    EncodedGeometryType, MeshEncodingMethod, MESH_CORNER_ATTRIBUTE, MESH_VERTEX_ATTRIBUTE,
    SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC, SEQUENTIAL_ATTRIBUTE_ENCODER_INTEGER,
    SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS, SEQUENTIAL_ATTRIBUTE_ENCODER_QUANTIZATION,
};
use crate::encoder_buffer::EncoderBuffer;
use crate::encoder_options::EncoderOptions;
use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::geometry_indices::PointIndex;
use crate::mesh::{Mesh, MeshAttributeElementType};
use crate::mesh_edgebreaker_encoder::MeshEdgebreakerConnectivityEncoder;
use crate::mesh_traversal_sequencer::{
    generate_sequence, sequence_points, AttributeCornerTableView,
    MESH_TRAVERSAL_DEPTH_FIRST, MESH_TRAVERSAL_PREDICTION_DEGREE,
};
use crate::prediction_scheme::PredictionSchemeMethod;
use crate::sequential_attribute_encoder;
use crate::sequential_integer_attribute_encoder::{
    encode_integer_values, MeshPredictionContext,
};
use crate::status::{DracoError, Status, StatusOr};
use crate::symbol_encoding::SymbolEncodingOptions;
use crate::version::{BITSTREAM_VERSION_MAJOR, BITSTREAM_VERSION_MINOR, DRACO_MAGIC};

struct AttributePlan {
    att_id: i32,
    att_data_id: i8,
    element_type: u8,
    traversal_method: u8,
    seq_type: u8,
    prediction: PredictionSchemeMethod,
}

pub struct MeshEncoder;

impl MeshEncoder {
    /// Encodes |mesh| into a self-contained byte stream.
    pub fn encode(mesh: &Mesh, options: &EncoderOptions) -> StatusOr<Vec<u8>> {
        if mesh.num_faces() == 0 {
            return Err(DracoError::InvalidConfig("mesh has no faces".to_string()));
        }
        let mut buffer = EncoderBuffer::new();

        // Container header.
        buffer.encode_data(DRACO_MAGIC);
        buffer.encode_u8(BITSTREAM_VERSION_MAJOR);
        buffer.encode_u8(BITSTREAM_VERSION_MINOR);
        buffer.encode_u8(EncodedGeometryType::TriangularMesh as u8);
        buffer.encode_u8(MeshEncodingMethod::Edgebreaker as u8);
        buffer.encode_u16(0); // Flags.

        let kind = options.traversal_kind();
        buffer.encode_u8(kind as u8);

        let mut connectivity = MeshEdgebreakerConnectivityEncoder::new(mesh, kind)?;
        connectivity.encode_connectivity(&mut buffer)?;

        Self::encode_attributes(mesh, options, &mut connectivity, &mut buffer)?;
        Ok(buffer.into_vec())
    }

    fn plan_attributes(
        mesh: &Mesh,
        options: &EncoderOptions,
        connectivity: &mut MeshEdgebreakerConnectivityEncoder<'_>,
    ) -> Vec<AttributePlan> {
        let pos_id = mesh.named_attribute_id(GeometryAttributeType::Position);
        let mut att_order = vec![pos_id];
        for id in 0..mesh.num_attributes() as i32 {
            if id != pos_id {
                att_order.push(id);
            }
        }

        let pos_seq_type = Self::select_sequential_type(mesh.attribute(pos_id), options);
        let pos_is_portable = pos_seq_type != SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC
            && mesh.attribute(pos_id).num_components() == 3;

        let mut plans = Vec::with_capacity(att_order.len());
        for att_id in att_order {
            let att = mesh.attribute(att_id);
            let seq_type = Self::select_sequential_type(att, options);
            let is_position = att_id == pos_id;

            let (att_data_id, element_type) = if is_position {
                (-1i8, MESH_VERTEX_ATTRIBUTE)
            } else {
                let data_id = connectivity
                    .attribute_data
                    .iter()
                    .position(|d| d.attribute_index == att_id)
                    .expect("every non-position attribute has connectivity data")
                    as i8;
                let data = &mut connectivity.attribute_data[data_id as usize];
                let per_vertex = mesh.attribute_element_type(att_id)
                    == MeshAttributeElementType::Vertex
                    || data.connectivity_data.no_interior_seams();
                if per_vertex {
                    data.is_connectivity_used = false;
                    (data_id, MESH_VERTEX_ATTRIBUTE)
                } else {
                    (data_id, MESH_CORNER_ATTRIBUTE)
                }
            };

            let traversal_method = if is_position && options.encoding_speed == 0 {
                MESH_TRAVERSAL_PREDICTION_DEGREE
            } else {
                MESH_TRAVERSAL_DEPTH_FIRST
            };

            let prediction = Self::select_prediction(att, options, seq_type, pos_is_portable);
            plans.push(AttributePlan {
                att_id,
                att_data_id,
                element_type,
                traversal_method,
                seq_type,
                prediction,
            });
        }
        plans
    }

    fn select_sequential_type(att: &PointAttribute, options: &EncoderOptions) -> u8 {
        let quantization_bits = options.quantization_bits(att.attribute_type());
        if att.data_type().is_float() {
            if quantization_bits > 0 {
                if att.attribute_type() == GeometryAttributeType::Normal
                    && att.num_components() == 3
                {
                    SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS
                } else {
                    SEQUENTIAL_ATTRIBUTE_ENCODER_QUANTIZATION
                }
            } else {
                SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC
            }
        } else if att.data_type().is_integral_32() {
            SEQUENTIAL_ATTRIBUTE_ENCODER_INTEGER
        } else {
            SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC
        }
    }

    fn select_prediction(
        att: &PointAttribute,
        options: &EncoderOptions,
        seq_type: u8,
        pos_is_portable: bool,
    ) -> PredictionSchemeMethod {
        if seq_type == SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC {
            return PredictionSchemeMethod::None;
        }
        if let Some(method) = options.prediction_override {
            return method;
        }
        match att.attribute_type() {
            GeometryAttributeType::Position => {
                if options.encoding_speed >= 10 {
                    PredictionSchemeMethod::Difference
                } else {
                    PredictionSchemeMethod::ConstrainedMultiParallelogram
                }
            }
            GeometryAttributeType::TexCoord
                if att.num_components() == 2 && pos_is_portable =>
            {
                PredictionSchemeMethod::TexCoordsPortable
            }
            GeometryAttributeType::Normal
                if seq_type == SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS && pos_is_portable =>
            {
                PredictionSchemeMethod::GeometricNormal
            }
            _ => PredictionSchemeMethod::Parallelogram,
        }
    }

    fn encode_attributes(
        mesh: &Mesh,
        options: &EncoderOptions,
        connectivity: &mut MeshEdgebreakerConnectivityEncoder<'_>,
        buffer: &mut EncoderBuffer,
    ) -> Status {
        let plans = Self::plan_attributes(mesh, options, connectivity);

        buffer.encode_u8(plans.len() as u8);
        for plan in &plans {
            buffer.encode_i8(plan.att_data_id);
            buffer.encode_u8(plan.element_type);
            buffer.encode_u8(plan.traversal_method);
        }
        for plan in &plans {
            let att = mesh.attribute(plan.att_id);
            buffer.encode_varint(1);
            buffer.encode_u8(att.attribute_type() as u8);
            buffer.encode_u8(att.data_type() as u8);
            buffer.encode_u8(att.num_components());
            buffer.encode_u8(att.normalized() as u8);
            buffer.encode_u16(att.unique_id() as u16);
            buffer.encode_u8(plan.seq_type);
        }

        // Portable positions become the parents of the dependent
        // schemes (texture coordinates, geometric normals).
        let mut pos_by_point: Vec<[i64; 3]> = Vec::new();
        let mut pos_by_corner: Vec<[i64; 3]> = Vec::new();

        for plan in &plans {
            let att = mesh.attribute(plan.att_id);
            let symbol_options = SymbolEncodingOptions::default();

            // Run the sequencer for this attribute.
            let is_per_corner = plan.element_type == MESH_CORNER_ATTRIBUTE;
            let point_ids: Vec<PointIndex>;
            if plan.att_data_id < 0 {
                generate_sequence(
                    &connectivity.corner_table,
                    Some(connectivity.processed_connectivity_corners.as_slice()),
                    plan.traversal_method,
                    &mut connectivity.pos_encoding_data,
                );
                point_ids = sequence_points(mesh, &connectivity.pos_encoding_data);
            } else {
                let data = &mut connectivity.attribute_data[plan.att_data_id as usize];
                let connectivity_data = &data.connectivity_data;
                let encoding_data = &mut data.encoding_data;
                if is_per_corner {
                    let view = AttributeCornerTableView {
                        base: &connectivity.corner_table,
                        overlay: connectivity_data,
                    };
                    generate_sequence(
                        &view,
                        Some(connectivity.processed_connectivity_corners.as_slice()),
                        plan.traversal_method,
                        encoding_data,
                    );
                } else {
                    generate_sequence(
                        &connectivity.corner_table,
                        Some(connectivity.processed_connectivity_corners.as_slice()),
                        plan.traversal_method,
                        encoding_data,
                    );
                }
                point_ids = sequence_points(mesh, encoding_data);
            }

            match plan.seq_type {
                SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC => {
                    sequential_attribute_encoder::encode_values(att, &point_ids, buffer);
                }
                SEQUENTIAL_ATTRIBUTE_ENCODER_INTEGER => {
                    let num_components = att.num_components() as usize;
                    let mut values = gather_attribute_values(att, &point_ids);
                    if plan.att_id
                        == mesh.named_attribute_id(GeometryAttributeType::Position)
                    {
                        build_portable_positions(
                            mesh,
                            att,
                            None,
                            &mut pos_by_point,
                            &mut pos_by_corner,
                        );
                    }
                    Self::encode_with_prediction(
                        connectivity,
                        plan,
                        &mut values,
                        num_components,
                        &pos_by_point,
                        &pos_by_corner,
                        &point_ids,
                        0,
                        &symbol_options,
                        buffer,
                    )?;
                }
                SEQUENTIAL_ATTRIBUTE_ENCODER_QUANTIZATION => {
                    let quantization_bits =
                        options.quantization_bits(att.attribute_type());
                    let transform =
                        AttributeQuantizationTransform::compute_parameters(att, quantization_bits)?;
                    let portable = transform.transform_attribute(att);
                    let num_components = att.num_components() as usize;
                    let mut values =
                        gather_portable_values(att, &point_ids, &portable, num_components);
                    if plan.att_id
                        == mesh.named_attribute_id(GeometryAttributeType::Position)
                    {
                        build_portable_positions(
                            mesh,
                            att,
                            Some(&portable),
                            &mut pos_by_point,
                            &mut pos_by_corner,
                        );
                    }
                    Self::encode_with_prediction(
                        connectivity,
                        plan,
                        &mut values,
                        num_components,
                        &pos_by_point,
                        &pos_by_corner,
                        &point_ids,
                        0,
                        &symbol_options,
                        buffer,
                    )?;
                    transform.encode_parameters(buffer);
                }
                SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS => {
                    let quantization_bits =
                        options.quantization_bits(att.attribute_type());
                    let transform = AttributeOctahedronTransform::new(quantization_bits)?;
                    let portable = transform.transform_attribute(att);
                    let mut values = gather_portable_values(att, &point_ids, &portable, 2);
                    Self::encode_with_prediction(
                        connectivity,
                        plan,
                        &mut values,
                        2,
                        &pos_by_point,
                        &pos_by_corner,
                        &point_ids,
                        quantization_bits,
                        &symbol_options,
                        buffer,
                    )?;
                    transform.encode_parameters(buffer);
                }
                _ => {
                    return Err(DracoError::InternalInvariantViolation(
                        "unplanned sequential encoder type".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_with_prediction(
        connectivity: &MeshEdgebreakerConnectivityEncoder<'_>,
        plan: &AttributePlan,
        values: &mut [i32],
        num_components: usize,
        pos_by_point: &[[i64; 3]],
        pos_by_corner: &[[i64; 3]],
        point_ids: &[PointIndex],
        normal_quantization_bits: u32,
        symbol_options: &SymbolEncodingOptions,
        buffer: &mut EncoderBuffer,
    ) -> Status {
        if plan.att_data_id < 0 {
            let encoding_data = &connectivity.pos_encoding_data;
            let context = MeshPredictionContext {
                table: &connectivity.corner_table,
                data_to_corner_map: &encoding_data.encoded_attribute_value_index_to_corner_map,
                vertex_to_data_map: &encoding_data.vertex_to_encoded_attribute_value_index_map,
                pos_by_point,
                pos_by_corner,
                entry_to_point: point_ids,
                normal_quantization_bits,
            };
            encode_integer_values(
                values,
                num_components,
                plan.prediction,
                Some(&context),
                symbol_options,
                buffer,
            )
        } else {
            let data = &connectivity.attribute_data[plan.att_data_id as usize];
            let encoding_data = &data.encoding_data;
            if plan.element_type == MESH_CORNER_ATTRIBUTE {
                let view = AttributeCornerTableView {
                    base: &connectivity.corner_table,
                    overlay: &data.connectivity_data,
                };
                let context = MeshPredictionContext {
                    table: &view,
                    data_to_corner_map: &encoding_data.encoded_attribute_value_index_to_corner_map,
                    vertex_to_data_map: &encoding_data.vertex_to_encoded_attribute_value_index_map,
                    pos_by_point,
                    pos_by_corner,
                    entry_to_point: point_ids,
                    normal_quantization_bits,
                };
                encode_integer_values(
                    values,
                    num_components,
                    plan.prediction,
                    Some(&context),
                    symbol_options,
                    buffer,
                )
            } else {
                let context = MeshPredictionContext {
                    table: &connectivity.corner_table,
                    data_to_corner_map: &encoding_data.encoded_attribute_value_index_to_corner_map,
                    vertex_to_data_map: &encoding_data.vertex_to_encoded_attribute_value_index_map,
                    pos_by_point,
                    pos_by_corner,
                    entry_to_point: point_ids,
                    normal_quantization_bits,
                };
                encode_integer_values(
                    values,
                    num_components,
                    plan.prediction,
                    Some(&context),
                    symbol_options,
                    buffer,
                )
            }
        }
    }
}

/// Values per sequenced point, converted through the i32 coding domain.
fn gather_attribute_values(att: &PointAttribute, point_ids: &[PointIndex]) -> Vec<i32> {
    let num_components = att.num_components() as usize;
    let mut out = Vec::with_capacity(point_ids.len() * num_components);
    let mut entry = vec![0i32; num_components];
    for &point in point_ids {
        att.convert_value_to_i32(att.mapped_index(point), &mut entry);
        out.extend_from_slice(&entry);
    }
    out
}

/// Values per sequenced point, sampled from a portable (transformed)
/// value array laid out per attribute value index.
fn gather_portable_values(
    att: &PointAttribute,
    point_ids: &[PointIndex],
    portable: &[i32],
    stride: usize,
) -> Vec<i32> {
    let mut out = Vec::with_capacity(point_ids.len() * stride);
    for &point in point_ids {
        let value = att.mapped_index(point).index();
        out.extend_from_slice(&portable[value * stride..(value + 1) * stride]);
    }
    out
}

/// Positions in the integer coding domain, indexed by point and corner.
fn build_portable_positions(
    mesh: &Mesh,
    att: &PointAttribute,
    portable: Option<&[i32]>,
    pos_by_point: &mut Vec<[i64; 3]>,
    pos_by_corner: &mut Vec<[i64; 3]>,
) {
    let num_points = mesh.num_points();
    pos_by_point.clear();
    pos_by_point.reserve(num_points);
    let mut entry = vec![0i32; 3];
    for p in 0..num_points {
        let value = att.mapped_index(PointIndex(p as u32));
        match portable {
            Some(values) => {
                let base = value.index() * 3;
                pos_by_point.push([
                    values[base] as i64,
                    values[base + 1] as i64,
                    values[base + 2] as i64,
                ]);
            }
            None => {
                att.convert_value_to_i32(value, &mut entry);
                pos_by_point.push([entry[0] as i64, entry[1] as i64, entry[2] as i64]);
            }
        }
    }
    pos_by_corner.clear();
    pos_by_corner.reserve(mesh.num_faces() * 3);
    for corner in 0..mesh.num_faces() as u32 * 3 {
        pos_by_corner.push(pos_by_point[mesh.corner_to_point(corner).index()]);
    }
}
