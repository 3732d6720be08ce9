//! Top-level mesh decoder: header parsing, method dispatch and the
//! symmetric inverse of the attribute coding pipeline.

use crate::attribute_octahedron_transform::AttributeOctahedronTransform;
use crate::attribute_quantization_transform::AttributeQuantizationTransform;
use crate::compression_config::{
    MESH_CORNER_ATTRIBUTE, SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC,
    SEQUENTIAL_ATTRIBUTE_ENCODER_INTEGER, SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS,
    SEQUENTIAL_ATTRIBUTE_ENCODER_QUANTIZATION,
};
use crate::decoder_buffer::DecoderBuffer;
use crate::draco_types::DataType;
use crate::geometry_attribute::{GeometryAttributeType, PointAttribute};
use crate::geometry_indices::{AttributeValueIndex, PointIndex};
use crate::mesh::{Mesh, MeshAttributeElementType};
use crate::mesh_edgebreaker_decoder::MeshEdgebreakerConnectivityDecoder;
use crate::mesh_edgebreaker_shared::TraversalKind;
use crate::mesh_traversal_sequencer::{
    generate_sequence, sequence_points, update_point_to_attribute_index_mapping,
    AttributeCornerTableView,
};
use crate::sequential_attribute_decoder;
use crate::sequential_integer_attribute_decoder::decode_integer_values;
use crate::sequential_integer_attribute_encoder::MeshPredictionContext;
use crate::status::{corrupt, DracoError, StatusOr};
use crate::version::{is_supported_version, DRACO_MAGIC};

struct AttributeHeader {
    att_data_id: i8,
    element_type: u8,
    traversal_method: u8,
    att_type: GeometryAttributeType,
    data_type: DataType,
    num_components: u8,
    normalized: bool,
    unique_id: u16,
    seq_type: u8,
}

pub struct MeshDecoder;

impl MeshDecoder {
    /// Decodes a mesh from a self-contained byte stream.
    pub fn decode(data: &[u8]) -> StatusOr<Mesh> {
        let mut buffer = DecoderBuffer::new(data);

        let mut magic = [0u8; 5];
        buffer.decode_data(&mut magic).map_err(|_| {
            DracoError::InvalidHeader("stream is shorter than the header".to_string())
        })?;
        if &magic != DRACO_MAGIC {
            return Err(DracoError::InvalidHeader("bad magic".to_string()));
        }
        let major = buffer.decode_u8()?;
        let minor = buffer.decode_u8()?;
        if !is_supported_version(major, minor) {
            return Err(DracoError::UnsupportedVersion(format!(
                "bitstream {}.{}",
                major, minor
            )));
        }
        let geometry_type = buffer.decode_u8()?;
        let method = buffer.decode_u8()?;
        let _flags = buffer.decode_u16()?;

        match (geometry_type, method) {
            (1, 1) => Self::decode_edgebreaker_mesh(&mut buffer),
            (1, 0) => Err(DracoError::UnsupportedMethod(
                "sequential mesh coding".to_string(),
            )),
            (0, 0) => Err(DracoError::UnsupportedMethod(
                "sequential point cloud coding".to_string(),
            )),
            (0, 1) => Err(DracoError::UnsupportedMethod(
                "kd-tree point cloud coding".to_string(),
            )),
            _ => Err(DracoError::InvalidHeader(format!(
                "unknown geometry type {}",
                geometry_type
            ))),
        }
    }

    fn decode_edgebreaker_mesh(buffer: &mut DecoderBuffer<'_>) -> StatusOr<Mesh> {
        let kind = TraversalKind::from_u8(buffer.decode_u8()?)
            .ok_or_else(|| corrupt("unknown traversal kind"))?;

        let mut mesh = Mesh::new();
        let mut connectivity = MeshEdgebreakerConnectivityDecoder::new(kind);
        connectivity.decode_connectivity(buffer, &mut mesh)?;

        // Attribute framing.
        let num_attributes = buffer.decode_u8()? as usize;
        let mut headers = Vec::with_capacity(num_attributes);
        for _ in 0..num_attributes {
            let att_data_id = buffer.decode_i8()?;
            let element_type = buffer.decode_u8()?;
            let traversal_method = buffer.decode_u8()?;
            if att_data_id >= 0 && att_data_id as usize >= connectivity.attribute_data.len() {
                return Err(corrupt("attribute data id out of range"));
            }
            headers.push((att_data_id, element_type, traversal_method));
        }
        let mut attribute_headers = Vec::with_capacity(num_attributes);
        for &(att_data_id, element_type, traversal_method) in &headers {
            let num_atts = buffer.decode_varint_u32()?;
            if num_atts != 1 {
                return Err(corrupt("one attribute per attributes decoder expected"));
            }
            let att_type = GeometryAttributeType::from_u8(buffer.decode_u8()?);
            let data_type = DataType::from_u8(buffer.decode_u8()?);
            if data_type == DataType::Invalid {
                return Err(corrupt("invalid attribute data type"));
            }
            let num_components = buffer.decode_u8()?;
            if num_components == 0 || num_components > 4 {
                return Err(corrupt("attribute component count out of range"));
            }
            let normalized = buffer.decode_u8()? != 0;
            let unique_id = buffer.decode_u16()?;
            let seq_type = buffer.decode_u8()?;
            attribute_headers.push(AttributeHeader {
                att_data_id,
                element_type,
                traversal_method,
                att_type,
                data_type,
                num_components,
                normalized,
                unique_id,
                seq_type,
            });
        }

        // Decode attribute values in wire order; positions arrive first
        // and feed the dependent prediction schemes.
        let mut pos_by_point: Vec<[i64; 3]> = Vec::new();
        let mut pos_by_corner: Vec<[i64; 3]> = Vec::new();

        for header in &attribute_headers {
            let mut att = PointAttribute::new(
                header.att_type,
                header.num_components,
                header.data_type,
                header.normalized,
                0,
            );

            let is_per_corner =
                header.element_type == MESH_CORNER_ATTRIBUTE && header.att_data_id >= 0;

            // Regenerate the encoding order for this attribute.
            let point_ids: Vec<PointIndex>;
            if header.att_data_id < 0 {
                generate_sequence(
                    &connectivity.corner_table,
                    None,
                    header.traversal_method,
                    &mut connectivity.pos_encoding_data,
                );
                point_ids = sequence_points(&mesh, &connectivity.pos_encoding_data);
            } else {
                let data = &mut connectivity.attribute_data[header.att_data_id as usize];
                let connectivity_data = &data.connectivity_data;
                let encoding_data = &mut data.encoding_data;
                if is_per_corner {
                    let view = AttributeCornerTableView {
                        base: &connectivity.corner_table,
                        overlay: connectivity_data,
                    };
                    generate_sequence(&view, None, header.traversal_method, encoding_data);
                } else {
                    data.is_connectivity_used = false;
                    generate_sequence(
                        &connectivity.corner_table,
                        None,
                        header.traversal_method,
                        encoding_data,
                    );
                }
                point_ids = sequence_points(&mesh, encoding_data);
            }
            let num_values = point_ids.len();

            match header.seq_type {
                SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC => {
                    sequential_attribute_decoder::decode_values(&mut att, num_values, buffer)?;
                }
                SEQUENTIAL_ATTRIBUTE_ENCODER_INTEGER => {
                    let values = Self::decode_with_prediction(
                        &connectivity,
                        header,
                        num_values,
                        header.num_components as usize,
                        &pos_by_point,
                        &pos_by_corner,
                        &point_ids,
                        buffer,
                    )?;
                    att.resize(num_values);
                    store_values(&mut att, &values, header.num_components as usize);
                    if header.att_type == GeometryAttributeType::Position {
                        (pos_by_point, pos_by_corner) = build_portable_positions(
                            &mesh,
                            &connectivity,
                            header,
                            &values,
                        )?;
                    }
                }
                SEQUENTIAL_ATTRIBUTE_ENCODER_QUANTIZATION => {
                    let values = Self::decode_with_prediction(
                        &connectivity,
                        header,
                        num_values,
                        header.num_components as usize,
                        &pos_by_point,
                        &pos_by_corner,
                        &point_ids,
                        buffer,
                    )?;
                    let transform = AttributeQuantizationTransform::decode_parameters(
                        buffer,
                        header.num_components as usize,
                    )?;
                    transform.inverse_transform_attribute(&values, &mut att)?;
                    if header.att_type == GeometryAttributeType::Position {
                        (pos_by_point, pos_by_corner) = build_portable_positions(
                            &mesh,
                            &connectivity,
                            header,
                            &values,
                        )?;
                    }
                }
                SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS => {
                    let values = Self::decode_with_prediction(
                        &connectivity,
                        header,
                        num_values,
                        2,
                        &pos_by_point,
                        &pos_by_corner,
                        &point_ids,
                        buffer,
                    )?;
                    let transform = AttributeOctahedronTransform::decode_parameters(buffer)?;
                    transform.inverse_transform_attribute(&values, &mut att)?;
                }
                other => {
                    return Err(corrupt(format!(
                        "unknown sequential encoder type {}",
                        other
                    )));
                }
            }

            // Attach the point -> value mapping from the traversal.
            if header.att_data_id < 0 {
                update_point_to_attribute_index_mapping(
                    &connectivity.corner_table,
                    &mesh,
                    &connectivity.pos_encoding_data,
                    &mut att,
                );
            } else {
                let data = &connectivity.attribute_data[header.att_data_id as usize];
                if is_per_corner {
                    let view = AttributeCornerTableView {
                        base: &connectivity.corner_table,
                        overlay: &data.connectivity_data,
                    };
                    update_point_to_attribute_index_mapping(
                        &view,
                        &mesh,
                        &data.encoding_data,
                        &mut att,
                    );
                } else {
                    update_point_to_attribute_index_mapping(
                        &connectivity.corner_table,
                        &mesh,
                        &data.encoding_data,
                        &mut att,
                    );
                }
            }

            let att_id = mesh.add_attribute(att);
            mesh.attribute_mut(att_id).set_unique_id(header.unique_id as u32);
            mesh.set_attribute_element_type(
                att_id,
                if is_per_corner {
                    MeshAttributeElementType::Corner
                } else {
                    MeshAttributeElementType::Vertex
                },
            );
        }

        Ok(mesh)
    }

    #[allow(clippy::too_many_arguments)]
    fn decode_with_prediction(
        connectivity: &MeshEdgebreakerConnectivityDecoder<'_>,
        header: &AttributeHeader,
        num_values: usize,
        num_components: usize,
        pos_by_point: &[[i64; 3]],
        pos_by_corner: &[[i64; 3]],
        point_ids: &[PointIndex],
        buffer: &mut DecoderBuffer<'_>,
    ) -> StatusOr<Vec<i32>> {
        if header.att_data_id < 0 {
            let encoding_data = &connectivity.pos_encoding_data;
            let context = MeshPredictionContext {
                table: &connectivity.corner_table,
                data_to_corner_map: &encoding_data.encoded_attribute_value_index_to_corner_map,
                vertex_to_data_map: &encoding_data.vertex_to_encoded_attribute_value_index_map,
                pos_by_point,
                pos_by_corner,
                entry_to_point: point_ids,
                normal_quantization_bits: 0,
            };
            decode_integer_values(num_values, num_components, Some(&context), buffer)
        } else {
            let data = &connectivity.attribute_data[header.att_data_id as usize];
            let encoding_data = &data.encoding_data;
            if header.element_type == MESH_CORNER_ATTRIBUTE {
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
                    normal_quantization_bits: 0,
                };
                decode_integer_values(num_values, num_components, Some(&context), buffer)
            } else {
                let context = MeshPredictionContext {
                    table: &connectivity.corner_table,
                    data_to_corner_map: &encoding_data.encoded_attribute_value_index_to_corner_map,
                    vertex_to_data_map: &encoding_data.vertex_to_encoded_attribute_value_index_map,
                    pos_by_point,
                    pos_by_corner,
                    entry_to_point: point_ids,
                    normal_quantization_bits: 0,
                };
                decode_integer_values(num_values, num_components, Some(&context), buffer)
            }
        }
    }
}

fn store_values(att: &mut PointAttribute, values: &[i32], num_components: usize) {
    for (i, entry) in values.chunks(num_components).enumerate() {
        att.set_value_from_i32(AttributeValueIndex(i as u32), entry);
    }
}

/// Positions in the integer coding domain, rebuilt from the decoded
/// portable values; indexed by point and by corner.
fn build_portable_positions(
    mesh: &Mesh,
    connectivity: &MeshEdgebreakerConnectivityDecoder<'_>,
    header: &AttributeHeader,
    values: &[i32],
) -> StatusOr<(Vec<[i64; 3]>, Vec<[i64; 3]>)> {
    if header.num_components != 3 {
        return Ok((Vec::new(), Vec::new()));
    }
    if header.att_data_id >= 0 {
        return Err(corrupt("position attribute with auxiliary connectivity"));
    }
    let encoding_data = &connectivity.pos_encoding_data;
    let table = &connectivity.corner_table;
    let mut pos_by_point = vec![[0i64; 3]; mesh.num_points()];
    for f in 0..table.num_faces() {
        for local in 0..3u32 {
            let corner = crate::geometry_indices::CornerIndex(3 * f as u32 + local);
            let vertex = table.vertex(corner);
            if !vertex.is_valid() {
                continue;
            }
            let value = encoding_data.vertex_to_encoded_attribute_value_index_map[vertex.index()];
            if value < 0 {
                continue;
            }
            let base = value as usize * 3;
            let point = mesh.corner_to_point(corner.value());
            pos_by_point[point.index()] = [
                values[base] as i64,
                values[base + 1] as i64,
                values[base + 2] as i64,
            ];
        }
    }
    let mut pos_by_corner = Vec::with_capacity(table.num_faces() * 3);
    for corner in 0..table.num_faces() as u32 * 3 {
        pos_by_corner.push(pos_by_point[mesh.corner_to_point(corner).index()]);
    }
    Ok((pos_by_point, pos_by_corner))
}
