//! Round trip of a two-triangle quad carrying a texture coordinate seam
//! on the shared edge.

mod common;

use common::{assert_same_faces, position_of};
use draco_codec::draco_types::DataType;
use draco_codec::encoder_options::EncoderOptions;
use draco_codec::geometry_attribute::{GeometryAttributeType, PointAttribute};
use draco_codec::geometry_indices::{AttributeValueIndex, PointIndex};
use draco_codec::mesh::Mesh;
use draco_codec::mesh_decoder::MeshDecoder;
use draco_codec::mesh_encoder::MeshEncoder;

/// Two triangles over four spatial vertices; the shared edge (v1, v2)
/// carries different UVs for v1 on its two sides. Points are wedges:
/// face 0 uses points (0, 1, 2), face 1 points (3, 4, 5).
fn quad_with_uv_seam() -> Mesh {
    let mut mesh = Mesh::new();
    mesh.set_num_points(6);

    let positions = [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]];
    let mut pos = PointAttribute::new(
        GeometryAttributeType::Position,
        3,
        DataType::Int32,
        false,
        4,
    );
    for (i, p) in positions.iter().enumerate() {
        pos.set_value_from_i32(AttributeValueIndex(i as u32), p);
    }
    pos.set_explicit_mapping(6);
    // Point -> spatial vertex: faces (v0, v1, v2) and (v1, v3, v2).
    for (point, vertex) in [(0, 0), (1, 1), (2, 2), (3, 1), (4, 3), (5, 2)] {
        pos.set_point_map_entry(PointIndex(point), AttributeValueIndex(vertex));
    }
    mesh.add_attribute(pos);

    let mut uv = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Int32, false, 5);
    let uv_values = [[0, 0], [100, 0], [0, 100], [70, 0], [100, 100]];
    for (i, v) in uv_values.iter().enumerate() {
        uv.set_value_from_i32(AttributeValueIndex(i as u32), v);
    }
    uv.set_explicit_mapping(6);
    // v1 has UV 1 on face 0 but UV 3 on face 1; v2 shares UV 2.
    for (point, value) in [(0, 0), (1, 1), (2, 2), (3, 3), (4, 4), (5, 2)] {
        uv.set_point_map_entry(PointIndex(point), AttributeValueIndex(value));
    }
    mesh.add_attribute(uv);

    mesh.add_face([PointIndex(0), PointIndex(1), PointIndex(2)]);
    mesh.add_face([PointIndex(3), PointIndex(4), PointIndex(5)]);
    mesh
}

fn uv_of(mesh: &Mesh, point: PointIndex) -> [i32; 2] {
    let att = mesh
        .named_attribute(GeometryAttributeType::TexCoord)
        .unwrap();
    let mut out = [0i32; 2];
    att.convert_value_to_i32(att.mapped_index(point), &mut out);
    out
}

#[test]
fn test_uv_seam_round_trip() {
    let mesh = quad_with_uv_seam();
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();

    assert_same_faces(&mesh, &decoded);

    // One wedge per (vertex, seam side): both endpoints of the seam
    // edge split, the far corners stay single.
    assert_eq!(decoded.num_points(), 6);

    // The seam survives: two decoded points share the position of v1
    // but carry different UVs.
    let mut v1_uvs = Vec::new();
    for p in 0..decoded.num_points() {
        let point = PointIndex(p as u32);
        if position_of(&decoded, point) == [1, 0, 0] {
            v1_uvs.push(uv_of(&decoded, point));
        }
    }
    v1_uvs.sort();
    assert_eq!(v1_uvs, vec![[70, 0], [100, 0]]);

    // Attribute values at the other corners are intact; the wedge pair
    // at v2 carries the same UV on both sides of the seam.
    let mut decoded_uvs: Vec<[i32; 2]> = (0..decoded.num_points())
        .map(|p| uv_of(&decoded, PointIndex(p as u32)))
        .collect();
    decoded_uvs.sort();
    assert_eq!(
        decoded_uvs,
        vec![[0, 0], [0, 100], [0, 100], [70, 0], [100, 0], [100, 100]]
    );
}

#[test]
fn test_uv_seam_survives_valence_traversal() {
    let mesh = quad_with_uv_seam();
    let options = EncoderOptions {
        traversal_kind_override: Some(
            draco_codec::mesh_edgebreaker_shared::TraversalKind::Valence,
        ),
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);
    assert_eq!(decoded.num_points(), 6);
}
