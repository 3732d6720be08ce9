//! Broader round-trip coverage: closed meshes, every traversal coder,
//! the prediction-degree traversal order and octahedral normals.

mod common;

use common::{assert_same_faces, build_position_mesh};
use draco_codec::draco_types::DataType;
use draco_codec::encoder_options::EncoderOptions;
use draco_codec::geometry_attribute::{GeometryAttributeType, PointAttribute};
use draco_codec::geometry_indices::{AttributeValueIndex, PointIndex};
use draco_codec::mesh::Mesh;
use draco_codec::mesh_decoder::MeshDecoder;
use draco_codec::mesh_edgebreaker_shared::TraversalKind;
use draco_codec::mesh_encoder::MeshEncoder;

fn icosahedron() -> Mesh {
    // Scaled golden-ratio coordinates, rounded to integers.
    let p = 1618;
    let q = 1000;
    let positions = [
        [-q, p, 0],
        [q, p, 0],
        [-q, -p, 0],
        [q, -p, 0],
        [0, -q, p],
        [0, q, p],
        [0, -q, -p],
        [0, q, -p],
        [p, 0, -q],
        [p, 0, q],
        [-p, 0, -q],
        [-p, 0, q],
    ];
    let faces = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    build_position_mesh(&positions, &faces)
}

#[test]
fn test_icosahedron_all_traversal_kinds() {
    let mesh = icosahedron();
    for kind in [
        TraversalKind::Standard,
        TraversalKind::Predictive,
        TraversalKind::Valence,
    ] {
        let options = EncoderOptions {
            traversal_kind_override: Some(kind),
            ..Default::default()
        };
        let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
        let decoded = MeshDecoder::decode(&encoded).unwrap();
        assert_eq!(decoded.num_points(), 12);
        assert_eq!(decoded.num_faces(), 20);
        assert_same_faces(&mesh, &decoded);
    }
}

#[test]
fn test_icosahedron_prediction_degree_traversal() {
    let mesh = icosahedron();
    let options = EncoderOptions {
        encoding_speed: 0,
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);
}

#[test]
fn test_single_triangle_round_trip() {
    let mesh = build_position_mesh(&[[0, 0, 0], [5, 0, 0], [0, 5, 0]], &[[0, 1, 2]]);
    for kind in [
        TraversalKind::Standard,
        TraversalKind::Predictive,
        TraversalKind::Valence,
    ] {
        let options = EncoderOptions {
            traversal_kind_override: Some(kind),
            ..Default::default()
        };
        let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
        let decoded = MeshDecoder::decode(&encoded).unwrap();
        assert_eq!(decoded.num_faces(), 1);
        assert_eq!(decoded.num_points(), 3);
        assert_same_faces(&mesh, &decoded);
    }
}

#[test]
fn test_two_disconnected_components_round_trip() {
    let mesh = build_position_mesh(
        &[
            [0, 0, 0],
            [1, 0, 0],
            [0, 1, 0],
            [10, 0, 0],
            [11, 0, 0],
            [10, 1, 0],
            [10, 0, 1],
        ],
        &[[0, 1, 2], [3, 4, 5], [4, 6, 5], [3, 5, 6], [3, 6, 4]],
    );
    for kind in [
        TraversalKind::Standard,
        TraversalKind::Predictive,
        TraversalKind::Valence,
    ] {
        let options = EncoderOptions {
            traversal_kind_override: Some(kind),
            ..Default::default()
        };
        let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
        let decoded = MeshDecoder::decode(&encoded).unwrap();
        assert_eq!(decoded.num_faces(), 5);
        assert_same_faces(&mesh, &decoded);
    }
}

#[test]
fn test_two_component_generic_attribute() {
    let mut mesh = icosahedron();
    let mut generic =
        PointAttribute::new(GeometryAttributeType::Generic, 2, DataType::UInt16, false, 12);
    for i in 0..12u32 {
        generic.set_value_from_i32(AttributeValueIndex(i), &[(i * 11) as i32, (i * 7) as i32]);
    }
    mesh.add_attribute(generic);

    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);

    // The generic attribute is integral: values must survive exactly.
    let original = mesh.named_attribute(GeometryAttributeType::Generic).unwrap();
    let restored = decoded
        .named_attribute(GeometryAttributeType::Generic)
        .unwrap();
    let collect = |mesh: &Mesh, att: &PointAttribute| {
        let mut values: Vec<[i32; 2]> = (0..mesh.num_points())
            .map(|p| {
                let mut out = [0i32; 2];
                att.convert_value_to_i32(att.mapped_index(PointIndex(p as u32)), &mut out);
                out
            })
            .collect();
        values.sort();
        values
    };
    assert_eq!(collect(&mesh, original), collect(&decoded, restored));
}

fn grid_with_normals() -> Mesh {
    const N: usize = 8;
    let mut mesh = Mesh::new();
    mesh.set_num_points(N * N);
    let mut pos = PointAttribute::new(
        GeometryAttributeType::Position,
        3,
        DataType::Float32,
        false,
        N * N,
    );
    let mut normals = PointAttribute::new(
        GeometryAttributeType::Normal,
        3,
        DataType::Float32,
        true,
        N * N,
    );
    for row in 0..N {
        for col in 0..N {
            let x = col as f32 / (N - 1) as f32;
            let y = row as f32 / (N - 1) as f32;
            let z = 0.25 * (x * 6.0).sin() * (y * 6.0).cos();
            pos.set_value_from_f32(AttributeValueIndex((row * N + col) as u32), &[x, y, z]);

            // Analytic surface normal, normalized.
            let dx = -1.5 * (x * 6.0).cos() * (y * 6.0).cos();
            let dy = 1.5 * (x * 6.0).sin() * (y * 6.0).sin();
            let len = (dx * dx + dy * dy + 1.0).sqrt();
            normals.set_value_from_f32(
                AttributeValueIndex((row * N + col) as u32),
                &[dx / len, dy / len, 1.0 / len],
            );
        }
    }
    mesh.add_attribute(pos);
    mesh.add_attribute(normals);
    for row in 0..N as u32 - 1 {
        for col in 0..N as u32 - 1 {
            let a = row * N as u32 + col;
            let b = a + 1;
            let c = a + N as u32;
            let d = c + 1;
            mesh.add_face([PointIndex(a), PointIndex(b), PointIndex(c)]);
            mesh.add_face([PointIndex(b), PointIndex(d), PointIndex(c)]);
        }
    }
    mesh
}

#[test]
fn test_octahedral_normals_round_trip() {
    let mesh = grid_with_normals();
    let options = EncoderOptions {
        position_quantization_bits: 14,
        normal_quantization_bits: 10,
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_eq!(decoded.num_points(), mesh.num_points());

    // Every original normal must have a decoded counterpart pointing in
    // nearly the same direction (the loss is the octahedral
    // quantization, not the prediction pipeline).
    let original_att = mesh.named_attribute(GeometryAttributeType::Normal).unwrap();
    let decoded_att = decoded
        .named_attribute(GeometryAttributeType::Normal)
        .unwrap();
    let decoded_normals: Vec<[f32; 3]> = (0..decoded.num_points())
        .map(|p| {
            let mut out = [0f32; 3];
            decoded_att.convert_value(decoded_att.mapped_index(PointIndex(p as u32)), &mut out);
            out
        })
        .collect();
    for p in 0..mesh.num_points() {
        let mut normal = [0f32; 3];
        original_att.convert_value(original_att.mapped_index(PointIndex(p as u32)), &mut normal);
        let aligned = decoded_normals.iter().any(|candidate| {
            let dot: f32 = (0..3).map(|c| candidate[c] * normal[c]).sum();
            dot > 0.99
        });
        assert!(aligned, "no decoded normal aligned with {:?}", normal);
    }
}

#[test]
fn test_quantized_uvs_round_trip() {
    let mut mesh = icosahedron();
    let mut uv = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Float32, false, 12);
    for i in 0..12u32 {
        uv.set_value_from_f32(
            AttributeValueIndex(i),
            &[i as f32 / 11.0, (11 - i) as f32 / 11.0],
        );
    }
    mesh.add_attribute(uv);

    let options = EncoderOptions {
        tex_coord_quantization_bits: 12,
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);

    let restored = decoded
        .named_attribute(GeometryAttributeType::TexCoord)
        .unwrap();
    let max_error = 1.0f32 / ((1 << 12) - 1) as f32;
    let decoded_uvs: Vec<[f32; 2]> = (0..decoded.num_points())
        .map(|p| {
            let mut out = [0f32; 2];
            restored.convert_value(restored.mapped_index(PointIndex(p as u32)), &mut out);
            out
        })
        .collect();
    let original = mesh.named_attribute(GeometryAttributeType::TexCoord).unwrap();
    for p in 0..mesh.num_points() {
        let mut value = [0f32; 2];
        original.convert_value(original.mapped_index(PointIndex(p as u32)), &mut value);
        let close = decoded_uvs
            .iter()
            .any(|c| (c[0] - value[0]).abs() <= max_error && (c[1] - value[1]).abs() <= max_error);
        assert!(close, "no decoded UV near {:?}", value);
    }
}
