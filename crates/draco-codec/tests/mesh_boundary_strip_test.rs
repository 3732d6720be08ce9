//! Round trip of an open ribbon: a strip of 10 triangles with a single
//! boundary loop of 12 vertices.

mod common;

use std::collections::HashMap;

use common::{assert_same_faces, build_position_mesh};
use draco_codec::decoder_buffer::DecoderBuffer;
use draco_codec::encoder_options::EncoderOptions;
use draco_codec::geometry_indices::FaceIndex;
use draco_codec::mesh::Mesh;
use draco_codec::mesh_decoder::MeshDecoder;
use draco_codec::mesh_edgebreaker_decoder::MeshEdgebreakerConnectivityDecoder;
use draco_codec::mesh_edgebreaker_shared::TraversalKind;
use draco_codec::mesh_encoder::MeshEncoder;

/// 12 vertices in two rows of six, zig-zag triangulated.
fn ribbon() -> Mesh {
    let mut positions = Vec::new();
    for row in 0..2 {
        for col in 0..6 {
            positions.push([col as i32, row as i32, 0]);
        }
    }
    let mut faces = Vec::new();
    for col in 0..5u32 {
        let a = col;
        let b = col + 1;
        let c = col + 6;
        let d = col + 7;
        faces.push([a, b, c]);
        faces.push([b, d, c]);
    }
    build_position_mesh(&positions, &faces)
}

/// Number of distinct vertices on boundary edges (edges used by exactly
/// one face).
fn boundary_vertex_count(mesh: &Mesh) -> usize {
    let mut edge_uses: HashMap<(u32, u32), usize> = HashMap::new();
    for f in 0..mesh.num_faces() {
        let face = mesh.face(FaceIndex(f as u32));
        for i in 0..3 {
            let a = face[i].value();
            let b = face[(i + 1) % 3].value();
            let key = (a.min(b), a.max(b));
            *edge_uses.entry(key).or_insert(0) += 1;
        }
    }
    let mut boundary_vertices: Vec<u32> = edge_uses
        .iter()
        .filter(|&(_, &uses)| uses == 1)
        .flat_map(|(&(a, b), _)| [a, b])
        .collect();
    boundary_vertices.sort_unstable();
    boundary_vertices.dedup();
    boundary_vertices.len()
}

#[test]
fn test_ribbon_round_trip() {
    let mesh = ribbon();
    assert_eq!(mesh.num_faces(), 10);
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();

    assert_eq!(decoded.num_points(), 12);
    assert_same_faces(&mesh, &decoded);
    assert_eq!(boundary_vertex_count(&decoded), 12);
}

#[test]
fn test_ribbon_emits_one_hole_event() {
    let mesh = ribbon();
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();

    // Replay the connectivity decode to inspect the hole events. The
    // header is 11 bytes, followed by the traversal kind byte.
    let kind = TraversalKind::from_u8(encoded[11]).unwrap();
    let mut buffer = DecoderBuffer::new(&encoded[12..]);
    let mut decoded_mesh = Mesh::new();
    let mut connectivity = MeshEdgebreakerConnectivityDecoder::new(kind);
    connectivity
        .decode_connectivity(&mut buffer, &mut decoded_mesh)
        .unwrap();
    assert_eq!(connectivity.num_hole_events(), 1);
}

#[test]
fn test_ribbon_round_trip_valence() {
    let mesh = ribbon();
    let options = EncoderOptions {
        traversal_kind_override: Some(TraversalKind::Valence),
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);
}
