//! Round trip of a non-manifold fan: three triangles sharing one edge.
//! The shared edge must be split during encoding and re-merged by the
//! final point deduplication.

mod common;

use common::{assert_same_faces, build_position_mesh};
use draco_codec::decoder_buffer::DecoderBuffer;
use draco_codec::encoder_options::EncoderOptions;
use draco_codec::mesh::Mesh;
use draco_codec::mesh_decoder::MeshDecoder;
use draco_codec::mesh_edgebreaker_decoder::MeshEdgebreakerConnectivityDecoder;
use draco_codec::mesh_edgebreaker_encoder::MeshEdgebreakerConnectivityEncoder;
use draco_codec::mesh_edgebreaker_shared::TraversalKind;
use draco_codec::mesh_encoder::MeshEncoder;

fn manifold_fan() -> Mesh {
    build_position_mesh(
        &[
            [0, 0, 0],
            [1, 0, 0],
            [0, 1, 0],
            [0, 0, 1],
            [-1, -1, 0],
        ],
        &[[0, 1, 2], [2, 1, 3], [1, 0, 4]],
    )
}

#[test]
fn test_encoder_splits_non_manifold_edge() {
    // Three faces around edge (0, 1): the third one is disconnected and
    // its endpoints become new vertices.
    let mesh = build_position_mesh(
        &[[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1], [0, -1, 0]],
        &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
    );
    let encoder = MeshEdgebreakerConnectivityEncoder::new(&mesh, TraversalKind::Standard).unwrap();
    assert!(encoder.corner_table.num_new_vertices() >= 1);
}

#[test]
fn test_non_manifold_round_trip() {
    let mesh = build_position_mesh(
        &[[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1], [0, -1, 0]],
        &[[0, 1, 2], [1, 0, 3], [0, 1, 4]],
    );
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);

    // The wire carries the split vertex count and the decoder sees the
    // same number.
    let encoder = MeshEdgebreakerConnectivityEncoder::new(&mesh, TraversalKind::Standard).unwrap();
    let num_new = encoder.corner_table.num_new_vertices();
    assert!(num_new >= 1);

    let kind = TraversalKind::from_u8(encoded[11]).unwrap();
    let mut buffer = DecoderBuffer::new(&encoded[12..]);
    let mut shell = Mesh::new();
    let mut connectivity = MeshEdgebreakerConnectivityDecoder::new(kind);
    connectivity.decode_connectivity(&mut buffer, &mut shell).unwrap();
    assert_eq!(connectivity.num_new_vertices(), num_new);
}

#[test]
fn test_manifold_fan_round_trip() {
    let mesh = manifold_fan();
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);
}
