//! Round trip of a closed tetrahedron with lossless Int32 positions,
//! across all traversal coders.

mod common;

use common::{assert_same_faces, build_position_mesh, position_of};
use draco_codec::encoder_options::EncoderOptions;
use draco_codec::geometry_indices::PointIndex;
use draco_codec::mesh_edgebreaker_shared::TraversalKind;
use draco_codec::mesh_decoder::MeshDecoder;
use draco_codec::mesh_encoder::MeshEncoder;

fn tetrahedron() -> draco_codec::mesh::Mesh {
    build_position_mesh(
        &[[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]],
        &[[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
    )
}

fn round_trip_with_kind(kind: TraversalKind) {
    let mesh = tetrahedron();
    let options = EncoderOptions {
        traversal_kind_override: Some(kind),
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();

    assert_eq!(decoded.num_points(), 4);
    assert_eq!(decoded.num_faces(), 4);

    let mut original_positions: Vec<[i32; 3]> = (0..4)
        .map(|p| position_of(&mesh, PointIndex(p)))
        .collect();
    let mut decoded_positions: Vec<[i32; 3]> = (0..4)
        .map(|p| position_of(&decoded, PointIndex(p)))
        .collect();
    original_positions.sort();
    decoded_positions.sort();
    assert_eq!(original_positions, decoded_positions);

    assert_same_faces(&mesh, &decoded);
}

#[test]
fn test_tetrahedron_standard_traversal() {
    round_trip_with_kind(TraversalKind::Standard);
}

#[test]
fn test_tetrahedron_predictive_traversal() {
    round_trip_with_kind(TraversalKind::Predictive);
}

#[test]
fn test_tetrahedron_valence_traversal() {
    round_trip_with_kind(TraversalKind::Valence);
}

#[test]
fn test_tetrahedron_difference_prediction() {
    let mesh = tetrahedron();
    let options = EncoderOptions {
        prediction_override: Some(
            draco_codec::prediction_scheme::PredictionSchemeMethod::Difference,
        ),
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_same_faces(&mesh, &decoded);
}

#[test]
fn test_tetrahedron_parallelogram_prediction() {
    let mesh = tetrahedron();
    for method in [
        draco_codec::prediction_scheme::PredictionSchemeMethod::Parallelogram,
        draco_codec::prediction_scheme::PredictionSchemeMethod::MultiParallelogram,
    ] {
        let options = EncoderOptions {
            prediction_override: Some(method),
            ..Default::default()
        };
        let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
        let decoded = MeshDecoder::decode(&encoded).unwrap();
        assert_same_faces(&mesh, &decoded);
    }
}

#[test]
fn test_decoder_rejects_truncated_stream() {
    let mesh = tetrahedron();
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    for len in [0, 4, 11, encoded.len() / 2] {
        assert!(MeshDecoder::decode(&encoded[..len]).is_err());
    }
}

#[test]
fn test_decoder_rejects_bad_magic() {
    let mesh = tetrahedron();
    let mut encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    encoded[0] = b'X';
    assert!(matches!(
        MeshDecoder::decode(&encoded),
        Err(draco_codec::DracoError::InvalidHeader(_))
    ));
}

#[test]
fn test_decoder_rejects_future_version() {
    let mesh = tetrahedron();
    let mut encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    encoded[5] = 9;
    assert!(matches!(
        MeshDecoder::decode(&encoded),
        Err(draco_codec::DracoError::UnsupportedVersion(_))
    ));
}
