//! Quantized float positions: reconstruction error stays within one
//! quantization step and the byte stream is deterministic.

use draco_codec::draco_types::DataType;
use draco_codec::encoder_options::EncoderOptions;
use draco_codec::geometry_attribute::{GeometryAttributeType, PointAttribute};
use draco_codec::geometry_indices::{AttributeValueIndex, PointIndex};
use draco_codec::mesh::Mesh;
use draco_codec::mesh_decoder::MeshDecoder;
use draco_codec::mesh_encoder::MeshEncoder;

/// A 32 x 32 vertex grid over the unit square, lifted by a deterministic
/// pseudo-random height: 1024 vertices, 1922 triangles.
fn unit_cube_sampling() -> Mesh {
    const N: usize = 32;
    let mut mesh = Mesh::new();
    mesh.set_num_points(N * N);
    let mut att = PointAttribute::new(
        GeometryAttributeType::Position,
        3,
        DataType::Float32,
        false,
        N * N,
    );
    let mut state = 0x2545F491u64;
    for row in 0..N {
        for col in 0..N {
            // xorshift keeps the sampling reproducible across runs.
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let height = (state % 1000) as f32 / 1000.0;
            let value = [
                col as f32 / (N - 1) as f32,
                row as f32 / (N - 1) as f32,
                height,
            ];
            att.set_value_from_f32(AttributeValueIndex((row * N + col) as u32), &value);
        }
    }
    mesh.add_attribute(att);
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

fn float_position(mesh: &Mesh, point: PointIndex) -> [f32; 3] {
    let att = mesh
        .named_attribute(GeometryAttributeType::Position)
        .unwrap();
    let mut out = [0f32; 3];
    att.convert_value(att.mapped_index(point), &mut out);
    out
}

#[test]
fn test_quantized_positions_error_bound() {
    let mesh = unit_cube_sampling();
    let options = EncoderOptions {
        position_quantization_bits: 11,
        ..Default::default()
    };
    let encoded = MeshEncoder::encode(&mesh, &options).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_eq!(decoded.num_points(), mesh.num_points());

    // Match decoded points to original ones through the grid structure:
    // every original position must have a decoded point within the
    // quantization step.
    let max_error = 1.0f32 / ((1 << 11) - 1) as f32;
    let decoded_positions: Vec<[f32; 3]> = (0..decoded.num_points())
        .map(|p| float_position(&decoded, PointIndex(p as u32)))
        .collect();
    for p in 0..mesh.num_points() {
        let original = float_position(&mesh, PointIndex(p as u32));
        let close = decoded_positions.iter().any(|candidate| {
            (0..3).all(|c| (candidate[c] - original[c]).abs() <= max_error)
        });
        assert!(close, "no decoded point near {:?}", original);
    }
}

#[test]
fn test_quantized_stream_is_deterministic() {
    let mesh = unit_cube_sampling();
    let options = EncoderOptions {
        position_quantization_bits: 11,
        ..Default::default()
    };
    let first = MeshEncoder::encode(&mesh, &options).unwrap();
    let second = MeshEncoder::encode(&mesh, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_lossless_float_positions_pass_through() {
    let mesh = unit_cube_sampling();
    // No quantization configured: floats travel through the raw path.
    let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
    let decoded = MeshDecoder::decode(&encoded).unwrap();
    assert_eq!(decoded.num_points(), mesh.num_points());

    let mut original: Vec<[u32; 3]> = (0..mesh.num_points())
        .map(|p| float_position(&mesh, PointIndex(p as u32)).map(f32::to_bits))
        .collect();
    let mut restored: Vec<[u32; 3]> = (0..decoded.num_points())
        .map(|p| float_position(&decoded, PointIndex(p as u32)).map(f32::to_bits))
        .collect();
    original.sort();
    restored.sort();
    assert_eq!(original, restored);
}
