//! Core of the Draco mesh codec: the Edgebreaker connectivity
//! compressor and decompressor, the corner-table data structure, the
//! per-attribute prediction and entropy coding pipeline, and the shared
//! low-level codecs (rANS, symbol coder, varint, bit buffers).
//!
//! The codec is whole-buffer in, whole-geometry out:
//!
//! ```no_run
//! use draco_codec::encoder_options::EncoderOptions;
//! use draco_codec::mesh::Mesh;
//! use draco_codec::mesh_decoder::MeshDecoder;
//! use draco_codec::mesh_encoder::MeshEncoder;
//!
//! # fn build_mesh() -> Mesh { Mesh::new() }
//! let mesh = build_mesh();
//! let encoded = MeshEncoder::encode(&mesh, &EncoderOptions::default()).unwrap();
//! let decoded = MeshDecoder::decode(&encoded).unwrap();
//! ```

pub mod status;

pub mod bit_utils;
pub mod data_buffer;
pub mod decoder_buffer;
pub mod draco_types;
pub mod encoder_buffer;
pub mod geometry_indices;
pub mod math_utils;

pub mod adaptive_rans_bit_decoder;
pub mod adaptive_rans_bit_encoder;
pub mod ans;
pub mod direct_bit_decoder;
pub mod direct_bit_encoder;
pub mod folded_bit32_coder;
pub mod rans_bit_decoder;
pub mod rans_bit_encoder;
pub mod rans_symbol_coding;
pub mod rans_symbol_decoder;
pub mod rans_symbol_encoder;
pub mod shannon_entropy;
pub mod symbol_encoding;

pub mod geometry_attribute;
pub mod mesh;
pub mod point_cloud;

pub mod corner_table;
pub mod mesh_attribute_corner_table;

pub mod edgebreaker_traversal_decoder;
pub mod edgebreaker_traversal_encoder;
pub mod edgebreaker_valence;
pub mod mesh_edgebreaker_decoder;
pub mod mesh_edgebreaker_encoder;
pub mod mesh_edgebreaker_shared;
pub mod mesh_traversal_sequencer;

pub mod attribute_octahedron_transform;
pub mod attribute_quantization_transform;
pub mod normal_compression_utils;
pub mod prediction_scheme;
pub mod prediction_scheme_constrained_multi_parallelogram;
pub mod prediction_scheme_difference;
pub mod prediction_scheme_geometric_normal;
pub mod prediction_scheme_multi_parallelogram;
pub mod prediction_scheme_parallelogram;
pub mod prediction_scheme_tex_coords;
pub mod quantization_utils;
pub mod sequential_attribute_decoder;
pub mod sequential_attribute_encoder;
pub mod sequential_integer_attribute_decoder;
pub mod sequential_integer_attribute_encoder;

pub mod compression_config;
pub mod encoder_options;
pub mod mesh_decoder;
pub mod mesh_encoder;
pub mod version;

pub use encoder_options::EncoderOptions;
pub use mesh::Mesh;
pub use mesh_decoder::MeshDecoder;
pub use mesh_encoder::MeshEncoder;
pub use status::{DracoError, Status, StatusOr};
