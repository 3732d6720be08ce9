/// Geometry container kinds (`enc_type` header byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedGeometryType {
    PointCloud = 0,
    TriangularMesh = 1,
}

/// Mesh coding methods (`enc_method` header byte for meshes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshEncodingMethod {
    Sequential = 0,
    Edgebreaker = 1,
}

/// Point cloud coding methods (`enc_method` header byte for clouds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointCloudEncodingMethod {
    Sequential = 0,
    KdTree = 1,
}

/// Per-attribute sequential coder selector on the wire.
pub const SEQUENTIAL_ATTRIBUTE_ENCODER_GENERIC: u8 = 0;
pub const SEQUENTIAL_ATTRIBUTE_ENCODER_INTEGER: u8 = 1;
pub const SEQUENTIAL_ATTRIBUTE_ENCODER_QUANTIZATION: u8 = 2;
pub const SEQUENTIAL_ATTRIBUTE_ENCODER_NORMALS: u8 = 3;

/// Attribute element kinds on the wire (per-attribute decoder header).
pub const MESH_VERTEX_ATTRIBUTE: u8 = 0;
pub const MESH_CORNER_ATTRIBUTE: u8 = 1;
