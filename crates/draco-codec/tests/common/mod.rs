//! Helpers shared by the round-trip tests.

use draco_codec::draco_types::DataType;
use draco_codec::geometry_attribute::{GeometryAttributeType, PointAttribute};
use draco_codec::geometry_indices::{AttributeValueIndex, FaceIndex, PointIndex};
use draco_codec::mesh::Mesh;

/// Builds a mesh with one Int32 position attribute, one point per
/// unique position.
pub fn build_position_mesh(positions: &[[i32; 3]], faces: &[[u32; 3]]) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.set_num_points(positions.len());
    let mut att = PointAttribute::new(
        GeometryAttributeType::Position,
        3,
        DataType::Int32,
        false,
        positions.len(),
    );
    for (i, pos) in positions.iter().enumerate() {
        att.set_value_from_i32(AttributeValueIndex(i as u32), pos);
    }
    mesh.add_attribute(att);
    for face in faces {
        mesh.add_face([
            PointIndex(face[0]),
            PointIndex(face[1]),
            PointIndex(face[2]),
        ]);
    }
    mesh
}

/// Reads the position of a point as an i32 triple.
pub fn position_of(mesh: &Mesh, point: PointIndex) -> [i32; 3] {
    let att = mesh
        .named_attribute(GeometryAttributeType::Position)
        .expect("mesh has positions");
    let mut out = [0i32; 3];
    att.convert_value_to_i32(att.mapped_index(point), &mut out);
    out
}

/// A face as position triples, cyclically rotated so the smallest
/// vertex comes first (orientation preserved).
pub fn canonical_face(mesh: &Mesh, face: FaceIndex) -> [[i32; 3]; 3] {
    let f = mesh.face(face);
    let verts = [
        position_of(mesh, f[0]),
        position_of(mesh, f[1]),
        position_of(mesh, f[2]),
    ];
    let start = (0..3).min_by_key(|&i| verts[i]).unwrap();
    [
        verts[start],
        verts[(start + 1) % 3],
        verts[(start + 2) % 3],
    ]
}

/// Asserts that both meshes contain the same faces (as position
/// triples, orientation preserved, order free).
pub fn assert_same_faces(original: &Mesh, decoded: &Mesh) {
    assert_eq!(original.num_faces(), decoded.num_faces());
    let mut original_faces: Vec<_> = (0..original.num_faces())
        .map(|f| canonical_face(original, FaceIndex(f as u32)))
        .collect();
    let mut decoded_faces: Vec<_> = (0..decoded.num_faces())
        .map(|f| canonical_face(decoded, FaceIndex(f as u32)))
        .collect();
    original_faces.sort();
    decoded_faces.sort();
    assert_eq!(original_faces, decoded_faces);
}
