use std::ops::{Deref, DerefMut};

use crate::geometry_indices::{FaceIndex, PointIndex};
use crate::point_cloud::PointCloud;

pub type Face = [PointIndex; 3];

/// How an attribute varies over the mesh surface. Used by the encoder to
/// decide whether per-corner connectivity must be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshAttributeElementType {
    /// Values attached to mesh vertices; all corners around a vertex
    /// share one value.
    Vertex = 0,
    /// Values attached to corners; may differ across edges (seams).
    Corner = 1,
    /// One value for the whole face.
    Face = 2,
}

/// Triangular mesh: a point cloud plus faces referencing its points.
#[derive(Debug, Default, Clone)]
pub struct Mesh {
    point_cloud: PointCloud,
    faces: Vec<Face>,
    attribute_element_types: Vec<MeshAttributeElementType>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn set_face(&mut self, face_id: FaceIndex, face: Face) {
        if face_id.index() >= self.faces.len() {
            self.faces.resize(face_id.index() + 1, [PointIndex(0); 3]);
        }
        self.faces[face_id.index()] = face;
    }

    pub fn face(&self, face_id: FaceIndex) -> Face {
        self.faces[face_id.index()]
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn set_num_faces(&mut self, num_faces: usize) {
        self.faces.resize(num_faces, [PointIndex(0); 3]);
    }

    /// Point referenced by the given corner (`corner = 3 * face + local`).
    pub fn corner_to_point(&self, corner: u32) -> PointIndex {
        self.faces[(corner / 3) as usize][(corner % 3) as usize]
    }

    pub fn attribute_element_type(&self, att_id: i32) -> MeshAttributeElementType {
        self.attribute_element_types
            .get(att_id as usize)
            .copied()
            .unwrap_or(MeshAttributeElementType::Corner)
    }

    pub fn set_attribute_element_type(&mut self, att_id: i32, element_type: MeshAttributeElementType) {
        if att_id as usize >= self.attribute_element_types.len() {
            self.attribute_element_types
                .resize(att_id as usize + 1, MeshAttributeElementType::Corner);
        }
        self.attribute_element_types[att_id as usize] = element_type;
    }

    /// Point deduplication with the required face-index rewrite.
    pub fn deduplicate_point_ids(&mut self) {
        let point_map = self.point_cloud.deduplicate_point_ids();
        for face in self.faces.iter_mut() {
            for point in face.iter_mut() {
                *point = point_map[point.index()];
            }
        }
    }
}

impl Deref for Mesh {
    type Target = PointCloud;

    fn deref(&self) -> &Self::Target {
        &self.point_cloud
    }
}

impl DerefMut for Mesh {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.point_cloud
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_to_point() {
        let mut mesh = Mesh::new();
        mesh.add_face([PointIndex(4), PointIndex(5), PointIndex(6)]);
        mesh.add_face([PointIndex(6), PointIndex(5), PointIndex(7)]);
        assert_eq!(mesh.corner_to_point(0), PointIndex(4));
        assert_eq!(mesh.corner_to_point(4), PointIndex(5));
        assert_eq!(mesh.corner_to_point(5), PointIndex(7));
    }
}
