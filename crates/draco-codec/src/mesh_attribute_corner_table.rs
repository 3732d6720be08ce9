//! Connectivity overlay for a single attribute. The overlay marks seam
//! edges on top of a base corner table; traversals treat seam edges as
//! boundaries, which partitions each vertex 1-ring into one attribute
//! vertex per seam-free fan.

use crate::corner_table::CornerTable;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::{
    AttributeValueIndex, CornerIndex, VertexIndex, INVALID_CORNER_INDEX, INVALID_VERTEX_INDEX,
};
use crate::mesh::Mesh;

#[derive(Debug, Default, Clone)]
pub struct MeshAttributeCornerTable {
    is_edge_on_seam: Vec<bool>,
    is_vertex_on_seam: Vec<bool>,
    no_interior_seams: bool,
    corner_to_vertex_map: Vec<VertexIndex>,
    vertex_to_left_most_corner_map: Vec<CornerIndex>,
    vertex_to_attribute_entry_id_map: Vec<AttributeValueIndex>,
}

impl MeshAttributeCornerTable {
    pub fn init_empty(table: &CornerTable) -> MeshAttributeCornerTable {
        MeshAttributeCornerTable {
            is_edge_on_seam: vec![false; table.num_corners()],
            is_vertex_on_seam: vec![false; table.num_vertices()],
            no_interior_seams: true,
            corner_to_vertex_map: vec![INVALID_VERTEX_INDEX; table.num_corners()],
            vertex_to_left_most_corner_map: Vec::new(),
            vertex_to_attribute_entry_id_map: Vec::new(),
        }
    }

    /// Detects the seams of |att| on |mesh| and builds the overlay.
    pub fn init_from_attribute(
        mesh: &Mesh,
        table: &CornerTable,
        att: &PointAttribute,
    ) -> MeshAttributeCornerTable {
        let mut act = Self::init_empty(table);

        for c in 0..table.num_corners() {
            let corner = CornerIndex(c as u32);
            if table.is_degenerated(table.face(corner)) {
                continue;
            }
            let opp_corner = table.opposite(corner);
            if !opp_corner.is_valid() {
                // Boundary edges are implicit seams; they only matter for
                // the vertex flags.
                act.is_edge_on_seam[c] = true;
                act.is_vertex_on_seam[table.vertex(table.next(corner)).index()] = true;
                act.is_vertex_on_seam[table.vertex(table.previous(corner)).index()] = true;
                continue;
            }
            if opp_corner < corner {
                continue; // Edge visited from the other side already.
            }

            // The edge is a seam when the attribute values disagree on
            // either endpoint across the two faces.
            let our_next = mesh.corner_to_point(table.next(corner).value());
            let our_prev = mesh.corner_to_point(table.previous(corner).value());
            let their_next = mesh.corner_to_point(table.next(opp_corner).value());
            let their_prev = mesh.corner_to_point(table.previous(opp_corner).value());
            if att.mapped_index(our_next) != att.mapped_index(their_prev)
                || att.mapped_index(our_prev) != att.mapped_index(their_next)
            {
                act.add_seam_edge(table, corner);
            }
        }

        act.recompute_vertices(table, Some((mesh, att)));
        act
    }

    /// Marks the edge opposite |corner| (and its twin) as a seam.
    pub fn add_seam_edge(&mut self, table: &CornerTable, corner: CornerIndex) {
        self.is_edge_on_seam[corner.index()] = true;
        self.is_vertex_on_seam[table.vertex(table.next(corner)).index()] = true;
        self.is_vertex_on_seam[table.vertex(table.previous(corner)).index()] = true;

        let opp_corner = table.opposite(corner);
        if opp_corner.is_valid() {
            self.no_interior_seams = false;
            self.is_edge_on_seam[opp_corner.index()] = true;
        }
    }

    /// Rebuilds attribute vertices from the current seam edges. Must run
    /// whenever the seams change. When |source| is absent the attribute
    /// entry mapping is the identity.
    pub fn recompute_vertices(
        &mut self,
        table: &CornerTable,
        source: Option<(&Mesh, &PointAttribute)>,
    ) {
        self.vertex_to_left_most_corner_map.clear();
        self.vertex_to_attribute_entry_id_map.clear();
        self.corner_to_vertex_map
            .iter_mut()
            .for_each(|v| *v = INVALID_VERTEX_INDEX);

        let mut num_vertices = 0usize;
        for v in 0..table.num_vertices() {
            let vertex = VertexIndex(v as u32);
            let left_most = table.left_most_corner(vertex);
            if !left_most.is_valid() {
                continue; // Isolated vertex.
            }

            // Collect the ring in clockwise order.
            let mut ring: Vec<CornerIndex> = Vec::new();
            let mut corner = left_most;
            loop {
                ring.push(corner);
                corner = table.swing_right(corner);
                if corner == left_most || !corner.is_valid() {
                    break;
                }
            }
            let is_closed = corner == left_most;

            // Seam crossed between ring[i] and ring[i+1]: swinging right
            // from c goes through the edge opposite previous(c).
            let crossed_seam =
                |c: CornerIndex| self.is_edge_on_seam[table.previous(c).index()];

            // On a closed ring that carries seams, rotate the start to
            // sit just after a seam crossing.
            let mut start = 0usize;
            if is_closed {
                if let Some(i) = ring.iter().position(|&c| crossed_seam(c)) {
                    start = (i + 1) % ring.len();
                }
            }

            let mut current_vertex = INVALID_VERTEX_INDEX;
            for i in 0..ring.len() {
                let c = ring[(start + i) % ring.len()];
                let new_partition = i == 0
                    || crossed_seam(ring[(start + i + ring.len() - 1) % ring.len()]);
                if new_partition {
                    current_vertex = VertexIndex(num_vertices as u32);
                    num_vertices += 1;
                    self.vertex_to_left_most_corner_map.push(c);
                    let entry = match source {
                        Some((mesh, att)) => att.mapped_index(mesh.corner_to_point(c.value())),
                        None => AttributeValueIndex(current_vertex.value()),
                    };
                    self.vertex_to_attribute_entry_id_map.push(entry);
                }
                self.corner_to_vertex_map[c.index()] = current_vertex;
            }
        }
    }

    #[inline]
    pub fn is_corner_opposite_to_seam_edge(&self, corner: CornerIndex) -> bool {
        self.is_edge_on_seam[corner.index()]
    }

    #[inline]
    pub fn is_corner_on_seam(&self, table: &CornerTable, corner: CornerIndex) -> bool {
        self.is_vertex_on_seam[table.vertex(corner).index()]
    }

    pub fn no_interior_seams(&self) -> bool {
        self.no_interior_seams
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_to_left_most_corner_map.len()
    }

    #[inline]
    pub fn vertex(&self, corner: CornerIndex) -> VertexIndex {
        if !corner.is_valid() {
            return INVALID_VERTEX_INDEX;
        }
        self.corner_to_vertex_map[corner.index()]
    }

    /// Attribute value entry backing the given attribute vertex.
    pub fn vertex_parent(&self, vertex: VertexIndex) -> AttributeValueIndex {
        self.vertex_to_attribute_entry_id_map[vertex.index()]
    }

    #[inline]
    pub fn left_most_corner(&self, vertex: VertexIndex) -> CornerIndex {
        self.vertex_to_left_most_corner_map[vertex.index()]
    }

    /// Seam-aware opposite: a seam edge behaves like a boundary.
    #[inline]
    pub fn opposite(&self, table: &CornerTable, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() || self.is_corner_opposite_to_seam_edge(corner) {
            return INVALID_CORNER_INDEX;
        }
        table.opposite(corner)
    }

    #[inline]
    pub fn swing_right(&self, table: &CornerTable, corner: CornerIndex) -> CornerIndex {
        table.previous(self.opposite(table, table.previous(corner)))
    }

    #[inline]
    pub fn swing_left(&self, table: &CornerTable, corner: CornerIndex) -> CornerIndex {
        table.next(self.opposite(table, table.next(corner)))
    }

    pub fn is_on_boundary(&self, table: &CornerTable, vertex: VertexIndex) -> bool {
        let corner = self.left_most_corner(vertex);
        if !corner.is_valid() {
            return true;
        }
        !self.swing_left(table, corner).is_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draco_types::DataType;
    use crate::geometry_attribute::GeometryAttributeType;
    use crate::geometry_indices::PointIndex;

    /// Quad (two triangles) with a UV seam on the shared edge.
    fn quad_with_seam() -> (Mesh, CornerTable) {
        let mut mesh = Mesh::new();
        mesh.set_num_points(6);
        mesh.add_face([PointIndex(0), PointIndex(1), PointIndex(2)]);
        mesh.add_face([PointIndex(4), PointIndex(3), PointIndex(5)]);

        let mut pos = PointAttribute::new(
            GeometryAttributeType::Position,
            3,
            DataType::Int32,
            false,
            4,
        );
        pos.set_explicit_mapping(6);
        // Points 1/3 and 2/4 share positions; the faces form a quad.
        for (p, val) in [(0, 0), (1, 1), (2, 2), (3, 1), (4, 2), (5, 3)] {
            pos.set_point_map_entry(PointIndex(p), AttributeValueIndex(val));
        }
        mesh.add_attribute(pos);

        let mut uv = PointAttribute::new(GeometryAttributeType::TexCoord, 2, DataType::Int32, false, 6);
        uv.set_explicit_mapping(6);
        // Every point gets its own UV entry: the shared edge is a seam.
        for p in 0..6 {
            uv.set_point_map_entry(PointIndex(p), AttributeValueIndex(p));
        }
        mesh.add_attribute(uv);

        let faces = [
            [VertexIndex(0), VertexIndex(1), VertexIndex(2)],
            [VertexIndex(2), VertexIndex(1), VertexIndex(3)],
        ];
        let table = CornerTable::init(&faces).unwrap();
        (mesh, table)
    }

    #[test]
    fn test_seam_detection() {
        let (mesh, table) = quad_with_seam();
        let uv = mesh.attribute(1);
        let act = MeshAttributeCornerTable::init_from_attribute(&mesh, &table, uv);
        assert!(!act.no_interior_seams());
        // Both endpoints of the seam edge split their 1-rings, so the
        // four spatial vertices yield six attribute vertices.
        assert_eq!(act.num_vertices(), 6);
    }

    #[test]
    fn test_no_seam_for_position() {
        let (mesh, table) = quad_with_seam();
        let pos = mesh.attribute(0);
        let act = MeshAttributeCornerTable::init_from_attribute(&mesh, &table, pos);
        assert!(act.no_interior_seams());
        assert_eq!(act.num_vertices(), 4);
    }
}
