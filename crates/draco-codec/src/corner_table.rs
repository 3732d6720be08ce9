//! Indexed triangle connectivity. Corners of face `f` are `3f`, `3f+1`
//! and `3f+2`; `opposite` stores the twin corner across the edge facing a
//! corner, or invalid on a boundary. Non-manifold edges and vertices are
//! split during construction; every split vertex remembers its parent so
//! points can be re-merged after decoding.

use std::collections::HashMap;

use crate::geometry_indices::{
    CornerIndex, FaceIndex, VertexIndex, INVALID_CORNER_INDEX, INVALID_FACE_INDEX,
    INVALID_VERTEX_INDEX,
};

#[derive(Debug, Default, Clone)]
pub struct CornerTable {
    corner_to_vertex_map: Vec<VertexIndex>,
    opposite_corners: Vec<CornerIndex>,
    vertex_corners: Vec<CornerIndex>,
    num_original_vertices: usize,
    num_degenerated_faces: usize,
    num_isolated_vertices: usize,
    non_manifold_vertex_parents: HashMap<VertexIndex, VertexIndex>,
}

impl CornerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the full connectivity from vertex triplets.
    pub fn init(faces: &[[VertexIndex; 3]]) -> Option<CornerTable> {
        let mut table = CornerTable {
            corner_to_vertex_map: Vec::with_capacity(faces.len() * 3),
            ..Default::default()
        };
        for face in faces {
            for &v in face {
                table.corner_to_vertex_map.push(v);
            }
        }

        let num_vertices = table.compute_opposite_corners()?;
        table.break_non_manifold_edges();
        table.compute_vertex_corners(num_vertices);

        table.num_degenerated_faces = (0..table.num_faces())
            .filter(|&f| table.is_degenerated(FaceIndex(f as u32)))
            .count();
        Some(table)
    }

    /// Empty table that the decoder fills face by face.
    pub fn reset(num_faces: usize) -> CornerTable {
        CornerTable {
            corner_to_vertex_map: vec![INVALID_VERTEX_INDEX; num_faces * 3],
            opposite_corners: vec![INVALID_CORNER_INDEX; num_faces * 3],
            ..Default::default()
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertex_corners.len()
    }

    pub fn num_corners(&self) -> usize {
        self.corner_to_vertex_map.len()
    }

    pub fn num_faces(&self) -> usize {
        self.corner_to_vertex_map.len() / 3
    }

    pub fn num_degenerated_faces(&self) -> usize {
        self.num_degenerated_faces
    }

    pub fn num_isolated_vertices(&self) -> usize {
        self.num_isolated_vertices
    }

    /// Vertices created by non-manifold splitting.
    pub fn num_new_vertices(&self) -> usize {
        self.num_vertices() - self.num_original_vertices
    }

    pub fn non_manifold_vertex_parent(&self, vertex: VertexIndex) -> Option<VertexIndex> {
        self.non_manifold_vertex_parents.get(&vertex).copied()
    }

    #[inline]
    pub fn opposite(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return corner;
        }
        self.opposite_corners[corner.index()]
    }

    #[inline]
    pub fn next(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return corner;
        }
        if (corner.0 + 1) % 3 != 0 {
            CornerIndex(corner.0 + 1)
        } else {
            CornerIndex(corner.0 - 2)
        }
    }

    #[inline]
    pub fn previous(&self, corner: CornerIndex) -> CornerIndex {
        if !corner.is_valid() {
            return corner;
        }
        if corner.0 % 3 != 0 {
            CornerIndex(corner.0 - 1)
        } else {
            CornerIndex(corner.0 + 2)
        }
    }

    #[inline]
    pub fn vertex(&self, corner: CornerIndex) -> VertexIndex {
        if !corner.is_valid() {
            return INVALID_VERTEX_INDEX;
        }
        self.corner_to_vertex_map[corner.index()]
    }

    #[inline]
    pub fn face(&self, corner: CornerIndex) -> FaceIndex {
        if !corner.is_valid() {
            return INVALID_FACE_INDEX;
        }
        FaceIndex(corner.0 / 3)
    }

    #[inline]
    pub fn first_corner(&self, face: FaceIndex) -> CornerIndex {
        CornerIndex(face.0 * 3)
    }

    /// Corner adjacent to a boundary or seam from the right, so that a
    /// full `swing_right` circulation covers the 1-ring.
    #[inline]
    pub fn left_most_corner(&self, vertex: VertexIndex) -> CornerIndex {
        if vertex.index() >= self.vertex_corners.len() {
            return INVALID_CORNER_INDEX;
        }
        self.vertex_corners[vertex.index()]
    }

    #[inline]
    pub fn left_corner(&self, corner: CornerIndex) -> CornerIndex {
        self.opposite(self.previous(corner))
    }

    #[inline]
    pub fn right_corner(&self, corner: CornerIndex) -> CornerIndex {
        self.opposite(self.next(corner))
    }

    #[inline]
    pub fn swing_right(&self, corner: CornerIndex) -> CornerIndex {
        self.previous(self.opposite(self.previous(corner)))
    }

    #[inline]
    pub fn swing_left(&self, corner: CornerIndex) -> CornerIndex {
        self.next(self.opposite(self.next(corner)))
    }

    pub fn is_degenerated(&self, face: FaceIndex) -> bool {
        if !face.is_valid() {
            return true;
        }
        let c0 = self.first_corner(face);
        let v0 = self.vertex(c0);
        let v1 = self.vertex(self.next(c0));
        let v2 = self.vertex(self.previous(c0));
        v0 == v1 || v0 == v2 || v1 == v2
    }

    pub fn is_on_boundary(&self, vertex: VertexIndex) -> bool {
        let corner = self.left_most_corner(vertex);
        if !corner.is_valid() {
            return true;
        }
        !self.swing_left(corner).is_valid()
    }

    /// Number of edges incident to the vertex.
    pub fn valence(&self, vertex: VertexIndex) -> usize {
        let start = self.left_most_corner(vertex);
        if !start.is_valid() {
            return 0;
        }
        let mut count = 1;
        let mut corner = self.swing_right(start);
        while corner.is_valid() && corner != start {
            count += 1;
            corner = self.swing_right(corner);
        }
        // An open fan has one more edge than it has corners.
        if corner != start {
            count += 1;
        }
        count
    }

    // Decoder-side mutators.

    pub fn map_corner_to_vertex(&mut self, corner: CornerIndex, vertex: VertexIndex) {
        self.corner_to_vertex_map[corner.index()] = vertex;
    }

    pub fn set_opposite_corners(&mut self, a: CornerIndex, b: CornerIndex) {
        self.opposite_corners[a.index()] = b;
        self.opposite_corners[b.index()] = a;
    }

    pub fn set_num_vertices(&mut self, num_vertices: usize) {
        self.vertex_corners
            .resize(num_vertices, INVALID_CORNER_INDEX);
    }

    pub fn set_left_most_corner(&mut self, vertex: VertexIndex, corner: CornerIndex) {
        if vertex.index() >= self.vertex_corners.len() {
            self.vertex_corners
                .resize(vertex.index() + 1, INVALID_CORNER_INDEX);
        }
        self.vertex_corners[vertex.index()] = corner;
    }

    pub fn make_vertex_isolated(&mut self, vertex: VertexIndex) {
        self.vertex_corners[vertex.index()] = INVALID_CORNER_INDEX;
    }

    /// Recomputes the leftmost corner of a vertex from any attached
    /// corner. Needed on boundary vertices after decoder reconstruction.
    pub fn update_vertex_to_corner_map(&mut self, vertex: VertexIndex) {
        let first_c = self.vertex_corners[vertex.index()];
        if !first_c.is_valid() {
            return; // Isolated vertex.
        }
        let mut act_c = self.swing_left(first_c);
        let mut c = first_c;
        while act_c.is_valid() && act_c != first_c {
            c = act_c;
            act_c = self.swing_left(act_c);
        }
        if act_c != first_c {
            self.vertex_corners[vertex.index()] = c;
        }
    }

    fn compute_opposite_corners(&mut self) -> Option<usize> {
        self.opposite_corners
            .resize(self.num_corners(), INVALID_CORNER_INDEX);

        // Count the corners attached to each vertex so half-edges can be
        // bucketed without reallocation.
        let mut num_corners_on_vertices: Vec<usize> = Vec::new();
        for c in 0..self.num_corners() {
            let v = self.vertex(CornerIndex(c as u32));
            if !v.is_valid() {
                return None;
            }
            if v.index() >= num_corners_on_vertices.len() {
                num_corners_on_vertices.resize(v.index() + 1, 0);
            }
            num_corners_on_vertices[v.index()] += 1;
        }

        #[derive(Clone, Copy)]
        struct VertexEdgePair {
            sink_vert: VertexIndex,
            edge_corner: CornerIndex,
        }
        let mut vertex_edges = vec![
            VertexEdgePair {
                sink_vert: INVALID_VERTEX_INDEX,
                edge_corner: INVALID_CORNER_INDEX,
            };
            self.num_corners()
        ];

        let mut vertex_offset = vec![0usize; num_corners_on_vertices.len()];
        let mut offset = 0;
        for (i, &count) in num_corners_on_vertices.iter().enumerate() {
            vertex_offset[i] = offset;
            offset += count;
        }

        // Pair up half-edges. Each half-edge of corner |c| runs from the
        // vertex at next(c) (source) to the vertex at previous(c) (sink);
        // its twin is an unmatched half-edge stored on the sink vertex.
        for c in 0..self.num_corners() {
            let corner = CornerIndex(c as u32);
            let tip_v = self.vertex(corner);
            let source_v = self.vertex(self.next(corner));
            let sink_v = self.vertex(self.previous(corner));

            let face = self.face(corner);
            if self.is_degenerated(face) {
                continue;
            }

            let mut opposite_c = INVALID_CORNER_INDEX;
            let num_corners_on_vert = num_corners_on_vertices[sink_v.index()];
            let mut entry = vertex_offset[sink_v.index()];
            for i in 0..num_corners_on_vert {
                let other_v = vertex_edges[entry].sink_vert;
                if !other_v.is_valid() {
                    break;
                }
                if other_v == source_v {
                    // Mirrored faces share the tip vertex; keep looking.
                    if tip_v == self.vertex(vertex_edges[entry].edge_corner) {
                        entry += 1;
                        continue;
                    }
                    opposite_c = vertex_edges[entry].edge_corner;

                    // Remove the matched entry by shifting the rest down.
                    let start = vertex_offset[sink_v.index()];
                    let match_pos = start + i;
                    vertex_edges.copy_within(match_pos + 1..start + num_corners_on_vert, match_pos);
                    vertex_edges[start + num_corners_on_vert - 1] = VertexEdgePair {
                        sink_vert: INVALID_VERTEX_INDEX,
                        edge_corner: INVALID_CORNER_INDEX,
                    };
                    break;
                }
                entry += 1;
            }

            if opposite_c.is_valid() {
                self.opposite_corners[c] = opposite_c;
                self.opposite_corners[opposite_c.index()] = corner;
            } else {
                // No twin yet, park the half-edge on its source vertex.
                let num_corners_on_source = num_corners_on_vertices[source_v.index()];
                let mut entry = vertex_offset[source_v.index()];
                for _ in 0..num_corners_on_source {
                    if !vertex_edges[entry].sink_vert.is_valid() {
                        vertex_edges[entry] = VertexEdgePair {
                            sink_vert: sink_v,
                            edge_corner: corner,
                        };
                        break;
                    }
                    entry += 1;
                }
            }
        }

        Some(num_corners_on_vertices.len())
    }

    /// Detects non-manifold edges caused by folds in a vertex 1-ring and
    /// disconnects the faces around them, leaving open boundaries. The
    /// disjoint patches then get fresh vertices in
    /// `compute_vertex_corners`.
    fn break_non_manifold_edges(&mut self) {
        let mut visited_corners = vec![false; self.num_corners()];
        let mut sink_vertices: Vec<(VertexIndex, CornerIndex)> = Vec::new();

        loop {
            let mut mesh_connectivity_updated = false;
            for c in 0..self.num_corners() {
                let corner = CornerIndex(c as u32);
                if visited_corners[c] {
                    continue;
                }
                sink_vertices.clear();

                // Swing all the way left to find the starting corner of
                // this 1-ring walk.
                let mut first_c = corner;
                let mut current_c = corner;
                loop {
                    let next_c = self.swing_left(current_c);
                    if next_c == first_c || !next_c.is_valid() || visited_corners[next_c.index()] {
                        break;
                    }
                    current_c = next_c;
                }
                first_c = current_c;

                // Swing right and verify that every outgoing edge of the
                // pivot is unique; each edge is identified by its sink
                // vertex.
                loop {
                    visited_corners[current_c.index()] = true;
                    let sink_c = self.next(current_c);
                    let sink_v = self.corner_to_vertex_map[sink_c.index()];
                    let edge_corner = self.previous(current_c);
                    let mut vertex_connectivity_updated = false;

                    for attached in sink_vertices.iter() {
                        if attached.0 != sink_v {
                            continue;
                        }
                        let other_edge_corner = attached.1;
                        let opp_edge_corner = self.opposite(edge_corner);
                        if opp_edge_corner == other_edge_corner {
                            // Closing the loop; connectivity stays.
                            continue;
                        }
                        let opp_other_edge_corner = self.opposite(other_edge_corner);
                        if opp_edge_corner.is_valid() {
                            self.opposite_corners[opp_edge_corner.index()] = INVALID_CORNER_INDEX;
                        }
                        if opp_other_edge_corner.is_valid() {
                            self.opposite_corners[opp_other_edge_corner.index()] =
                                INVALID_CORNER_INDEX;
                        }
                        self.opposite_corners[edge_corner.index()] = INVALID_CORNER_INDEX;
                        self.opposite_corners[other_edge_corner.index()] = INVALID_CORNER_INDEX;
                        vertex_connectivity_updated = true;
                        break;
                    }

                    if vertex_connectivity_updated {
                        // The ring changed; corners around this vertex
                        // must be revisited.
                        mesh_connectivity_updated = true;
                        break;
                    }

                    sink_vertices
                        .push((self.corner_to_vertex_map[self.previous(current_c).index()], sink_c));
                    current_c = self.swing_right(current_c);
                    if current_c == first_c || !current_c.is_valid() {
                        break;
                    }
                }
            }
            if !mesh_connectivity_updated {
                break;
            }
        }
    }

    /// Assigns each vertex its leftmost corner, duplicating vertices that
    /// are shared by disjoint 1-ring patches (non-manifold vertices).
    fn compute_vertex_corners(&mut self, num_vertices: usize) {
        self.num_original_vertices = num_vertices;
        let mut num_vertices = num_vertices;
        self.vertex_corners
            .resize(num_vertices, INVALID_CORNER_INDEX);

        let mut visited_vertices = vec![false; num_vertices];
        let mut visited_corners = vec![false; self.num_corners()];

        for f in 0..self.num_faces() {
            let face = FaceIndex(f as u32);
            if self.is_degenerated(face) {
                continue;
            }
            let first_face_corner = self.first_corner(face);

            for k in 0..3 {
                let c = CornerIndex(first_face_corner.0 + k);
                if visited_corners[c.index()] {
                    continue;
                }
                let mut v = self.corner_to_vertex_map[c.index()];
                let mut is_non_manifold_vertex = false;
                if visited_vertices[v.index()] {
                    // A visited vertex reached from an unvisited corner:
                    // disjoint patch, split off a new vertex.
                    self.vertex_corners.push(INVALID_CORNER_INDEX);
                    self.non_manifold_vertex_parents
                        .insert(VertexIndex(num_vertices as u32), v);
                    visited_vertices.push(false);
                    v = VertexIndex(num_vertices as u32);
                    num_vertices += 1;
                    is_non_manifold_vertex = true;
                }
                visited_vertices[v.index()] = true;

                // Swing left, marking corners; the vertex ends up mapped
                // to its leftmost corner.
                let mut act_c = c;
                loop {
                    visited_corners[act_c.index()] = true;
                    self.vertex_corners[v.index()] = act_c;
                    if is_non_manifold_vertex {
                        self.corner_to_vertex_map[act_c.index()] = v;
                    }
                    act_c = self.swing_left(act_c);
                    if act_c == c || !act_c.is_valid() {
                        break;
                    }
                }
                if !act_c.is_valid() {
                    // Open boundary; mark the corners on the right side
                    // of the start corner as well.
                    act_c = self.swing_right(c);
                    while act_c.is_valid() {
                        visited_corners[act_c.index()] = true;
                        if is_non_manifold_vertex {
                            self.corner_to_vertex_map[act_c.index()] = v;
                        }
                        act_c = self.swing_right(act_c);
                    }
                }
            }
        }

        self.num_isolated_vertices = visited_vertices.iter().filter(|&&v| !v).count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(val: u32) -> VertexIndex {
        VertexIndex(val)
    }

    fn tetrahedron() -> CornerTable {
        CornerTable::init(&[
            [v(0), v(1), v(2)],
            [v(0), v(3), v(1)],
            [v(0), v(2), v(3)],
            [v(1), v(3), v(2)],
        ])
        .unwrap()
    }

    #[test]
    fn test_opposite_is_involution() {
        let table = tetrahedron();
        for c in 0..table.num_corners() {
            let corner = CornerIndex(c as u32);
            let opp = table.opposite(corner);
            assert!(opp.is_valid());
            assert_eq!(table.opposite(opp), corner);
        }
    }

    #[test]
    fn test_next_cycles() {
        let table = tetrahedron();
        for c in 0..table.num_corners() {
            let corner = CornerIndex(c as u32);
            assert_eq!(table.next(table.next(table.next(corner))), corner);
            assert_eq!(table.previous(table.next(corner)), corner);
        }
    }

    #[test]
    fn test_opposite_edge_shares_vertices() {
        let table = tetrahedron();
        for c in 0..table.num_corners() {
            let corner = CornerIndex(c as u32);
            let opp = table.opposite(corner);
            if opp.is_valid() {
                assert_eq!(
                    table.vertex(table.next(corner)),
                    table.vertex(table.previous(opp))
                );
            }
        }
    }

    #[test]
    fn test_closed_mesh_has_no_boundary() {
        let table = tetrahedron();
        for vert in 0..table.num_vertices() {
            assert!(!table.is_on_boundary(VertexIndex(vert as u32)));
            assert_eq!(table.valence(VertexIndex(vert as u32)), 3);
        }
    }

    #[test]
    fn test_open_fan_boundary() {
        // Two triangles sharing the edge (1, 2).
        let table = CornerTable::init(&[[v(0), v(1), v(2)], [v(2), v(1), v(3)]]).unwrap();
        for vert in 0..4 {
            assert!(table.is_on_boundary(VertexIndex(vert)));
        }
        assert_eq!(table.valence(v(1)), 3);
        assert_eq!(table.valence(v(0)), 2);
        assert_eq!(table.num_new_vertices(), 0);
    }

    #[test]
    fn test_swing_covers_one_ring() {
        let table = tetrahedron();
        for vert in 0..table.num_vertices() {
            let vertex = VertexIndex(vert as u32);
            let start = table.left_most_corner(vertex);
            let mut corner = start;
            let mut seen = 0;
            loop {
                assert_eq!(table.vertex(corner), vertex);
                seen += 1;
                corner = table.swing_right(corner);
                if corner == start || !corner.is_valid() {
                    break;
                }
            }
            assert_eq!(seen, 3);
        }
    }

    #[test]
    fn test_non_manifold_edge_is_split() {
        // Three faces sharing the edge (1, 2).
        let table = CornerTable::init(&[
            [v(0), v(1), v(2)],
            [v(2), v(1), v(3)],
            [v(1), v(2), v(4)],
        ])
        .unwrap();
        assert!(table.num_new_vertices() >= 1);
        for c in 0..table.num_corners() {
            let corner = CornerIndex(c as u32);
            let opp = table.opposite(corner);
            if opp.is_valid() {
                assert_eq!(table.opposite(opp), corner);
            }
        }
        // Split vertices keep a record of their original vertex.
        let new_vertex = VertexIndex(5);
        assert!(table.num_vertices() >= 6);
        assert!(table.non_manifold_vertex_parent(new_vertex).is_some());
    }

    #[test]
    fn test_degenerated_face_is_counted() {
        let table = CornerTable::init(&[[v(0), v(1), v(2)], [v(1), v(1), v(2)]]).unwrap();
        assert_eq!(table.num_degenerated_faces(), 1);
    }
}
