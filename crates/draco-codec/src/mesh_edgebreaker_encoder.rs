//! Edgebreaker connectivity encoder. Walks the corner table with a
//! right-first depth-first traversal, emitting one of {C, L, R, S, E}
//! per face, and records topology splits, hole events and per-attribute
//! seams. The symbol stream is buffered and written in reverse so the
//! decoder can rebuild the connectivity back to front.

use std::collections::HashMap;

use crate::corner_table::CornerTable;
use crate::edgebreaker_traversal_encoder::TraversalEncoder;
use crate::encoder_buffer::EncoderBuffer;
use crate::geometry_attribute::GeometryAttributeType;
use crate::geometry_indices::{CornerIndex, FaceIndex, VertexIndex};
use crate::mesh::Mesh;
use crate::mesh_attribute_corner_table::MeshAttributeCornerTable;
use crate::mesh_edgebreaker_shared::{
    EdgeFaceName, EdgebreakerSymbol, HoleEventData, TopologySplitEventData, TraversalKind,
};
use crate::mesh_traversal_sequencer::MeshAttributeIndicesEncodingData;
use crate::status::{DracoError, Status};

/// Per-attribute connectivity state collected while encoding.
pub struct EncoderAttributeData {
    pub attribute_index: i32,
    pub connectivity_data: MeshAttributeCornerTable,
    pub is_connectivity_used: bool,
    pub encoding_data: MeshAttributeIndicesEncodingData,
}

pub struct MeshEdgebreakerConnectivityEncoder<'m> {
    mesh: &'m Mesh,
    pub corner_table: CornerTable,
    traversal_encoder: TraversalEncoder,
    pub attribute_data: Vec<EncoderAttributeData>,
    /// Corners of the traversed faces in the order the decoder will
    /// reconstruct them (filled at the end of `encode_connectivity`).
    pub processed_connectivity_corners: Vec<CornerIndex>,
    pub pos_encoding_data: MeshAttributeIndicesEncodingData,

    visited_faces: Vec<bool>,
    visited_vertex_ids: Vec<bool>,
    vertex_hole_id: Vec<i32>,
    visited_holes: Vec<bool>,
    last_encoded_symbol_id: i32,
    num_split_symbols: u32,
    topology_split_events: Vec<TopologySplitEventData>,
    face_to_split_symbol_map: HashMap<u32, u32>,
    hole_events: Vec<HoleEventData>,
    corner_traversal_stack: Vec<CornerIndex>,
}

impl<'m> MeshEdgebreakerConnectivityEncoder<'m> {
    pub fn new(mesh: &'m Mesh, kind: TraversalKind) -> Result<Self, DracoError> {
        // Connectivity is defined by the position attribute: points that
        // share a position value are one vertex.
        let pos_id = mesh.named_attribute_id(GeometryAttributeType::Position);
        if pos_id < 0 {
            return Err(DracoError::InvalidConfig(
                "mesh has no position attribute".to_string(),
            ));
        }
        let pos_att = mesh.attribute(pos_id);
        let mut faces = Vec::with_capacity(mesh.num_faces());
        for f in 0..mesh.num_faces() {
            let face = mesh.face(FaceIndex(f as u32));
            let mut verts = [VertexIndex(0); 3];
            for (i, point) in face.iter().enumerate() {
                let value = pos_att.mapped_index(*point);
                if !value.is_valid() {
                    return Err(DracoError::InvalidConfig(format!(
                        "point {} has no position value",
                        point.value()
                    )));
                }
                verts[i] = VertexIndex(value.value());
            }
            faces.push(verts);
        }
        let corner_table = CornerTable::init(&faces).ok_or_else(|| {
            DracoError::InvalidConfig("mesh connectivity could not be built".to_string())
        })?;

        let num_vertices = corner_table.num_vertices();
        let num_mesh_faces = corner_table.num_faces();
        Ok(Self {
            mesh,
            corner_table,
            traversal_encoder: TraversalEncoder::new(kind),
            attribute_data: Vec::new(),
            processed_connectivity_corners: Vec::with_capacity(num_mesh_faces),
            pos_encoding_data: MeshAttributeIndicesEncodingData::default(),
            visited_faces: vec![false; num_mesh_faces],
            visited_vertex_ids: vec![false; num_vertices],
            vertex_hole_id: vec![-1; num_vertices],
            visited_holes: Vec::new(),
            last_encoded_symbol_id: -1,
            num_split_symbols: 0,
            topology_split_events: Vec::new(),
            face_to_split_symbol_map: HashMap::new(),
            hole_events: Vec::new(),
            corner_traversal_stack: Vec::new(),
        })
    }

    pub fn num_encoded_symbols(&self) -> usize {
        self.traversal_encoder.num_encoded_symbols()
    }

    pub fn num_hole_events(&self) -> usize {
        self.hole_events.len()
    }

    pub fn num_split_events(&self) -> usize {
        self.topology_split_events.len()
    }

    pub fn traversal_kind(&self) -> TraversalKind {
        self.traversal_encoder.kind()
    }

    pub fn encode_connectivity(&mut self, out_buffer: &mut EncoderBuffer) -> Status {
        let num_new_vertices = self.corner_table.num_new_vertices() as u32;
        let num_encoded_vertices =
            (self.corner_table.num_vertices() - self.corner_table.num_isolated_vertices()) as u32;
        let num_faces =
            (self.corner_table.num_faces() - self.corner_table.num_degenerated_faces()) as u32;

        self.find_holes();
        self.init_attribute_data();
        self.traversal_encoder
            .set_num_attribute_data(self.attribute_data.len());

        let mut init_face_connectivity_corners: Vec<CornerIndex> = Vec::new();

        // Traverse the surface starting from each unvisited face.
        for c in 0..self.corner_table.num_corners() {
            let corner = CornerIndex(c as u32);
            let face = self.corner_table.face(corner);
            if self.visited_faces[face.index()] {
                continue;
            }
            if self.corner_table.is_degenerated(face) {
                continue;
            }

            let (interior_config, start_corner) = self.find_init_face_configuration(face);
            self.traversal_encoder
                .encode_start_face_configuration(interior_config);

            if interior_config {
                // The initial face acts as a virtual C face: its tip is
                // the start corner and compression resumes on the face
                // across the edge right of the tip.
                let corner = start_corner;
                let vert = self.corner_table.vertex(corner);
                let next_vert = self.corner_table.vertex(self.corner_table.next(corner));
                let prev_vert = self.corner_table.vertex(self.corner_table.previous(corner));
                self.visited_vertex_ids[vert.index()] = true;
                self.visited_vertex_ids[next_vert.index()] = true;
                self.visited_vertex_ids[prev_vert.index()] = true;
                self.visited_faces[face.index()] = true;
                init_face_connectivity_corners.push(self.corner_table.next(corner));
                let opp = self
                    .corner_table
                    .opposite(self.corner_table.next(corner));
                let opp_face = self.corner_table.face(opp);
                if opp_face.is_valid() && !self.visited_faces[opp_face.index()] {
                    self.encode_connectivity_from_corner(opp);
                }
            } else {
                // Boundary start. The loop the start corner touches is
                // consumed as the initial hole.
                self.hole_events.push(HoleEventData {
                    symbol_id: (self.last_encoded_symbol_id + 1) as u32,
                });
                self.encode_hole(self.corner_table.next(start_corner), true);
                self.encode_connectivity_from_corner(start_corner);
            }
        }

        crate::invariant!(
            self.processed_connectivity_corners.len()
                == self.traversal_encoder.num_encoded_symbols(),
            "one traversed corner per encoded symbol"
        );

        // Reverse into decode order and append the init-face corners,
        // which the decoder processes after the regular symbols.
        self.processed_connectivity_corners.reverse();
        self.processed_connectivity_corners
            .extend(init_face_connectivity_corners);

        if !self.attribute_data.is_empty() {
            // Seam bits are emitted in the order the decoder walks the
            // reconstructed faces.
            let corners = self.processed_connectivity_corners.clone();
            for corner in corners {
                self.encode_attribute_connectivities_on_face(corner);
            }
        }

        let traversal_buffer = self.traversal_encoder.done(&self.topology_split_events)?;

        out_buffer.encode_u32(num_new_vertices);
        out_buffer.encode_u32(num_encoded_vertices);
        out_buffer.encode_u32(num_faces);
        out_buffer.encode_i8(self.attribute_data.len() as i8);
        out_buffer.encode_u32(self.traversal_encoder.num_encoded_symbols() as u32);
        out_buffer.encode_u32(self.num_split_symbols);
        out_buffer.encode_u32(traversal_buffer.size() as u32);
        out_buffer.encode_data(traversal_buffer.data());

        self.encode_split_data(out_buffer);
        self.encode_hole_data(out_buffer);
        self.traversal_encoder.encode_attribute_seams(out_buffer);
        Ok(())
    }

    fn encode_split_data(&mut self, out_buffer: &mut EncoderBuffer) {
        let num_events = self.topology_split_events.len();
        out_buffer.encode_varint(num_events as u64);
        if num_events == 0 {
            return;
        }
        // Source ids only grow, so both deltas are nonnegative.
        let mut last_source_symbol_id = 0u32;
        for event in &self.topology_split_events {
            out_buffer.encode_varint((event.source_symbol_id - last_source_symbol_id) as u64);
            out_buffer.encode_varint((event.source_symbol_id - event.split_symbol_id) as u64);
            last_source_symbol_id = event.source_symbol_id;
        }
        out_buffer.start_bit_encoding(num_events * 2, false);
        for event in &self.topology_split_events {
            let bits = (event.source_edge as u32) | ((event.split_edge as u32) << 1);
            out_buffer.encode_least_significant_bits32(2, bits);
        }
        out_buffer.end_bit_encoding();
    }

    fn encode_hole_data(&mut self, out_buffer: &mut EncoderBuffer) {
        out_buffer.encode_varint(self.hole_events.len() as u64);
        let mut last_symbol_id = 0u32;
        for event in &self.hole_events {
            out_buffer.encode_varint((event.symbol_id - last_symbol_id) as u64);
            last_symbol_id = event.symbol_id;
        }
    }

    /// Interior configuration needs all three face corners away from any
    /// boundary; otherwise the returned corner sits opposite a boundary
    /// edge.
    fn find_init_face_configuration(&self, face: FaceIndex) -> (bool, CornerIndex) {
        let mut corner = self.corner_table.first_corner(face);
        for _ in 0..3 {
            if !self.corner_table.opposite(corner).is_valid() {
                return (false, corner);
            }
            if self.vertex_hole_id[self.corner_table.vertex(corner).index()] != -1 {
                // A boundary vertex: swing right to its boundary edge.
                let mut right_corner = corner;
                while right_corner.is_valid() {
                    corner = right_corner;
                    right_corner = self.corner_table.swing_right(right_corner);
                }
                return (false, self.corner_table.previous(corner));
            }
            corner = self.corner_table.next(corner);
        }
        (true, corner)
    }

    fn encode_connectivity_from_corner(&mut self, mut corner: CornerIndex) {
        self.corner_traversal_stack.clear();
        self.corner_traversal_stack.push(corner);
        let num_faces = self.mesh.num_faces();
        while let Some(&top) = self.corner_traversal_stack.last() {
            corner = top;
            if !corner.is_valid()
                || self.visited_faces[self.corner_table.face(corner).index()]
            {
                self.corner_traversal_stack.pop();
                continue;
            }
            let mut num_visited_faces = 0;
            while num_visited_faces < num_faces {
                num_visited_faces += 1;
                self.last_encoded_symbol_id += 1;

                let face = self.corner_table.face(corner);
                self.visited_faces[face.index()] = true;
                self.processed_connectivity_corners.push(corner);
                let vert = self.corner_table.vertex(corner);
                let on_boundary = self.vertex_hole_id[vert.index()] != -1;
                if !self.visited_vertex_ids[vert.index()] {
                    self.visited_vertex_ids[vert.index()] = true;
                    if !on_boundary {
                        self.traversal_encoder.encode_symbol(EdgebreakerSymbol::C);
                        corner = self.get_right_corner(corner);
                        continue;
                    }
                }
                // The tip vertex was visited before (or lies on a hole);
                // pick the branch by the visited state of the neighbors.
                let right_corner = self.get_right_corner(corner);
                let left_corner = self.get_left_corner(corner);
                let right_face = self.corner_table.face(right_corner);
                let left_face = self.corner_table.face(left_corner);
                if self.is_right_face_visited(corner) {
                    if right_face.is_valid() {
                        self.check_and_store_topology_split_event(
                            self.last_encoded_symbol_id as u32,
                            EdgeFaceName::RightFaceEdge,
                            right_face,
                        );
                    }
                    if self.is_left_face_visited(corner) {
                        if left_face.is_valid() {
                            self.check_and_store_topology_split_event(
                                self.last_encoded_symbol_id as u32,
                                EdgeFaceName::LeftFaceEdge,
                                left_face,
                            );
                        }
                        self.traversal_encoder.encode_symbol(EdgebreakerSymbol::E);
                        self.corner_traversal_stack.pop();
                        break;
                    } else {
                        self.traversal_encoder.encode_symbol(EdgebreakerSymbol::R);
                        corner = left_corner;
                    }
                } else if self.is_left_face_visited(corner) {
                    if left_face.is_valid() {
                        self.check_and_store_topology_split_event(
                            self.last_encoded_symbol_id as u32,
                            EdgeFaceName::LeftFaceEdge,
                            left_face,
                        );
                    }
                    self.traversal_encoder.encode_symbol(EdgebreakerSymbol::L);
                    corner = right_corner;
                } else {
                    self.traversal_encoder.encode_symbol(EdgebreakerSymbol::S);
                    self.num_split_symbols += 1;
                    if on_boundary {
                        let hole_id = self.vertex_hole_id[vert.index()];
                        if !self.visited_holes[hole_id as usize] {
                            self.hole_events.push(HoleEventData {
                                symbol_id: self.last_encoded_symbol_id as u32,
                            });
                            self.encode_hole(corner, false);
                        }
                    }
                    self.face_to_split_symbol_map
                        .insert(face.value(), self.last_encoded_symbol_id as u32);
                    // The right branch is traversed first; the left one
                    // waits underneath on the stack.
                    *self.corner_traversal_stack.last_mut().unwrap() = left_corner;
                    self.corner_traversal_stack.push(right_corner);
                    break;
                }
            }
        }
    }

    /// Marks every vertex of the hole the start corner's vertex lies on
    /// as visited. Returns the number of vertices marked.
    fn encode_hole(&mut self, start_corner: CornerIndex, encode_first_vertex: bool) -> usize {
        let mut corner = self.corner_table.previous(start_corner);
        while self.corner_table.opposite(corner).is_valid() {
            corner = self.corner_table.next(self.corner_table.opposite(corner));
        }
        let start_vertex = self.corner_table.vertex(start_corner);

        let mut num_encoded_hole_verts = 0;
        if encode_first_vertex {
            self.visited_vertex_ids[start_vertex.index()] = true;
            num_encoded_hole_verts += 1;
        }

        self.visited_holes[self.vertex_hole_id[start_vertex.index()] as usize] = true;
        let mut act_vertex = self
            .corner_table
            .vertex(self.corner_table.previous(corner));
        while act_vertex != start_vertex {
            self.visited_vertex_ids[act_vertex.index()] = true;
            num_encoded_hole_verts += 1;
            corner = self.corner_table.next(corner);
            while self.corner_table.opposite(corner).is_valid() {
                corner = self.corner_table.next(self.corner_table.opposite(corner));
            }
            act_vertex = self
                .corner_table
                .vertex(self.corner_table.previous(corner));
        }
        num_encoded_hole_verts
    }

    fn get_right_corner(&self, corner: CornerIndex) -> CornerIndex {
        self.corner_table.opposite(self.corner_table.next(corner))
    }

    fn get_left_corner(&self, corner: CornerIndex) -> CornerIndex {
        self.corner_table
            .opposite(self.corner_table.previous(corner))
    }

    fn is_right_face_visited(&self, corner: CornerIndex) -> bool {
        let opp = self.get_right_corner(corner);
        if opp.is_valid() {
            self.visited_faces[self.corner_table.face(opp).index()]
        } else {
            true // Boundary counts as visited.
        }
    }

    fn is_left_face_visited(&self, corner: CornerIndex) -> bool {
        let opp = self.get_left_corner(corner);
        if opp.is_valid() {
            self.visited_faces[self.corner_table.face(opp).index()]
        } else {
            true
        }
    }

    /// Floods every open boundary loop, numbering them and marking each
    /// boundary vertex with its hole id.
    fn find_holes(&mut self) {
        for c in 0..self.corner_table.num_corners() {
            let corner = CornerIndex(c as u32);
            if self
                .corner_table
                .is_degenerated(self.corner_table.face(corner))
            {
                continue;
            }
            if self.corner_table.opposite(corner).is_valid() {
                continue;
            }
            // The edge opposite |corner| is an open boundary.
            let mut boundary_vert = self
                .corner_table
                .vertex(self.corner_table.next(corner));
            if self.vertex_hole_id[boundary_vert.index()] != -1 {
                continue; // Boundary already traversed.
            }
            let boundary_id = self.visited_holes.len() as i32;
            self.visited_holes.push(false);

            let mut corner_id = corner;
            while self.vertex_hole_id[boundary_vert.index()] == -1 {
                self.vertex_hole_id[boundary_vert.index()] = boundary_id;
                corner_id = self.corner_table.next(corner_id);
                // Walk to the next attached open boundary edge.
                while self.corner_table.opposite(corner_id).is_valid() {
                    corner_id = self
                        .corner_table
                        .next(self.corner_table.opposite(corner_id));
                }
                boundary_vert = self
                    .corner_table
                    .vertex(self.corner_table.next(corner_id));
            }
        }
    }

    fn check_and_store_topology_split_event(
        &mut self,
        source_symbol_id: u32,
        source_edge: EdgeFaceName,
        neighbor_face: FaceIndex,
    ) {
        let Some(&split_symbol_id) = self.face_to_split_symbol_map.get(&neighbor_face.value())
        else {
            return; // The neighbor was not an S face.
        };
        self.topology_split_events.push(TopologySplitEventData {
            split_symbol_id,
            source_symbol_id,
            source_edge,
            // The right branch of a split is traversed first, so the
            // merge always reattaches through the left edge.
            split_edge: EdgeFaceName::LeftFaceEdge,
        });
    }

    fn init_attribute_data(&mut self) {
        self.attribute_data.clear();
        for att_id in 0..self.mesh.num_attributes() as i32 {
            let att = self.mesh.attribute(att_id);
            if att.attribute_type() == GeometryAttributeType::Position {
                continue;
            }
            let connectivity_data =
                MeshAttributeCornerTable::init_from_attribute(self.mesh, &self.corner_table, att);
            self.attribute_data.push(EncoderAttributeData {
                attribute_index: att_id,
                connectivity_data,
                is_connectivity_used: true,
                encoding_data: MeshAttributeIndicesEncodingData::default(),
            });
        }
    }

    /// One bit per non-position attribute for every interior edge of the
    /// face, replayed in decode order.
    fn encode_attribute_connectivities_on_face(&mut self, corner: CornerIndex) {
        let corners = [
            corner,
            self.corner_table.next(corner),
            self.corner_table.previous(corner),
        ];
        for &c in &corners {
            let opp_corner = self.corner_table.opposite(c);
            if !opp_corner.is_valid() {
                continue; // Boundary edges are implicit seams.
            }
            for i in 0..self.attribute_data.len() {
                let is_seam = self.attribute_data[i]
                    .connectivity_data
                    .is_corner_opposite_to_seam_edge(c);
                self.traversal_encoder.encode_attribute_seam(i, is_seam);
            }
        }
    }
}

impl<'m> MeshEdgebreakerConnectivityEncoder<'m> {
    pub fn mesh(&self) -> &Mesh {
        self.mesh
    }

    pub fn corner_table(&self) -> &CornerTable {
        &self.corner_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draco_types::DataType;
    use crate::geometry_attribute::PointAttribute;
    use crate::geometry_indices::{AttributeValueIndex, PointIndex};

    fn position_mesh(positions: &[[i32; 3]], faces: &[[u32; 3]]) -> Mesh {
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

    #[test]
    fn test_symbol_count_excludes_start_faces() {
        // A closed tetrahedron has one interior start face; every other
        // face becomes a symbol.
        let mesh = position_mesh(
            &[[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]],
            &[[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]],
        );
        let mut encoder =
            MeshEdgebreakerConnectivityEncoder::new(&mesh, TraversalKind::Standard).unwrap();
        let mut buffer = EncoderBuffer::new();
        encoder.encode_connectivity(&mut buffer).unwrap();
        assert_eq!(encoder.num_encoded_symbols(), 3);
        assert_eq!(encoder.num_hole_events(), 0);
    }

    #[test]
    fn test_boundary_component_has_no_start_face() {
        // An open strip starts on its boundary, so every face is a
        // symbol and the boundary is the initial hole.
        let mesh = position_mesh(
            &[[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]],
            &[[0, 1, 2], [1, 3, 2]],
        );
        let mut encoder =
            MeshEdgebreakerConnectivityEncoder::new(&mesh, TraversalKind::Standard).unwrap();
        let mut buffer = EncoderBuffer::new();
        encoder.encode_connectivity(&mut buffer).unwrap();
        assert_eq!(encoder.num_encoded_symbols(), 2);
        assert_eq!(encoder.num_hole_events(), 1);
    }
}
