//! Edgebreaker connectivity decoder. Consumes the traversal stream in
//! reverse of the encoder, growing the corner table face by face along
//! an active-corner stack, then resolves start faces, attribute seams
//! and the final corner-to-point assignment.

use std::collections::HashMap;

use crate::corner_table::CornerTable;
use crate::decoder_buffer::DecoderBuffer;
use crate::edgebreaker_traversal_decoder::TraversalDecoder;
use crate::geometry_indices::{CornerIndex, FaceIndex, PointIndex, VertexIndex};
use crate::mesh::Mesh;
use crate::mesh_attribute_corner_table::MeshAttributeCornerTable;
use crate::mesh_edgebreaker_shared::{
    EdgeFaceName, EdgebreakerSymbol, HoleEventData, TopologySplitEventData, TraversalKind,
};
use crate::mesh_traversal_sequencer::MeshAttributeIndicesEncodingData;
use crate::status::{corrupt, Status};

/// Per-attribute connectivity state rebuilt while decoding.
pub struct DecoderAttributeData {
    pub decoder_id: i32,
    pub connectivity_data: MeshAttributeCornerTable,
    pub is_connectivity_used: bool,
    pub encoding_data: MeshAttributeIndicesEncodingData,
    attribute_seam_corners: Vec<CornerIndex>,
}

pub struct MeshEdgebreakerConnectivityDecoder<'a> {
    pub corner_table: CornerTable,
    pub attribute_data: Vec<DecoderAttributeData>,
    pub pos_encoding_data: MeshAttributeIndicesEncodingData,
    pub is_vert_hole: Vec<bool>,
    traversal_decoder: TraversalDecoder<'a>,
    topology_split_data: Vec<TopologySplitEventData>,
    hole_event_data: Vec<HoleEventData>,
    num_new_vertices: usize,
    num_encoded_vertices: usize,
}

impl<'a> MeshEdgebreakerConnectivityDecoder<'a> {
    pub fn new(kind: TraversalKind) -> Self {
        Self {
            corner_table: CornerTable::new(),
            attribute_data: Vec::new(),
            pos_encoding_data: MeshAttributeIndicesEncodingData::default(),
            is_vert_hole: Vec::new(),
            traversal_decoder: TraversalDecoder::new(kind),
            topology_split_data: Vec::new(),
            hole_event_data: Vec::new(),
            num_new_vertices: 0,
            num_encoded_vertices: 0,
        }
    }

    pub fn num_new_vertices(&self) -> usize {
        self.num_new_vertices
    }

    pub fn num_encoded_vertices(&self) -> usize {
        self.num_encoded_vertices
    }

    pub fn num_hole_events(&self) -> usize {
        self.hole_event_data.len()
    }

    pub fn num_split_events(&self) -> usize {
        self.topology_split_data.len()
    }

    pub fn decode_connectivity(
        &mut self,
        buffer: &mut DecoderBuffer<'a>,
        mesh: &mut Mesh,
    ) -> Status {
        self.num_new_vertices = buffer.decode_u32()? as usize;
        self.num_encoded_vertices = buffer.decode_u32()? as usize;
        let num_faces = buffer.decode_u32()? as usize;
        let num_attribute_data = buffer.decode_i8()?;
        if num_attribute_data < 0 {
            return Err(corrupt("negative attribute data count"));
        }
        let num_symbols = buffer.decode_u32()? as usize;
        if num_faces < num_symbols {
            // Faces can outnumber symbols (initial faces are implicit)
            // but never the other way around.
            return Err(corrupt("more symbols than faces"));
        }
        if num_faces > num_symbols * 2 + 1 {
            return Err(corrupt("face count inconsistent with symbol count"));
        }
        let num_split_symbols = buffer.decode_u32()? as usize;
        if num_split_symbols > num_symbols {
            return Err(corrupt("more split symbols than symbols"));
        }
        if num_faces > u32::MAX as usize / 3 {
            return Err(corrupt("face count overflows the corner space"));
        }
        if self.num_encoded_vertices > 3 * num_faces {
            return Err(corrupt("more encoded vertices than corners"));
        }

        let encoded_connectivity_size = buffer.decode_u32()? as usize;
        if encoded_connectivity_size > buffer.remaining_size() {
            return Err(corrupt("connectivity region exceeds the buffer"));
        }

        // Events live right behind the connectivity region; decode them
        // from a look-ahead view first.
        let mut event_buffer = buffer.sub_buffer(encoded_connectivity_size)?;
        self.decode_hole_and_topology_split_events(&mut event_buffer, num_symbols)?;
        let event_bytes = event_buffer.position();

        self.corner_table = CornerTable::reset(num_faces);
        self.is_vert_hole = vec![true; self.num_encoded_vertices + num_split_symbols];
        for _ in 0..num_attribute_data {
            self.attribute_data.push(DecoderAttributeData {
                decoder_id: -1,
                connectivity_data: MeshAttributeCornerTable::default(),
                is_connectivity_used: true,
                encoding_data: MeshAttributeIndicesEncodingData::default(),
                attribute_seam_corners: Vec::new(),
            });
        }

        let traversal_view =
            DecoderBuffer::new(&buffer.remaining_data()[..encoded_connectivity_size]);
        self.traversal_decoder.set_num_symbols(num_symbols);
        self.traversal_decoder.start(traversal_view)?;

        let num_vertices = self.rebuild_connectivity(num_symbols, num_faces)?;
        if num_vertices > self.is_vert_hole.len() {
            return Err(corrupt("decoded more vertices than declared"));
        }
        self.corner_table.set_num_vertices(num_vertices.max(self.corner_table.num_vertices()));

        // Move the main buffer past the traversal and the event data.
        buffer.advance(encoded_connectivity_size)?;
        buffer.advance(event_bytes)?;

        // Attribute seams, one bit per interior edge per attribute.
        if !self.attribute_data.is_empty() {
            self.traversal_decoder
                .init_attribute_seams(buffer, self.attribute_data.len())?;
            for f in 0..self.corner_table.num_faces() {
                self.decode_attribute_connectivities_on_face(CornerIndex(3 * f as u32));
            }
        }

        // Leftmost corners of boundary vertices were not maintained
        // during reconstruction.
        for v in 0..self.corner_table.num_vertices() {
            if self.is_vert_hole[v] {
                self.corner_table
                    .update_vertex_to_corner_map(VertexIndex(v as u32));
            }
        }

        // Build the per-attribute corner tables from the decoded seams.
        for data in self.attribute_data.iter_mut() {
            let mut connectivity = MeshAttributeCornerTable::init_empty(&self.corner_table);
            for &corner in &data.attribute_seam_corners {
                connectivity.add_seam_edge(&self.corner_table, corner);
            }
            connectivity.recompute_vertices(&self.corner_table, None);
            data.connectivity_data = connectivity;
        }

        self.pos_encoding_data
            .vertex_to_encoded_attribute_value_index_map
            .resize(self.corner_table.num_vertices(), -1);
        for data in self.attribute_data.iter_mut() {
            let verts = data
                .connectivity_data
                .num_vertices()
                .max(self.corner_table.num_vertices());
            data.encoding_data
                .vertex_to_encoded_attribute_value_index_map
                .resize(verts, -1);
        }

        self.assign_points_to_corners(mesh);
        Ok(())
    }

    /// The reverse decoding: every symbol attaches one face to the
    /// active edge identified by the corner on top of the stack.
    fn rebuild_connectivity(&mut self, num_symbols: usize, max_faces: usize) -> Result<usize, crate::status::DracoError> {
        let mut active_corner_stack: Vec<CornerIndex> = Vec::new();
        let mut topology_split_active_corners: HashMap<usize, CornerIndex> = HashMap::new();
        let mut num_vertices = 0usize;
        let max_num_vertices = self.is_vert_hole.len();
        let mut num_faces = 0u32;

        for symbol_id in 0..num_symbols {
            let face_corner = CornerIndex(3 * num_faces);
            num_faces += 1;
            let mut check_topology_split = false;
            let symbol = self.traversal_decoder.decode_symbol()?;

            match symbol {
                EdgebreakerSymbol::C => {
                    // New face between two boundary edges: the active one
                    // and the edge reached by circulating around the tip.
                    let corner_a = *active_corner_stack
                        .last()
                        .ok_or_else(|| corrupt("C symbol with no active edge"))?;
                    let mut corner_b = self.corner_table.previous(corner_a);
                    while self.corner_table.opposite(corner_b).is_valid() {
                        corner_b = self
                            .corner_table
                            .previous(self.corner_table.opposite(corner_b));
                    }
                    self.corner_table
                        .set_opposite_corners(corner_a, CornerIndex(face_corner.0 + 1));
                    self.corner_table
                        .set_opposite_corners(corner_b, CornerIndex(face_corner.0 + 2));
                    let vertex_x = self.corner_table.vertex(self.corner_table.next(corner_a));
                    self.map_corner(face_corner, vertex_x);
                    self.map_corner(
                        CornerIndex(face_corner.0 + 1),
                        self.corner_table.vertex(self.corner_table.next(corner_b)),
                    );
                    self.map_corner(
                        CornerIndex(face_corner.0 + 2),
                        self.corner_table
                            .vertex(self.corner_table.previous(corner_a)),
                    );
                    // The tip vertex is now enclosed.
                    self.is_vert_hole[vertex_x.index()] = false;
                    *active_corner_stack.last_mut().unwrap() = face_corner;
                }
                EdgebreakerSymbol::R | EdgebreakerSymbol::L => {
                    // One new vertex, two new boundary edges.
                    let corner_a = *active_corner_stack
                        .last()
                        .ok_or_else(|| corrupt("R/L symbol with no active edge"))?;
                    let opp_corner = if symbol == EdgebreakerSymbol::R {
                        CornerIndex(face_corner.0 + 2)
                    } else {
                        CornerIndex(face_corner.0 + 1)
                    };
                    self.corner_table.set_opposite_corners(opp_corner, corner_a);
                    if num_vertices >= max_num_vertices {
                        return Err(corrupt("decoded more vertices than declared"));
                    }
                    self.map_corner(opp_corner, VertexIndex(num_vertices as u32));
                    num_vertices += 1;
                    self.map_corner(
                        self.corner_table.next(opp_corner),
                        self.corner_table
                            .vertex(self.corner_table.previous(corner_a)),
                    );
                    self.map_corner(
                        self.corner_table.previous(opp_corner),
                        self.corner_table.vertex(self.corner_table.next(corner_a)),
                    );
                    *active_corner_stack.last_mut().unwrap() = face_corner;
                    check_topology_split = true;
                }
                EdgebreakerSymbol::S => {
                    // Merge the two last active edges.
                    let corner_b = active_corner_stack
                        .pop()
                        .ok_or_else(|| corrupt("S symbol with no active edge"))?;
                    if let Some(corner) = topology_split_active_corners.remove(&symbol_id) {
                        // An edge deferred by a topology split joins in.
                        active_corner_stack.push(corner);
                    }
                    let corner_a = *active_corner_stack
                        .last()
                        .ok_or_else(|| corrupt("S symbol with a single active edge"))?;
                    self.corner_table
                        .set_opposite_corners(corner_a, CornerIndex(face_corner.0 + 2));
                    self.corner_table
                        .set_opposite_corners(corner_b, CornerIndex(face_corner.0 + 1));
                    let vertex_p = self
                        .corner_table
                        .vertex(self.corner_table.previous(corner_a));
                    self.map_corner(face_corner, vertex_p);
                    self.map_corner(
                        CornerIndex(face_corner.0 + 1),
                        self.corner_table.vertex(self.corner_table.next(corner_a)),
                    );
                    self.map_corner(
                        CornerIndex(face_corner.0 + 2),
                        self.corner_table
                            .vertex(self.corner_table.previous(corner_b)),
                    );
                    // The vertices at "p" and "n" collapse into one.
                    let mut corner_n = self.corner_table.next(corner_b);
                    let vertex_n = self.corner_table.vertex(corner_n);
                    self.traversal_decoder.merge_vertices(vertex_p, vertex_n);
                    while corner_n.is_valid() {
                        self.map_corner(corner_n, vertex_p);
                        corner_n = self.corner_table.swing_left(corner_n);
                    }
                    self.corner_table.make_vertex_isolated(vertex_n);
                    *active_corner_stack.last_mut().unwrap() = face_corner;
                }
                EdgebreakerSymbol::E => {
                    // A fresh seed triangle.
                    if num_vertices + 3 > max_num_vertices {
                        return Err(corrupt("decoded more vertices than declared"));
                    }
                    self.map_corner(face_corner, VertexIndex(num_vertices as u32));
                    self.map_corner(
                        CornerIndex(face_corner.0 + 1),
                        VertexIndex(num_vertices as u32 + 1),
                    );
                    self.map_corner(
                        CornerIndex(face_corner.0 + 2),
                        VertexIndex(num_vertices as u32 + 2),
                    );
                    num_vertices += 3;
                    active_corner_stack.push(face_corner);
                    check_topology_split = true;
                }
            }

            self.traversal_decoder
                .new_active_corner_reached(*active_corner_stack.last().unwrap(), &self.corner_table);

            if check_topology_split {
                // R, L and E faces can carry deferred edges that a later
                // S symbol will pick up.
                let encoder_symbol_id = num_symbols - symbol_id - 1;
                while let Some(event) = self.topology_split_data.last() {
                    if event.source_symbol_id as usize != encoder_symbol_id {
                        break;
                    }
                    let event = self.topology_split_data.pop().unwrap();
                    if event.split_symbol_id > event.source_symbol_id {
                        return Err(corrupt("split symbol follows its source"));
                    }
                    let act_top_corner = *active_corner_stack.last().unwrap();
                    let new_active_corner = match event.source_edge {
                        EdgeFaceName::RightFaceEdge => self.corner_table.next(act_top_corner),
                        EdgeFaceName::LeftFaceEdge => self.corner_table.previous(act_top_corner),
                    };
                    let decoder_split_symbol_id =
                        num_symbols - event.split_symbol_id as usize - 1;
                    topology_split_active_corners
                        .insert(decoder_split_symbol_id, new_active_corner);
                }
            }
        }

        // Attach the start faces to the edges left on the stack.
        while let Some(corner) = active_corner_stack.pop() {
            let interior_face = self.traversal_decoder.decode_start_face_configuration()?;
            if interior_face {
                if num_faces as usize >= max_faces {
                    return Err(corrupt("decoded more faces than declared"));
                }
                let mut corner_b = self.corner_table.previous(corner);
                while self.corner_table.opposite(corner_b).is_valid() {
                    corner_b = self
                        .corner_table
                        .previous(self.corner_table.opposite(corner_b));
                }
                let mut corner_c = self.corner_table.next(corner);
                while self.corner_table.opposite(corner_c).is_valid() {
                    corner_c = self.corner_table.next(self.corner_table.opposite(corner_c));
                }
                let new_corner = CornerIndex(3 * num_faces);
                num_faces += 1;
                self.corner_table.set_opposite_corners(new_corner, corner);
                self.corner_table
                    .set_opposite_corners(CornerIndex(new_corner.0 + 1), corner_b);
                self.corner_table
                    .set_opposite_corners(CornerIndex(new_corner.0 + 2), corner_c);
                self.map_corner(
                    new_corner,
                    self.corner_table.vertex(self.corner_table.next(corner_b)),
                );
                self.map_corner(
                    CornerIndex(new_corner.0 + 1),
                    self.corner_table.vertex(self.corner_table.next(corner_c)),
                );
                self.map_corner(
                    CornerIndex(new_corner.0 + 2),
                    self.corner_table.vertex(self.corner_table.next(corner)),
                );
                for ci in 0..3 {
                    let vert = self.corner_table.vertex(CornerIndex(new_corner.0 + ci));
                    self.is_vert_hole[vert.index()] = false;
                }
            }
        }
        if num_faces as usize != self.corner_table.num_faces() {
            return Err(corrupt("face count mismatch after reconstruction"));
        }
        Ok(num_vertices)
    }

    fn map_corner(&mut self, corner: CornerIndex, vertex: VertexIndex) {
        self.corner_table.map_corner_to_vertex(corner, vertex);
        self.corner_table.set_left_most_corner(vertex, corner);
    }

    fn decode_hole_and_topology_split_events(
        &mut self,
        buffer: &mut DecoderBuffer<'_>,
        num_symbols: usize,
    ) -> Status {
        let num_topology_splits = buffer.decode_varint_u32()? as usize;
        if num_topology_splits > num_symbols {
            return Err(corrupt("more split events than symbols"));
        }
        let mut last_source_symbol_id = 0u32;
        for _ in 0..num_topology_splits {
            let source_delta = buffer.decode_varint_u32()?;
            let source_symbol_id = last_source_symbol_id + source_delta;
            let split_delta = buffer.decode_varint_u32()?;
            let split_symbol_id = source_symbol_id.checked_sub(split_delta).ok_or_else(|| {
                corrupt("split symbol id underflow")
            })?;
            self.topology_split_data.push(TopologySplitEventData {
                split_symbol_id,
                source_symbol_id,
                source_edge: EdgeFaceName::LeftFaceEdge,
                split_edge: EdgeFaceName::LeftFaceEdge,
            });
            last_source_symbol_id = source_symbol_id;
        }
        if num_topology_splits > 0 {
            buffer.start_bit_decoding(false)?;
            for event in self.topology_split_data.iter_mut() {
                let bits = buffer.decode_least_significant_bits32(2)?;
                event.source_edge = EdgeFaceName::from_bit(bits);
                event.split_edge = EdgeFaceName::from_bit(bits >> 1);
            }
            buffer.end_bit_decoding();
        }

        let num_hole_events = buffer.decode_varint_u32()? as usize;
        if num_hole_events > num_symbols + 1 {
            return Err(corrupt("more hole events than symbols"));
        }
        let mut last_symbol_id = 0u32;
        for _ in 0..num_hole_events {
            let delta = buffer.decode_varint_u32()?;
            let symbol_id = last_symbol_id + delta;
            self.hole_event_data.push(HoleEventData { symbol_id });
            last_symbol_id = symbol_id;
        }
        Ok(())
    }

    fn decode_attribute_connectivities_on_face(&mut self, corner: CornerIndex) {
        let corners = [
            corner,
            self.corner_table.next(corner),
            self.corner_table.previous(corner),
        ];
        for &c in &corners {
            let opp_corner = self.corner_table.opposite(c);
            if !opp_corner.is_valid() {
                // Boundary edges are seams for every attribute.
                for data in self.attribute_data.iter_mut() {
                    data.attribute_seam_corners.push(c);
                }
                continue;
            }
            for i in 0..self.attribute_data.len() {
                if self.traversal_decoder.decode_attribute_seam(i) {
                    self.attribute_data[i].attribute_seam_corners.push(c);
                }
            }
        }
    }

    /// Derives final point ids for every corner, deduplicating across
    /// attribute seams, and writes the faces into the mesh.
    fn assign_points_to_corners(&mut self, mesh: &mut Mesh) {
        mesh.set_num_faces(self.corner_table.num_faces());

        if self.attribute_data.is_empty() {
            // Positions only: a point per non-isolated vertex.
            let mut num_points = 0u32;
            let mut vertex_to_point_map = vec![-1i64; self.corner_table.num_vertices()];
            for f in 0..self.corner_table.num_faces() {
                let face_index = FaceIndex(f as u32);
                let mut face = [PointIndex(0); 3];
                for c in 0..3 {
                    let vert = self
                        .corner_table
                        .vertex(CornerIndex(3 * f as u32 + c as u32));
                    let point_id = &mut vertex_to_point_map[vert.index()];
                    if *point_id == -1 {
                        *point_id = num_points as i64;
                        num_points += 1;
                    }
                    face[c] = PointIndex(*point_id as u32);
                }
                mesh.set_face(face_index, face);
            }
            mesh.set_num_points(num_points as usize);
            return;
        }

        // With attribute seams a point is one (vertex, attribute values)
        // combination: walk each vertex ring clockwise and open a new
        // point whenever any attribute changes.
        let mut point_to_corner_map: Vec<u32> = Vec::new();
        let mut corner_to_point_map = vec![0u32; self.corner_table.num_corners()];
        for v in 0..self.corner_table.num_vertices() {
            let vertex = VertexIndex(v as u32);
            let c = self.corner_table.left_most_corner(vertex);
            if !c.is_valid() {
                continue; // Isolated vertex.
            }
            let mut deduplication_first_corner = c;
            if !self.is_vert_hole[v] {
                // Interior vertex: rotate the start to the first seam of
                // any attribute so one walk covers each point once.
                for data in self.attribute_data.iter() {
                    if !data.connectivity_data.is_corner_on_seam(&self.corner_table, c) {
                        continue;
                    }
                    let vert_id = data.connectivity_data.vertex(c);
                    let mut act_c = self.corner_table.swing_right(c);
                    let mut seam_found = false;
                    while act_c != c {
                        if data.connectivity_data.vertex(act_c) != vert_id {
                            deduplication_first_corner = act_c;
                            seam_found = true;
                            break;
                        }
                        act_c = self.corner_table.swing_right(act_c);
                    }
                    if seam_found {
                        break;
                    }
                }
            }

            let first = deduplication_first_corner;
            corner_to_point_map[first.index()] = point_to_corner_map.len() as u32;
            point_to_corner_map.push(first.value());
            let mut prev_c = first;
            let mut c = self.corner_table.swing_right(first);
            while c.is_valid() && c != first {
                let attribute_seam = self.attribute_data.iter().any(|data| {
                    data.connectivity_data.vertex(c) != data.connectivity_data.vertex(prev_c)
                });
                if attribute_seam {
                    corner_to_point_map[c.index()] = point_to_corner_map.len() as u32;
                    point_to_corner_map.push(c.value());
                } else {
                    corner_to_point_map[c.index()] = corner_to_point_map[prev_c.index()];
                }
                prev_c = c;
                c = self.corner_table.swing_right(c);
            }
        }

        for f in 0..self.corner_table.num_faces() {
            let mut face = [PointIndex(0); 3];
            for c in 0..3 {
                face[c] = PointIndex(corner_to_point_map[3 * f + c]);
            }
            mesh.set_face(FaceIndex(f as u32), face);
        }
        mesh.set_num_points(point_to_corner_map.len());
    }
}
