//! Attribute traversal: walks a (possibly seam-constrained) corner table
//! in edgebreaker order and assigns encoding order to attribute values.
//! The encoder replays the recorded connectivity corners; the decoder
//! walks its reconstructed faces in order, which yields the identical
//! sequence.

use crate::corner_table::CornerTable;
use crate::geometry_attribute::PointAttribute;
use crate::geometry_indices::{
    AttributeValueIndex, CornerIndex, FaceIndex, PointIndex, VertexIndex, INVALID_CORNER_INDEX,
    INVALID_FACE_INDEX,
};
use crate::mesh::Mesh;
use crate::mesh_attribute_corner_table::MeshAttributeCornerTable;

/// Traversal-time mapping between vertices, encoded attribute values and
/// the corners they were first reached at.
#[derive(Debug, Default, Clone)]
pub struct MeshAttributeIndicesEncodingData {
    pub vertex_to_encoded_attribute_value_index_map: Vec<i32>,
    pub encoded_attribute_value_index_to_corner_map: Vec<CornerIndex>,
    pub num_values: usize,
}

/// The connectivity operations a traversal needs; implemented by the
/// base corner table and by the per-attribute seam overlay.
pub trait TraversalCornerTable {
    fn opposite(&self, corner: CornerIndex) -> CornerIndex;
    fn next(&self, corner: CornerIndex) -> CornerIndex;
    fn previous(&self, corner: CornerIndex) -> CornerIndex;
    fn vertex(&self, corner: CornerIndex) -> VertexIndex;
    fn num_vertices(&self) -> usize;
    fn num_faces(&self) -> usize;
    fn is_on_boundary(&self, vertex: VertexIndex) -> bool;

    fn face(&self, corner: CornerIndex) -> FaceIndex {
        if !corner.is_valid() {
            return INVALID_FACE_INDEX;
        }
        FaceIndex(corner.0 / 3)
    }

    fn get_right_corner(&self, corner: CornerIndex) -> CornerIndex {
        self.opposite(self.next(corner))
    }

    fn get_left_corner(&self, corner: CornerIndex) -> CornerIndex {
        self.opposite(self.previous(corner))
    }

    fn swing_right(&self, corner: CornerIndex) -> CornerIndex {
        self.previous(self.opposite(self.previous(corner)))
    }

    fn swing_left(&self, corner: CornerIndex) -> CornerIndex {
        self.next(self.opposite(self.next(corner)))
    }
}

impl TraversalCornerTable for CornerTable {
    fn opposite(&self, corner: CornerIndex) -> CornerIndex {
        CornerTable::opposite(self, corner)
    }
    fn next(&self, corner: CornerIndex) -> CornerIndex {
        CornerTable::next(self, corner)
    }
    fn previous(&self, corner: CornerIndex) -> CornerIndex {
        CornerTable::previous(self, corner)
    }
    fn vertex(&self, corner: CornerIndex) -> VertexIndex {
        CornerTable::vertex(self, corner)
    }
    fn num_vertices(&self) -> usize {
        CornerTable::num_vertices(self)
    }
    fn num_faces(&self) -> usize {
        CornerTable::num_faces(self)
    }
    fn is_on_boundary(&self, vertex: VertexIndex) -> bool {
        CornerTable::is_on_boundary(self, vertex)
    }
}

/// Seam-aware view pairing an attribute overlay with its base table.
pub struct AttributeCornerTableView<'t> {
    pub base: &'t CornerTable,
    pub overlay: &'t MeshAttributeCornerTable,
}

impl<'t> TraversalCornerTable for AttributeCornerTableView<'t> {
    fn opposite(&self, corner: CornerIndex) -> CornerIndex {
        self.overlay.opposite(self.base, corner)
    }
    fn next(&self, corner: CornerIndex) -> CornerIndex {
        self.base.next(corner)
    }
    fn previous(&self, corner: CornerIndex) -> CornerIndex {
        self.base.previous(corner)
    }
    fn vertex(&self, corner: CornerIndex) -> VertexIndex {
        self.overlay.vertex(corner)
    }
    fn num_vertices(&self) -> usize {
        self.overlay.num_vertices()
    }
    fn num_faces(&self) -> usize {
        self.base.num_faces()
    }
    fn is_on_boundary(&self, vertex: VertexIndex) -> bool {
        self.overlay.is_on_boundary(self.base, vertex)
    }
}

/// Traversal order selector (the `traversal_method` wire byte).
pub const MESH_TRAVERSAL_DEPTH_FIRST: u8 = 0;
pub const MESH_TRAVERSAL_PREDICTION_DEGREE: u8 = 1;

struct TraversalState {
    visited_vertices: Vec<bool>,
    visited_faces: Vec<bool>,
}

impl TraversalState {
    fn new<T: TraversalCornerTable>(table: &T) -> Self {
        Self {
            visited_vertices: vec![false; table.num_vertices()],
            visited_faces: vec![false; table.num_faces()],
        }
    }

    fn is_face_visited(&self, face: FaceIndex) -> bool {
        if !face.is_valid() {
            return true;
        }
        self.visited_faces[face.index()]
    }

    fn visit_vertex<T: TraversalCornerTable>(
        &mut self,
        vertex: VertexIndex,
        corner: CornerIndex,
        _table: &T,
        encoding_data: &mut MeshAttributeIndicesEncodingData,
    ) {
        if self.visited_vertices[vertex.index()] {
            return;
        }
        self.visited_vertices[vertex.index()] = true;
        encoding_data.vertex_to_encoded_attribute_value_index_map[vertex.index()] =
            encoding_data.num_values as i32;
        encoding_data
            .encoded_attribute_value_index_to_corner_map
            .push(corner);
        encoding_data.num_values += 1;
    }
}

/// Right-first edgebreaker traversal, identical in shape to the
/// connectivity encoder's walk.
fn traverse_from_corner<T: TraversalCornerTable>(
    table: &T,
    start_corner: CornerIndex,
    state: &mut TraversalState,
    encoding_data: &mut MeshAttributeIndicesEncodingData,
) {
    if !start_corner.is_valid() {
        return;
    }
    let mut corner_traversal_stack = vec![start_corner];

    let next_vert = table.vertex(table.next(start_corner));
    let prev_vert = table.vertex(table.previous(start_corner));
    state.visit_vertex(next_vert, table.next(start_corner), table, encoding_data);
    state.visit_vertex(prev_vert, table.previous(start_corner), table, encoding_data);

    while let Some(&top) = corner_traversal_stack.last() {
        let mut corner = top;
        if !corner.is_valid() || state.is_face_visited(table.face(corner)) {
            corner_traversal_stack.pop();
            continue;
        }
        loop {
            let face = table.face(corner);
            state.visited_faces[face.index()] = true;
            let vert = table.vertex(corner);
            let on_boundary = table.is_on_boundary(vert);
            if !state.visited_vertices[vert.index()] {
                state.visit_vertex(vert, corner, table, encoding_data);
                if !on_boundary {
                    corner = table.get_right_corner(corner);
                    continue;
                }
            }
            let right_corner = table.get_right_corner(corner);
            let left_corner = table.get_left_corner(corner);
            let right_visited = state.is_face_visited(table.face(right_corner));
            let left_visited = state.is_face_visited(table.face(left_corner));
            if right_visited {
                if left_visited {
                    corner_traversal_stack.pop();
                    break;
                } else {
                    corner = left_corner;
                }
            } else if left_visited {
                corner = right_corner;
            } else {
                *corner_traversal_stack.last_mut().unwrap() = left_corner;
                corner_traversal_stack.push(right_corner);
                break;
            }
        }
    }
}

/// Multi-way traversal guided by the prediction degree of destination
/// vertices; used for positions at the lowest encoder speed.
fn traverse_from_corner_prediction_degree<T: TraversalCornerTable>(
    table: &T,
    start_corner: CornerIndex,
    state: &mut TraversalState,
    prediction_degree: &mut [u32],
    encoding_data: &mut MeshAttributeIndicesEncodingData,
) {
    const MAX_PRIORITY: usize = 3;
    if !start_corner.is_valid() {
        return;
    }
    let mut traversal_stacks: [Vec<CornerIndex>; MAX_PRIORITY] = Default::default();
    let mut best_priority = 0usize;
    traversal_stacks[0].push(start_corner);

    let next_vert = table.vertex(table.next(start_corner));
    let prev_vert = table.vertex(table.previous(start_corner));
    let tip_vert = table.vertex(start_corner);
    state.visit_vertex(next_vert, table.next(start_corner), table, encoding_data);
    state.visit_vertex(prev_vert, table.previous(start_corner), table, encoding_data);
    state.visit_vertex(tip_vert, start_corner, table, encoding_data);

    let pop_next = |stacks: &mut [Vec<CornerIndex>; MAX_PRIORITY], best: &mut usize| {
        for i in *best..MAX_PRIORITY {
            if let Some(corner) = stacks[i].pop() {
                *best = i;
                return corner;
            }
        }
        INVALID_CORNER_INDEX
    };

    loop {
        let mut corner = pop_next(&mut traversal_stacks, &mut best_priority);
        if !corner.is_valid() {
            break;
        }
        if state.is_face_visited(table.face(corner)) {
            continue;
        }
        loop {
            let face = table.face(corner);
            state.visited_faces[face.index()] = true;
            let vert = table.vertex(corner);
            state.visit_vertex(vert, corner, table, encoding_data);

            let right_corner = table.get_right_corner(corner);
            let left_corner = table.get_left_corner(corner);
            let right_visited = state.is_face_visited(table.face(right_corner));
            let left_visited = state.is_face_visited(table.face(left_corner));

            let mut compute_priority = |corner_id: CornerIndex| -> usize {
                let v_tip = table.vertex(corner_id);
                let mut priority = 0;
                if !state.visited_vertices[v_tip.index()] {
                    prediction_degree[v_tip.index()] += 1;
                    priority = if prediction_degree[v_tip.index()] > 1 {
                        1
                    } else {
                        2
                    };
                }
                priority.min(MAX_PRIORITY - 1)
            };

            let mut continue_corner = INVALID_CORNER_INDEX;
            if !left_visited {
                let priority = compute_priority(left_corner);
                if right_visited && priority <= best_priority {
                    continue_corner = left_corner;
                } else {
                    traversal_stacks[priority].push(left_corner);
                    if priority < best_priority {
                        best_priority = priority;
                    }
                }
            }
            if !continue_corner.is_valid() && !right_visited {
                let priority = compute_priority(right_corner);
                if priority <= best_priority {
                    continue_corner = right_corner;
                } else {
                    traversal_stacks[priority].push(right_corner);
                    if priority < best_priority {
                        best_priority = priority;
                    }
                }
            }
            if continue_corner.is_valid() {
                corner = continue_corner;
            } else {
                break;
            }
        }
    }
}

/// Runs the traversal and fills |encoding_data| with the value order.
/// The encoder passes the recorded connectivity corners; the decoder
/// passes `None` and walks faces in reconstruction order.
pub fn generate_sequence<T: TraversalCornerTable>(
    table: &T,
    corner_order: Option<&[CornerIndex]>,
    traversal_method: u8,
    encoding_data: &mut MeshAttributeIndicesEncodingData,
) {
    encoding_data
        .vertex_to_encoded_attribute_value_index_map
        .clear();
    encoding_data
        .vertex_to_encoded_attribute_value_index_map
        .resize(table.num_vertices(), -1);
    encoding_data
        .encoded_attribute_value_index_to_corner_map
        .clear();
    encoding_data.num_values = 0;

    let mut state = TraversalState::new(table);
    let mut prediction_degree = vec![0u32; table.num_vertices()];

    let mut process = |corner: CornerIndex,
                       state: &mut TraversalState,
                       prediction_degree: &mut Vec<u32>,
                       encoding_data: &mut MeshAttributeIndicesEncodingData| {
        if traversal_method == MESH_TRAVERSAL_PREDICTION_DEGREE {
            traverse_from_corner_prediction_degree(
                table,
                corner,
                state,
                prediction_degree,
                encoding_data,
            );
        } else {
            traverse_from_corner(table, corner, state, encoding_data);
        }
    };

    match corner_order {
        Some(corners) => {
            for &corner in corners {
                process(corner, &mut state, &mut prediction_degree, encoding_data);
            }
        }
        None => {
            for f in 0..table.num_faces() {
                process(
                    CornerIndex(3 * f as u32),
                    &mut state,
                    &mut prediction_degree,
                    encoding_data,
                );
            }
        }
    }
}

/// Points in encoding order: one per attribute value, sampled at the
/// corner the value was first reached.
pub fn sequence_points(
    mesh: &Mesh,
    encoding_data: &MeshAttributeIndicesEncodingData,
) -> Vec<PointIndex> {
    encoding_data
        .encoded_attribute_value_index_to_corner_map
        .iter()
        .map(|corner| mesh.corner_to_point(corner.value()))
        .collect()
}

/// Rebuilds the decoder-side point -> value mapping of an attribute from
/// the traversal result.
pub fn update_point_to_attribute_index_mapping<T: TraversalCornerTable>(
    table: &T,
    mesh: &Mesh,
    encoding_data: &MeshAttributeIndicesEncodingData,
    att: &mut PointAttribute,
) {
    att.set_explicit_mapping(mesh.num_points());
    for f in 0..table.num_faces() {
        for local in 0..3 {
            let corner = CornerIndex(3 * f as u32 + local);
            let vertex = table.vertex(corner);
            if !vertex.is_valid() {
                continue;
            }
            let value =
                encoding_data.vertex_to_encoded_attribute_value_index_map[vertex.index()];
            if value < 0 {
                continue;
            }
            let point = mesh.corner_to_point(corner.value());
            att.set_point_map_entry(point, AttributeValueIndex(value as u32));
        }
    }
}
