//! Valence bookkeeping for the valence-adaptive traversal coder. The
//! decoder tracks vertex valences of the partially rebuilt mesh and uses
//! the clamped valence of the active vertex (after each symbol is
//! applied) as the context for the next symbol. The encoder obtains the
//! identical context sequence by replaying the decoder's reconstruction
//! over its own symbol and split-event streams.

use std::collections::HashMap;

use crate::corner_table::CornerTable;
use crate::geometry_indices::{CornerIndex, VertexIndex};
use crate::mesh_edgebreaker_shared::{
    EdgeFaceName, EdgebreakerSymbol, TopologySplitEventData, MAX_VALENCE, MIN_VALENCE,
};

#[derive(Debug, Default)]
pub struct ValenceContextTracker {
    vertex_valences: Vec<u32>,
    active_context: Option<usize>,
}

impl ValenceContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_context(&self) -> Option<usize> {
        self.active_context
    }

    fn valence_mut(&mut self, vertex: VertexIndex) -> &mut u32 {
        debug_assert!(vertex.is_valid());
        let slot = if vertex.is_valid() { vertex.index() } else { 0 };
        if slot >= self.vertex_valences.len() {
            self.vertex_valences.resize(slot + 1, 0);
        }
        &mut self.vertex_valences[slot]
    }

    /// Applies the valence changes of the face reached by |corner| and
    /// derives the context for the next symbol from the active vertex.
    pub fn on_symbol(
        &mut self,
        symbol: EdgebreakerSymbol,
        corner: CornerIndex,
        table: &CornerTable,
    ) {
        let vert = table.vertex(corner);
        let next = table.vertex(table.next(corner));
        let prev = table.vertex(table.previous(corner));
        match symbol {
            EdgebreakerSymbol::C | EdgebreakerSymbol::S => {
                *self.valence_mut(next) += 1;
                *self.valence_mut(prev) += 1;
            }
            EdgebreakerSymbol::R => {
                *self.valence_mut(vert) += 1;
                *self.valence_mut(next) += 1;
                *self.valence_mut(prev) += 2;
            }
            EdgebreakerSymbol::L => {
                *self.valence_mut(vert) += 1;
                *self.valence_mut(next) += 2;
                *self.valence_mut(prev) += 1;
            }
            EdgebreakerSymbol::E => {
                *self.valence_mut(vert) += 2;
                *self.valence_mut(next) += 2;
                *self.valence_mut(prev) += 2;
            }
        }
        let active_valence = *self.valence_mut(next) as usize;
        let clamped = active_valence.clamp(MIN_VALENCE, MAX_VALENCE);
        self.active_context = Some(clamped - MIN_VALENCE);
    }

    /// A topology split merged |source| into |dest|.
    pub fn on_merge(&mut self, dest: VertexIndex, source: VertexIndex) {
        let source_valence = *self.valence_mut(source);
        *self.valence_mut(dest) += source_valence;
    }
}

/// Replays the spirale-reversi reconstruction over the recorded symbol
/// stream (encoder order) and returns, for every decoder-order symbol,
/// the context it will be decoded under. The first decoded symbol has no
/// context (it is the implicit E). The reconstruction here must stay in
/// lockstep with the connectivity rebuild in `mesh_edgebreaker_decoder`.
pub(crate) fn assign_valence_contexts(
    symbols: &[EdgebreakerSymbol],
    split_events: &[TopologySplitEventData],
) -> Vec<Option<usize>> {
    let num_symbols = symbols.len();
    let mut contexts = vec![None; num_symbols];
    if num_symbols == 0 {
        return contexts;
    }

    let mut table = CornerTable::reset(num_symbols);
    let mut tracker = ValenceContextTracker::new();
    let mut active_corner_stack: Vec<CornerIndex> = Vec::new();
    let mut topology_split_active_corners: HashMap<usize, CornerIndex> = HashMap::new();
    let mut split_events = split_events.to_vec();
    let mut num_vertices = 0u32;
    let mut num_faces = 0u32;

    for decode_symbol_id in 0..num_symbols {
        contexts[decode_symbol_id] = tracker.active_context();

        let symbol = symbols[num_symbols - decode_symbol_id - 1];
        let face_corner = CornerIndex(3 * num_faces);
        num_faces += 1;
        let mut check_topology_split = false;

        match symbol {
            EdgebreakerSymbol::C => {
                let corner_a = *active_corner_stack.last().unwrap();
                let mut corner_b = table.previous(corner_a);
                while table.opposite(corner_b).is_valid() {
                    corner_b = table.previous(table.opposite(corner_b));
                }
                table.set_opposite_corners(corner_a, CornerIndex(face_corner.0 + 1));
                table.set_opposite_corners(corner_b, CornerIndex(face_corner.0 + 2));
                let vertex_x = table.vertex(table.next(corner_a));
                table.map_corner_to_vertex(face_corner, vertex_x);
                table.map_corner_to_vertex(
                    CornerIndex(face_corner.0 + 1),
                    table.vertex(table.next(corner_b)),
                );
                table.map_corner_to_vertex(
                    CornerIndex(face_corner.0 + 2),
                    table.vertex(table.previous(corner_a)),
                );
                *active_corner_stack.last_mut().unwrap() = face_corner;
            }
            EdgebreakerSymbol::R | EdgebreakerSymbol::L => {
                let corner_a = *active_corner_stack.last().unwrap();
                let opp_corner = if symbol == EdgebreakerSymbol::R {
                    CornerIndex(face_corner.0 + 2)
                } else {
                    CornerIndex(face_corner.0 + 1)
                };
                table.set_opposite_corners(opp_corner, corner_a);
                table.map_corner_to_vertex(opp_corner, VertexIndex(num_vertices));
                num_vertices += 1;
                table.map_corner_to_vertex(
                    table.next(opp_corner),
                    table.vertex(table.previous(corner_a)),
                );
                table.map_corner_to_vertex(
                    table.previous(opp_corner),
                    table.vertex(table.next(corner_a)),
                );
                *active_corner_stack.last_mut().unwrap() = face_corner;
                check_topology_split = true;
            }
            EdgebreakerSymbol::S => {
                let corner_b = active_corner_stack.pop().unwrap();
                if let Some(corner) = topology_split_active_corners.remove(&decode_symbol_id) {
                    active_corner_stack.push(corner);
                }
                let corner_a = *active_corner_stack.last().unwrap();
                table.set_opposite_corners(corner_a, CornerIndex(face_corner.0 + 2));
                table.set_opposite_corners(corner_b, CornerIndex(face_corner.0 + 1));
                let vertex_p = table.vertex(table.previous(corner_a));
                table.map_corner_to_vertex(face_corner, vertex_p);
                table.map_corner_to_vertex(
                    CornerIndex(face_corner.0 + 1),
                    table.vertex(table.next(corner_a)),
                );
                table.map_corner_to_vertex(
                    CornerIndex(face_corner.0 + 2),
                    table.vertex(table.previous(corner_b)),
                );
                let mut corner_n = table.next(corner_b);
                let vertex_n = table.vertex(corner_n);
                tracker.on_merge(vertex_p, vertex_n);
                while corner_n.is_valid() {
                    table.map_corner_to_vertex(corner_n, vertex_p);
                    corner_n = table.swing_left(corner_n);
                }
                *active_corner_stack.last_mut().unwrap() = face_corner;
            }
            EdgebreakerSymbol::E => {
                table.map_corner_to_vertex(face_corner, VertexIndex(num_vertices));
                table.map_corner_to_vertex(
                    CornerIndex(face_corner.0 + 1),
                    VertexIndex(num_vertices + 1),
                );
                table.map_corner_to_vertex(
                    CornerIndex(face_corner.0 + 2),
                    VertexIndex(num_vertices + 2),
                );
                num_vertices += 3;
                active_corner_stack.push(face_corner);
                check_topology_split = true;
            }
        }

        tracker.on_symbol(symbol, *active_corner_stack.last().unwrap(), &table);

        if check_topology_split {
            let encoder_symbol_id = num_symbols - decode_symbol_id - 1;
            while let Some(event) = split_events.last() {
                if event.source_symbol_id as usize != encoder_symbol_id {
                    break;
                }
                let event = split_events.pop().unwrap();
                let act_top_corner = *active_corner_stack.last().unwrap();
                let new_active_corner = match event.source_edge {
                    EdgeFaceName::RightFaceEdge => table.next(act_top_corner),
                    EdgeFaceName::LeftFaceEdge => table.previous(act_top_corner),
                };
                let decoder_split_symbol_id = num_symbols - event.split_symbol_id as usize - 1;
                topology_split_active_corners.insert(decoder_split_symbol_id, new_active_corner);
            }
        }
    }
    contexts
}
