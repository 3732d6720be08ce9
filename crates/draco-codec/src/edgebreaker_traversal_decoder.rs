//! Decoder counterpart of the traversal symbol coders. The caller feeds
//! it a view positioned at the connectivity buffer and drives it one
//! symbol at a time while rebuilding the corner table.

use crate::adaptive_rans_bit_decoder::AdaptiveRAnsBitDecoder;
use crate::corner_table::CornerTable;
use crate::decoder_buffer::DecoderBuffer;
use crate::edgebreaker_valence::ValenceContextTracker;
use crate::geometry_indices::{CornerIndex, VertexIndex};
use crate::mesh_edgebreaker_shared::{EdgebreakerSymbol, TraversalKind, NUM_VALENCE_CONTEXTS};
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::status::{corrupt, DracoError, Status, StatusOr};
use crate::symbol_encoding::decode_symbols;

pub struct TraversalDecoder<'a> {
    kind: TraversalKind,
    buffer: DecoderBuffer<'a>,
    start_face_decoder: RAnsBitDecoder<'a>,
    start_faces_ready: bool,
    is_c_decoder: AdaptiveRAnsBitDecoder<'a>,
    context_symbols: Vec<Vec<u32>>,
    context_cursors: Vec<usize>,
    tracker: ValenceContextTracker,
    last_symbol: Option<EdgebreakerSymbol>,
    num_symbols: usize,
    attribute_seam_decoders: Vec<RAnsBitDecoder<'a>>,
}

impl<'a> TraversalDecoder<'a> {
    pub fn new(kind: TraversalKind) -> Self {
        Self {
            kind,
            buffer: DecoderBuffer::new(&[]),
            start_face_decoder: RAnsBitDecoder::new(),
            start_faces_ready: false,
            is_c_decoder: AdaptiveRAnsBitDecoder::new(),
            context_symbols: Vec::new(),
            context_cursors: Vec::new(),
            tracker: ValenceContextTracker::new(),
            last_symbol: None,
            num_symbols: 0,
            attribute_seam_decoders: Vec::new(),
        }
    }

    /// Declared symbol count, used to validate the per-context arrays.
    pub fn set_num_symbols(&mut self, num_symbols: usize) {
        self.num_symbols = num_symbols;
    }

    /// Prepares the symbol streams from the connectivity region.
    pub fn start(&mut self, traversal_buffer: DecoderBuffer<'a>) -> Status {
        self.buffer = traversal_buffer;
        match self.kind {
            TraversalKind::Standard => {
                self.buffer.start_bit_decoding(true)?;
            }
            TraversalKind::Predictive => {
                self.is_c_decoder.start_decoding(&mut self.buffer)?;
                self.buffer.start_bit_decoding(true)?;
            }
            TraversalKind::Valence => {
                self.start_face_decoder.start_decoding(&mut self.buffer)?;
                self.start_faces_ready = true;
                for _ in 0..NUM_VALENCE_CONTEXTS {
                    let count = self.buffer.decode_varint_u32()? as usize;
                    if count > self.num_symbols {
                        return Err(corrupt("valence context larger than the symbol count"));
                    }
                    let mut symbols = vec![0u32; count];
                    if count > 0 {
                        decode_symbols(count, 1, &mut self.buffer, &mut symbols)?;
                    }
                    self.context_symbols.push(symbols);
                    self.context_cursors.push(0);
                }
            }
        }
        Ok(())
    }

    pub fn decode_symbol(&mut self) -> StatusOr<EdgebreakerSymbol> {
        let symbol = match self.kind {
            TraversalKind::Standard => {
                if self.buffer.decode_least_significant_bits32(1)? == 0 {
                    EdgebreakerSymbol::C
                } else {
                    let rest = self.buffer.decode_least_significant_bits32(2)?;
                    Self::symbol_from_pattern(1 | (rest << 1))?
                }
            }
            TraversalKind::Predictive => {
                if self.is_c_decoder.decode_next_bit() {
                    EdgebreakerSymbol::C
                } else {
                    let rest = self.buffer.decode_least_significant_bits32(2)?;
                    Self::symbol_from_pattern(1 | (rest << 1))?
                }
            }
            TraversalKind::Valence => match self.tracker.active_context() {
                None => EdgebreakerSymbol::E,
                Some(context) => {
                    let cursor = self.context_cursors[context];
                    let symbols = &self.context_symbols[context];
                    if cursor >= symbols.len() {
                        return Err(corrupt("valence context ran out of symbols"));
                    }
                    self.context_cursors[context] += 1;
                    EdgebreakerSymbol::from_symbol_id(symbols[cursor]).ok_or_else(|| {
                        DracoError::CorruptStream(format!(
                            "invalid edgebreaker symbol id {}",
                            symbols[cursor]
                        ))
                    })?
                }
            },
        };
        self.last_symbol = Some(symbol);
        Ok(symbol)
    }

    fn symbol_from_pattern(pattern: u32) -> StatusOr<EdgebreakerSymbol> {
        match pattern {
            0 => Ok(EdgebreakerSymbol::C),
            1 => Ok(EdgebreakerSymbol::S),
            3 => Ok(EdgebreakerSymbol::R),
            5 => Ok(EdgebreakerSymbol::L),
            7 => Ok(EdgebreakerSymbol::E),
            _ => Err(corrupt(format!(
                "invalid edgebreaker bit pattern {}",
                pattern
            ))),
        }
    }

    /// Reports the active corner after every decoded symbol so the
    /// valence contexts track the reconstruction.
    pub fn new_active_corner_reached(&mut self, corner: CornerIndex, table: &CornerTable) {
        if self.kind == TraversalKind::Valence {
            if let Some(symbol) = self.last_symbol {
                self.tracker.on_symbol(symbol, corner, table);
            }
        }
    }

    pub fn merge_vertices(&mut self, dest: VertexIndex, source: VertexIndex) {
        if self.kind == TraversalKind::Valence {
            self.tracker.on_merge(dest, source);
        }
    }

    pub fn decode_start_face_configuration(&mut self) -> StatusOr<bool> {
        if !self.start_faces_ready {
            // The start-face stream sits right behind the symbol bits.
            self.buffer.end_bit_decoding();
            self.start_face_decoder.start_decoding(&mut self.buffer)?;
            self.start_faces_ready = true;
        }
        Ok(self.start_face_decoder.decode_next_bit())
    }

    /// Prepares the per-attribute seam streams (they follow the event
    /// data in the main buffer).
    pub fn init_attribute_seams(
        &mut self,
        source: &mut DecoderBuffer<'a>,
        num_attribute_data: usize,
    ) -> Status {
        for _ in 0..num_attribute_data {
            let mut decoder = RAnsBitDecoder::new();
            decoder.start_decoding(source)?;
            self.attribute_seam_decoders.push(decoder);
        }
        Ok(())
    }

    pub fn decode_attribute_seam(&mut self, attribute: usize) -> bool {
        self.attribute_seam_decoders[attribute].decode_next_bit()
    }
}
