//! Symbol coding for the edgebreaker traversal. Three variants share one
//! interface: the standard 1/3-bit prefix codes, the predictive coder
//! (adaptive "is C" bit plus the standard disambiguation), and the
//! valence-adaptive coder (one small symbol coder per clamped-valence
//! context). Symbols are buffered in traversal order and written in
//! reverse, matching the decoder's reconstruction order.

use crate::adaptive_rans_bit_encoder::AdaptiveRAnsBitEncoder;
use crate::edgebreaker_valence::assign_valence_contexts;
use crate::encoder_buffer::EncoderBuffer;
use crate::mesh_edgebreaker_shared::{
    EdgebreakerSymbol, TopologySplitEventData, TraversalKind, NUM_VALENCE_CONTEXTS,
};
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::StatusOr;
use crate::symbol_encoding::{encode_symbols, SymbolEncodingOptions};

pub struct TraversalEncoder {
    kind: TraversalKind,
    symbols: Vec<EdgebreakerSymbol>,
    start_face_encoder: RAnsBitEncoder,
    attribute_seam_encoders: Vec<RAnsBitEncoder>,
}

impl TraversalEncoder {
    pub fn new(kind: TraversalKind) -> Self {
        let mut start_face_encoder = RAnsBitEncoder::new();
        start_face_encoder.start_encoding();
        Self {
            kind,
            symbols: Vec::new(),
            start_face_encoder,
            attribute_seam_encoders: Vec::new(),
        }
    }

    pub fn kind(&self) -> TraversalKind {
        self.kind
    }

    pub fn set_num_attribute_data(&mut self, num_attribute_data: usize) {
        self.attribute_seam_encoders = (0..num_attribute_data)
            .map(|_| {
                let mut encoder = RAnsBitEncoder::new();
                encoder.start_encoding();
                encoder
            })
            .collect();
    }

    pub fn encode_symbol(&mut self, symbol: EdgebreakerSymbol) {
        self.symbols.push(symbol);
    }

    pub fn num_encoded_symbols(&self) -> usize {
        self.symbols.len()
    }

    pub fn encode_start_face_configuration(&mut self, interior: bool) {
        self.start_face_encoder.encode_bit(interior);
    }

    pub fn encode_attribute_seam(&mut self, attribute: usize, is_seam: bool) {
        self.attribute_seam_encoders[attribute].encode_bit(is_seam);
    }

    /// Finalizes the traversal buffer. Split events are needed by the
    /// valence variant to replay the decoder-side reconstruction.
    pub fn done(&mut self, split_events: &[TopologySplitEventData]) -> StatusOr<EncoderBuffer> {
        let mut buffer = EncoderBuffer::new();
        match self.kind {
            TraversalKind::Standard => {
                self.encode_traversal_symbols(&mut buffer);
                self.start_face_encoder.end_encoding(&mut buffer);
            }
            TraversalKind::Predictive => {
                self.encode_predictive_symbols(&mut buffer);
                self.start_face_encoder.end_encoding(&mut buffer);
            }
            TraversalKind::Valence => {
                self.start_face_encoder.end_encoding(&mut buffer);
                self.encode_valence_symbols(split_events, &mut buffer)?;
            }
        }
        Ok(buffer)
    }

    /// Appends the per-attribute seam bit streams.
    pub fn encode_attribute_seams(&mut self, target: &mut EncoderBuffer) {
        for encoder in self.attribute_seam_encoders.iter_mut() {
            encoder.end_encoding(target);
        }
    }

    fn encode_traversal_symbols(&self, buffer: &mut EncoderBuffer) {
        buffer.start_bit_encoding(self.symbols.len() * 3, true);
        for symbol in self.symbols.iter().rev() {
            let (pattern, length) = symbol.bit_pattern();
            buffer.encode_least_significant_bits32(length, pattern);
        }
        buffer.end_bit_encoding();
    }

    fn encode_predictive_symbols(&self, buffer: &mut EncoderBuffer) {
        // Stream one: the "is C" bits under the adaptive coder. Stream
        // two: the two remaining prefix-code bits of every non-C symbol.
        // Both run in decoder order.
        let mut is_c_encoder = AdaptiveRAnsBitEncoder::new();
        is_c_encoder.start_encoding();
        for symbol in self.symbols.iter().rev() {
            is_c_encoder.encode_bit(*symbol == EdgebreakerSymbol::C);
        }
        is_c_encoder.end_encoding(buffer);

        buffer.start_bit_encoding(self.symbols.len() * 2, true);
        for symbol in self.symbols.iter().rev() {
            if *symbol != EdgebreakerSymbol::C {
                let (pattern, _) = symbol.bit_pattern();
                buffer.encode_least_significant_bits32(2, pattern >> 1);
            }
        }
        buffer.end_bit_encoding();
    }

    fn encode_valence_symbols(
        &self,
        split_events: &[TopologySplitEventData],
        buffer: &mut EncoderBuffer,
    ) -> StatusOr<()> {
        let contexts = assign_valence_contexts(&self.symbols, split_events);
        let num_symbols = self.symbols.len();

        let mut context_symbols: Vec<Vec<u32>> = vec![Vec::new(); NUM_VALENCE_CONTEXTS];
        // The first decoded symbol is the implicit E; every later symbol
        // lands in the context the decoder will have at that point.
        for decode_symbol_id in 1..num_symbols {
            let context = contexts[decode_symbol_id]
                .expect("every symbol after the first has a context");
            let symbol = self.symbols[num_symbols - decode_symbol_id - 1];
            context_symbols[context].push(symbol.symbol_id());
        }

        for symbols in &context_symbols {
            buffer.encode_varint(symbols.len() as u64);
            if !symbols.is_empty() {
                encode_symbols(symbols, 1, &SymbolEncodingOptions::default(), buffer)?;
            }
        }
        Ok(())
    }
}
