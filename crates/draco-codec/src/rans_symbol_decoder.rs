use crate::ans::{AnsDecoder, ANS_IO_BASE};
use crate::decoder_buffer::DecoderBuffer;
use crate::rans_symbol_coding::RAnsSymbol;
use crate::status::{corrupt, Status};

/// Multi-symbol rANS decoder. The precision is carried at runtime; the
/// hot path uses shift/mask instead of division by the (power-of-two)
/// precision.
pub struct RAnsSymbolDecoder<'a> {
    ans: AnsDecoder<'a>,
    probability_table: Vec<RAnsSymbol>,
    lut: Vec<u32>,
    num_symbols: usize,
    rans_precision_bits: u32,
    rans_precision_mask: u32,
    rans_precision: u32,
    l_rans_base: u32,
}

impl<'a> RAnsSymbolDecoder<'a> {
    pub fn new(rans_precision_bits: u32) -> Self {
        let rans_precision = 1u32 << rans_precision_bits;
        Self {
            ans: AnsDecoder::new(&[]),
            probability_table: Vec::new(),
            lut: Vec::new(),
            num_symbols: 0,
            rans_precision_bits,
            rans_precision_mask: rans_precision - 1,
            rans_precision,
            l_rans_base: rans_precision * 4,
        }
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    pub fn create(&mut self, buffer: &mut DecoderBuffer<'a>) -> Status {
        let num_symbols = buffer.decode_varint_u32()? as usize;
        self.num_symbols = num_symbols;
        if num_symbols == 0 {
            return Ok(());
        }
        if num_symbols > self.rans_precision as usize {
            return Err(corrupt("probability table larger than the rANS precision"));
        }
        self.probability_table
            .resize(num_symbols, RAnsSymbol::default());

        let mut i = 0;
        while i < num_symbols {
            let byte = buffer.decode_u8()?;
            let token = byte & 3;
            if token == 3 {
                let offset = (byte >> 2) as usize;
                if i + offset >= num_symbols {
                    return Err(corrupt("zero-frequency run past the table end"));
                }
                for j in 0..=offset {
                    self.probability_table[i + j].prob = 0;
                }
                i += offset;
            } else {
                let num_extra_bytes = token as usize;
                let mut prob = (byte >> 2) as u32;
                for b in 0..num_extra_bytes {
                    let extra = buffer.decode_u8()?;
                    prob |= (extra as u32) << (8 * (b + 1) - 2);
                }
                self.probability_table[i].prob = prob;
            }
            i += 1;
        }

        // Cumulative probabilities plus the symbol lookup table.
        self.lut.clear();
        self.lut.resize(self.rans_precision as usize, 0);
        let mut cum_prob: u32 = 0;
        for (i, entry) in self.probability_table.iter_mut().enumerate() {
            entry.cum_prob = cum_prob;
            let end = cum_prob
                .checked_add(entry.prob)
                .filter(|&e| e <= self.rans_precision)
                .ok_or_else(|| corrupt("probabilities exceed the rANS precision"))?;
            for slot in &mut self.lut[cum_prob as usize..end as usize] {
                *slot = i as u32;
            }
            cum_prob = end;
        }
        if cum_prob != self.rans_precision {
            return Err(corrupt("probabilities do not sum to the rANS precision"));
        }
        Ok(())
    }

    pub fn start_decoding(&mut self, buffer: &mut DecoderBuffer<'a>) -> Status {
        let bytes_to_read = buffer.decode_varint_u32()? as usize;
        if bytes_to_read > buffer.remaining_size() {
            return Err(corrupt("rANS stream size exceeds the buffer"));
        }
        if self.num_symbols <= 1 {
            // Nothing was entropy coded; skip past the (empty) stream.
            buffer.advance(bytes_to_read)?;
            return Ok(());
        }
        let rans_data = &buffer.remaining_data()[..bytes_to_read];
        self.ans = AnsDecoder::new(rans_data);
        if !self.ans.read_init(self.l_rans_base) {
            return Err(corrupt("rANS stream head is malformed"));
        }
        buffer.advance(bytes_to_read)?;
        Ok(())
    }

    #[inline]
    pub fn decode_symbol(&mut self) -> u32 {
        if self.num_symbols <= 1 {
            return 0;
        }
        self.ans.read_normalize();
        let quot = self.ans.state >> self.rans_precision_bits;
        let rem = self.ans.state & self.rans_precision_mask;
        let symbol_id = self.lut[rem as usize];

        let sym = &self.probability_table[symbol_id as usize];
        self.ans.state = quot * sym.prob + rem - sym.cum_prob;
        symbol_id
    }

    pub fn end_decoding(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder_buffer::EncoderBuffer;
    use crate::rans_symbol_encoder::RAnsSymbolEncoder;
    use proptest::prelude::*;

    fn round_trip(symbols: &[u32], precision_bits: u32) {
        let max = symbols.iter().copied().max().unwrap_or(0) as usize;
        let mut frequencies = vec![0u64; max + 1];
        for &s in symbols {
            frequencies[s as usize] += 1;
        }

        let mut encoder = RAnsSymbolEncoder::new(precision_bits);
        let mut buffer = EncoderBuffer::new();
        assert!(encoder.create(&frequencies, &mut buffer));
        encoder.start_encoding();
        for &s in symbols.iter().rev() {
            encoder.encode_symbol(s);
        }
        encoder.end_encoding(&mut buffer);

        let mut source = DecoderBuffer::new(buffer.data());
        let mut decoder = RAnsSymbolDecoder::new(precision_bits);
        decoder.create(&mut source).unwrap();
        decoder.start_decoding(&mut source).unwrap();
        for &s in symbols {
            assert_eq!(decoder.decode_symbol(), s);
        }
        assert_eq!(source.remaining_size(), 0);
    }

    #[test]
    fn test_single_symbol_stream() {
        round_trip(&[0; 64], 12);
    }

    #[test]
    fn test_sparse_alphabet() {
        let symbols: Vec<u32> = (0..500).map(|i| if i % 7 == 0 { 63 } else { 2 }).collect();
        round_trip(&symbols, 14);
    }

    proptest! {
        #[test]
        fn prop_rans_symbols_round_trip(
            symbols in proptest::collection::vec(0u32..200, 1..400),
            precision_bits in 12u32..=20,
        ) {
            round_trip(&symbols, precision_bits);
        }
    }
}
