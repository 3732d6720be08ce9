use crate::adaptive_rans_bit_encoder::{clamp_probability, update_probability};
use crate::ans::{AnsDecoder, ANS_L_BASE};
use crate::decoder_buffer::DecoderBuffer;
use crate::status::{corrupt, Status};

/// Decoder counterpart of
/// [`crate::adaptive_rans_bit_encoder::AdaptiveRAnsBitEncoder`]. Decodes
/// in forward order, updating the probability estimate after every bit.
pub struct AdaptiveRAnsBitDecoder<'a> {
    ans_decoder: Option<AnsDecoder<'a>>,
    p0_f: f64,
}

impl<'a> Default for AdaptiveRAnsBitDecoder<'a> {
    fn default() -> Self {
        Self {
            ans_decoder: None,
            p0_f: 0.5,
        }
    }
}

impl<'a> AdaptiveRAnsBitDecoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status {
        self.clear();

        let size = source_buffer.decode_u32()? as usize;
        if size > source_buffer.remaining_size() {
            return Err(corrupt("adaptive ANS stream size exceeds the buffer"));
        }
        let slice = &source_buffer.remaining_data()[..size];
        source_buffer.advance(size)?;

        let mut decoder = AnsDecoder::new(slice);
        if !decoder.read_init(ANS_L_BASE) {
            return Err(corrupt("adaptive ANS stream head is malformed"));
        }
        self.ans_decoder = Some(decoder);
        Ok(())
    }

    pub fn decode_next_bit(&mut self) -> bool {
        let p0 = clamp_probability(self.p0_f);
        let bit = match &mut self.ans_decoder {
            Some(decoder) => decoder.rabs_read(p0),
            None => false,
        };
        self.p0_f = update_probability(self.p0_f, bit);
        bit
    }

    pub fn decode_least_significant_bits32(&mut self, nbits: u32) -> u32 {
        let mut value = 0;
        for _ in 0..nbits {
            value = (value << 1) + self.decode_next_bit() as u32;
        }
        value
    }

    pub fn end_decoding(&mut self) {}

    fn clear(&mut self) {
        self.ans_decoder = None;
        self.p0_f = 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive_rans_bit_encoder::AdaptiveRAnsBitEncoder;
    use crate::encoder_buffer::EncoderBuffer;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_adaptive_bits_round_trip(bits in proptest::collection::vec(any::<bool>(), 0..600)) {
            let mut encoder = AdaptiveRAnsBitEncoder::new();
            encoder.start_encoding();
            for &b in &bits {
                encoder.encode_bit(b);
            }
            let mut buffer = EncoderBuffer::new();
            encoder.end_encoding(&mut buffer);

            let mut source = DecoderBuffer::new(buffer.data());
            let mut decoder = AdaptiveRAnsBitDecoder::new();
            decoder.start_decoding(&mut source).unwrap();
            for &b in &bits {
                prop_assert_eq!(decoder.decode_next_bit(), b);
            }
        }
    }

    #[test]
    fn test_skewed_sequence_compresses() {
        let bits: Vec<bool> = (0..4096).map(|i| i % 100 == 0).collect();
        let mut encoder = AdaptiveRAnsBitEncoder::new();
        encoder.start_encoding();
        for &b in &bits {
            encoder.encode_bit(b);
        }
        let mut buffer = EncoderBuffer::new();
        encoder.end_encoding(&mut buffer);
        // A skewed sequence must come out well below one bit per symbol.
        assert!(buffer.size() < 4096 / 8);
    }
}
