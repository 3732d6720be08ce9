use crate::ans::{AnsDecoder, ANS_L_BASE};
use crate::decoder_buffer::DecoderBuffer;
use crate::status::{corrupt, Status};

/// Decoder counterpart of [`crate::rans_bit_encoder::RAnsBitEncoder`].
#[derive(Default)]
pub struct RAnsBitDecoder<'a> {
    ans_decoder: Option<AnsDecoder<'a>>,
    prob_zero: u8,
}

impl<'a> RAnsBitDecoder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status {
        self.clear();

        self.prob_zero = source_buffer.decode_u8()?;
        let size = source_buffer.decode_varint_u32()? as usize;
        if size > source_buffer.remaining_size() {
            return Err(corrupt("binary ANS stream size exceeds the buffer"));
        }
        let slice = &source_buffer.remaining_data()[..size];
        source_buffer.advance(size)?;

        let mut decoder = AnsDecoder::new(slice);
        if !decoder.read_init(ANS_L_BASE) {
            return Err(corrupt("binary ANS stream head is malformed"));
        }
        self.ans_decoder = Some(decoder);
        Ok(())
    }

    pub fn decode_next_bit(&mut self) -> bool {
        match &mut self.ans_decoder {
            Some(decoder) => decoder.rabs_read(self.prob_zero),
            None => false,
        }
    }

    pub fn decode_least_significant_bits32(&mut self, nbits: u32) -> u32 {
        let mut value = 0;
        for _ in 0..nbits {
            value = (value << 1) + self.decode_next_bit() as u32;
        }
        value
    }

    pub fn end_decoding(&mut self) {
        self.ans_decoder = None;
    }

    fn clear(&mut self) {
        self.ans_decoder = None;
        self.prob_zero = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder_buffer::EncoderBuffer;
    use crate::rans_bit_encoder::RAnsBitEncoder;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_bit_sequence_round_trip(bits in proptest::collection::vec(any::<bool>(), 0..512)) {
            let mut encoder = RAnsBitEncoder::new();
            encoder.start_encoding();
            for &b in &bits {
                encoder.encode_bit(b);
            }
            let mut buffer = EncoderBuffer::new();
            encoder.end_encoding(&mut buffer);

            let mut source = DecoderBuffer::new(buffer.data());
            let mut decoder = RAnsBitDecoder::new();
            decoder.start_decoding(&mut source).unwrap();
            for &b in &bits {
                prop_assert_eq!(decoder.decode_next_bit(), b);
            }
            decoder.end_decoding();
        }
    }

    #[test]
    fn test_lsb32_round_trip() {
        let values = [(5u32, 19u32), (1, 1), (18, 0x2FFFF), (32, 0xDEADBEEF)];
        let mut encoder = RAnsBitEncoder::new();
        encoder.start_encoding();
        for &(nbits, v) in &values {
            encoder.encode_least_significant_bits32(nbits, v);
        }
        let mut buffer = EncoderBuffer::new();
        encoder.end_encoding(&mut buffer);

        let mut source = DecoderBuffer::new(buffer.data());
        let mut decoder = RAnsBitDecoder::new();
        decoder.start_decoding(&mut source).unwrap();
        for &(nbits, v) in &values {
            assert_eq!(decoder.decode_least_significant_bits32(nbits), v);
        }
    }
}
