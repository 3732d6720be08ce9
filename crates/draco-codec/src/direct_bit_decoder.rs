use crate::decoder_buffer::DecoderBuffer;
use crate::status::{corrupt, Status};

/// Decoder counterpart of
/// [`crate::direct_bit_encoder::DirectBitEncoder`].
#[derive(Default)]
pub struct DirectBitDecoder {
    bits: Vec<u32>,
    pos: usize,
}

impl DirectBitDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'_>) -> Status {
        self.clear();

        let size_in_bytes = source_buffer.decode_u32()? as usize;
        if size_in_bytes > source_buffer.remaining_size() || size_in_bytes % 4 != 0 {
            return Err(corrupt("direct bit stream size is malformed"));
        }
        let num_words = size_in_bytes / 4;
        self.bits.reserve(num_words);
        for _ in 0..num_words {
            self.bits.push(source_buffer.decode_u32()?);
        }
        Ok(())
    }

    pub fn decode_next_bit(&mut self) -> bool {
        let word = self.pos >> 5;
        if word >= self.bits.len() {
            return false;
        }
        let bit = (self.bits[word] >> (31 - (self.pos & 31))) & 1;
        self.pos += 1;
        bit != 0
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
        self.bits.clear();
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct_bit_encoder::DirectBitEncoder;
    use crate::encoder_buffer::EncoderBuffer;

    #[test]
    fn test_direct_bits_round_trip() {
        let bits: Vec<bool> = (0..77).map(|i| i % 3 == 0).collect();
        let mut encoder = DirectBitEncoder::new();
        encoder.start_encoding();
        for &b in &bits {
            encoder.encode_bit(b);
        }
        let mut buffer = EncoderBuffer::new();
        encoder.end_encoding(&mut buffer);

        let mut source = DecoderBuffer::new(buffer.data());
        let mut decoder = DirectBitDecoder::new();
        decoder.start_decoding(&mut source).unwrap();
        for &b in &bits {
            assert_eq!(decoder.decode_next_bit(), b);
        }
    }

    #[test]
    fn test_mixed_widths_round_trip() {
        let mut encoder = DirectBitEncoder::new();
        encoder.start_encoding();
        encoder.encode_least_significant_bits32(7, 0x55);
        encoder.encode_bit(true);
        encoder.encode_least_significant_bits32(32, 0xCAFEBABE);
        let mut buffer = EncoderBuffer::new();
        encoder.end_encoding(&mut buffer);

        let mut source = DecoderBuffer::new(buffer.data());
        let mut decoder = DirectBitDecoder::new();
        decoder.start_decoding(&mut source).unwrap();
        assert_eq!(decoder.decode_least_significant_bits32(7), 0x55);
        assert!(decoder.decode_next_bit());
        assert_eq!(decoder.decode_least_significant_bits32(32), 0xCAFEBABE);
    }
}
