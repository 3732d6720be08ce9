//! Folded coding of (up to) 32-bit integers: every bit position gets its
//! own bit coder, which pays off when the positions have distinct
//! stationary distributions. Scalar bits go through one extra coder.
//! Encoding and decoding must be perfectly symmetric: values handed to
//! `encode_least_significant_bits32` must be read back the same way.

use crate::adaptive_rans_bit_decoder::AdaptiveRAnsBitDecoder;
use crate::adaptive_rans_bit_encoder::AdaptiveRAnsBitEncoder;
use crate::decoder_buffer::DecoderBuffer;
use crate::direct_bit_decoder::DirectBitDecoder;
use crate::direct_bit_encoder::DirectBitEncoder;
use crate::encoder_buffer::EncoderBuffer;
use crate::rans_bit_decoder::RAnsBitDecoder;
use crate::rans_bit_encoder::RAnsBitEncoder;
use crate::status::Status;

pub trait BitEncoding: Default {
    fn start_encoding(&mut self);
    fn encode_bit(&mut self, bit: bool);
    fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer);
}

pub trait BitDecoding<'a>: Default {
    fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status;
    fn decode_next_bit(&mut self) -> bool;
    fn end_decoding(&mut self);
}

macro_rules! impl_bit_coding {
    ($encoder:ty, $decoder:ty) => {
        impl BitEncoding for $encoder {
            fn start_encoding(&mut self) {
                self.start_encoding();
            }
            fn encode_bit(&mut self, bit: bool) {
                self.encode_bit(bit);
            }
            fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) {
                self.end_encoding(target_buffer);
            }
        }

        impl<'a> BitDecoding<'a> for $decoder {
            fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status {
                self.start_decoding(source_buffer)
            }
            fn decode_next_bit(&mut self) -> bool {
                self.decode_next_bit()
            }
            fn end_decoding(&mut self) {
                self.end_decoding();
            }
        }
    };
}

impl_bit_coding!(RAnsBitEncoder, RAnsBitDecoder<'a>);
impl_bit_coding!(AdaptiveRAnsBitEncoder, AdaptiveRAnsBitDecoder<'a>);
impl_bit_coding!(DirectBitEncoder, DirectBitDecoder);

pub struct FoldedBit32Encoder<E: BitEncoding> {
    folded_number_encoders: [E; 32],
    bit_encoder: E,
}

impl<E: BitEncoding> Default for FoldedBit32Encoder<E> {
    fn default() -> Self {
        Self {
            folded_number_encoders: std::array::from_fn(|_| E::default()),
            bit_encoder: E::default(),
        }
    }
}

impl<E: BitEncoding> FoldedBit32Encoder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_encoding(&mut self) {
        for encoder in self.folded_number_encoders.iter_mut() {
            encoder.start_encoding();
        }
        self.bit_encoder.start_encoding();
    }

    pub fn encode_bit(&mut self, bit: bool) {
        self.bit_encoder.encode_bit(bit);
    }

    pub fn encode_least_significant_bits32(&mut self, nbits: u32, value: u32) {
        debug_assert!(nbits > 0 && nbits <= 32);
        let mut selector = 1u32 << (nbits - 1);
        for i in 0..nbits as usize {
            self.folded_number_encoders[i].encode_bit(value & selector != 0);
            selector >>= 1;
        }
    }

    pub fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) {
        for encoder in self.folded_number_encoders.iter_mut() {
            encoder.end_encoding(target_buffer);
        }
        self.bit_encoder.end_encoding(target_buffer);
    }
}

pub struct FoldedBit32Decoder<D> {
    folded_number_decoders: [D; 32],
    bit_decoder: D,
}

impl<D: Default> Default for FoldedBit32Decoder<D> {
    fn default() -> Self {
        Self {
            folded_number_decoders: std::array::from_fn(|_| D::default()),
            bit_decoder: D::default(),
        }
    }
}

impl<'a, D: BitDecoding<'a>> FoldedBit32Decoder<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_decoding(&mut self, source_buffer: &mut DecoderBuffer<'a>) -> Status {
        for decoder in self.folded_number_decoders.iter_mut() {
            decoder.start_decoding(source_buffer)?;
        }
        self.bit_decoder.start_decoding(source_buffer)
    }

    pub fn decode_next_bit(&mut self) -> bool {
        self.bit_decoder.decode_next_bit()
    }

    pub fn decode_least_significant_bits32(&mut self, nbits: u32) -> u32 {
        let mut value = 0;
        for i in 0..nbits as usize {
            let bit = self.folded_number_decoders[i].decode_next_bit();
            value = (value << 1) + bit as u32;
        }
        value
    }

    pub fn end_decoding(&mut self) {
        for decoder in self.folded_number_decoders.iter_mut() {
            decoder.end_decoding();
        }
        self.bit_decoder.end_decoding();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folded_round_trip_rans() {
        let values: Vec<u32> = (0..200).map(|i| (i * 2654435761u64 % 100000) as u32).collect();
        let mut encoder = FoldedBit32Encoder::<RAnsBitEncoder>::new();
        encoder.start_encoding();
        for &v in &values {
            encoder.encode_least_significant_bits32(18, v);
            encoder.encode_bit(v & 1 != 0);
        }
        let mut buffer = EncoderBuffer::new();
        encoder.end_encoding(&mut buffer);

        let mut source = DecoderBuffer::new(buffer.data());
        let mut decoder = FoldedBit32Decoder::<RAnsBitDecoder>::new();
        decoder.start_decoding(&mut source).unwrap();
        for &v in &values {
            assert_eq!(decoder.decode_least_significant_bits32(18), v);
            assert_eq!(decoder.decode_next_bit(), v & 1 != 0);
        }
        decoder.end_decoding();
    }

    #[test]
    fn test_folded_round_trip_direct() {
        let values = [0u32, 1, 7, 0xFFFF, 0xFFFFFFFF];
        let mut encoder = FoldedBit32Encoder::<DirectBitEncoder>::new();
        encoder.start_encoding();
        for &v in &values {
            encoder.encode_least_significant_bits32(32, v);
        }
        let mut buffer = EncoderBuffer::new();
        encoder.end_encoding(&mut buffer);

        let mut source = DecoderBuffer::new(buffer.data());
        let mut decoder = FoldedBit32Decoder::<DirectBitDecoder>::new();
        decoder.start_decoding(&mut source).unwrap();
        for &v in &values {
            assert_eq!(decoder.decode_least_significant_bits32(32), v);
        }
    }
}
