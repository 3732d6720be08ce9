// Copyright 2022 The Draco Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use byteorder::{LittleEndian, WriteBytesExt};

/// Append-only byte buffer with an interleaved variable-width bit mode.
/// All multi-byte integers are encoded little-endian. Bit sequences are
/// packed LSB-first into their own byte region; byte and bit modes must
/// not interleave without an explicit start/end pair.
#[derive(Debug, Clone, Default)]
pub struct EncoderBuffer {
    buffer: Vec<u8>,
    bit_encoder: Option<BitEncoder>,
    encode_bit_sequence_size: bool,
}

#[derive(Debug, Clone)]
struct BitEncoder {
    bytes: Vec<u8>,
    bit_offset: usize,
}

impl EncoderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            bit_encoder: None,
            encode_bit_sequence_size: false,
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.bit_encoder = None;
        self.encode_bit_sequence_size = false;
    }

    pub fn data(&self) -> &[u8] {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn into_vec(self) -> Vec<u8> {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer
    }

    pub fn bit_encoder_active(&self) -> bool {
        self.bit_encoder.is_some()
    }

    pub fn encode_u8(&mut self, value: u8) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.push(value);
    }

    pub fn encode_i8(&mut self, value: i8) {
        self.encode_u8(value as u8);
    }

    pub fn encode_u16(&mut self, value: u16) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.write_u16::<LittleEndian>(value).unwrap();
    }

    pub fn encode_u32(&mut self, value: u32) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.write_u32::<LittleEndian>(value).unwrap();
    }

    pub fn encode_i32(&mut self, value: i32) {
        self.encode_u32(value as u32);
    }

    pub fn encode_u64(&mut self, value: u64) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.write_u64::<LittleEndian>(value).unwrap();
    }

    pub fn encode_f32(&mut self, value: f32) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.write_f32::<LittleEndian>(value).unwrap();
    }

    pub fn encode_f64(&mut self, value: f64) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.write_f64::<LittleEndian>(value).unwrap();
    }

    pub fn encode_data(&mut self, data: &[u8]) {
        debug_assert!(self.bit_encoder.is_none());
        self.buffer.extend_from_slice(data);
    }

    /// Unsigned varint: 7 data bits per byte, high bit is the continuation
    /// flag, least significant group first.
    pub fn encode_varint(&mut self, mut value: u64) {
        debug_assert!(self.bit_encoder.is_none());
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                self.buffer.push(byte | 0x80);
            } else {
                self.buffer.push(byte);
                break;
            }
        }
    }

    /// Signed varint: zigzag-mapped before the unsigned coding.
    pub fn encode_varint_signed(&mut self, value: i32) {
        self.encode_varint(crate::bit_utils::convert_signed_int_to_symbol(value) as u64);
    }

    /// Enters bit mode. `required_bits` is a sizing hint only; the bit
    /// region grows as needed. If `encode_size` is set, the region is
    /// prefixed with its length in bits as varint when the mode ends.
    pub fn start_bit_encoding(&mut self, required_bits: usize, encode_size: bool) {
        debug_assert!(self.bit_encoder.is_none());
        self.bit_encoder = Some(BitEncoder {
            bytes: Vec::with_capacity((required_bits + 7) / 8),
            bit_offset: 0,
        });
        self.encode_bit_sequence_size = encode_size;
    }

    /// Packs the low `nbits` of `value`, LSB first.
    pub fn encode_least_significant_bits32(&mut self, nbits: u32, value: u32) {
        debug_assert!(nbits <= 32);
        let encoder = self
            .bit_encoder
            .as_mut()
            .expect("bit encoding is not active");
        for bit in 0..nbits {
            let byte_offset = encoder.bit_offset >> 3;
            let bit_shift = (encoder.bit_offset & 7) as u8;
            if byte_offset == encoder.bytes.len() {
                encoder.bytes.push(0);
            }
            encoder.bytes[byte_offset] |= (((value >> bit) & 1) as u8) << bit_shift;
            encoder.bit_offset += 1;
        }
    }

    /// Byte-aligns and flushes the bit region into the main buffer.
    pub fn end_bit_encoding(&mut self) {
        if let Some(encoder) = self.bit_encoder.take() {
            if self.encode_bit_sequence_size {
                self.encode_varint(encoder.bit_offset as u64);
            }
            self.buffer.extend_from_slice(&encoder.bytes);
        }
        self.encode_bit_sequence_size = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_encoding_is_little_endian() {
        let mut buf = EncoderBuffer::new();
        buf.encode_u32(0x12345678);
        assert_eq!(buf.data(), &[0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_bit_encoding_lsb_first() {
        let mut buf = EncoderBuffer::new();
        buf.start_bit_encoding(16, false);
        buf.encode_least_significant_bits32(4, 0b1010);
        buf.encode_least_significant_bits32(4, 0b1100);
        buf.encode_least_significant_bits32(8, 0xFF);
        buf.end_bit_encoding();
        assert_eq!(buf.data(), &[0b11001010, 0b11111111]);
    }

    #[test]
    fn test_bit_encoding_with_size_prefix() {
        let mut buf = EncoderBuffer::new();
        buf.start_bit_encoding(8, true);
        buf.encode_least_significant_bits32(4, 0b1010);
        buf.encode_least_significant_bits32(4, 0b1100);
        buf.end_bit_encoding();
        // varint(8 bits) followed by one data byte.
        assert_eq!(buf.data(), &[8, 0b11001010]);
    }

    #[test]
    fn test_varint() {
        let mut buf = EncoderBuffer::new();
        buf.encode_varint(0);
        buf.encode_varint(127);
        buf.encode_varint(128);
        buf.encode_varint(300);
        assert_eq!(buf.data(), &[0, 127, 0x80, 0x01, 0xAC, 0x02]);
    }

    #[test]
    fn test_partial_byte_is_aligned() {
        let mut buf = EncoderBuffer::new();
        buf.start_bit_encoding(8, false);
        buf.encode_least_significant_bits32(1, 1);
        buf.encode_least_significant_bits32(1, 0);
        buf.encode_least_significant_bits32(1, 1);
        buf.encode_least_significant_bits32(1, 1);
        buf.end_bit_encoding();
        assert_eq!(buf.data(), &[0b00001101]);
    }
}
