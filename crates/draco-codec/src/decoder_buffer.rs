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

use byteorder::{ByteOrder, LittleEndian};

use crate::bit_utils::convert_symbol_to_signed_int;
use crate::status::{underflow, DracoError, Status, StatusOr};

/// Read-only view over an encoded byte stream. Cloning is cheap (a slice
/// and an offset), which is how look-ahead views are produced.
#[derive(Debug, Clone)]
pub struct DecoderBuffer<'a> {
    data: &'a [u8],
    pos: usize,
    bit_decoder: Option<BitDecoder>,
}

#[derive(Debug, Clone)]
struct BitDecoder {
    bit_offset: usize,
    // Total length of the bit region when it was prefixed with its size.
    region_bits: Option<u64>,
}

impl<'a> DecoderBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_decoder: None,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining_size(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn remaining_data(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// A detached view starting at the current position plus `offset`.
    pub fn sub_buffer(&self, offset: usize) -> StatusOr<DecoderBuffer<'a>> {
        if self.pos + offset > self.data.len() {
            return Err(underflow("sub-buffer starts past the end of the stream"));
        }
        Ok(DecoderBuffer::new(&self.data[self.pos + offset..]))
    }

    pub fn advance(&mut self, bytes: usize) -> Status {
        if self.pos + bytes > self.data.len() {
            return Err(underflow(format!(
                "cannot advance {} bytes, {} remain",
                bytes,
                self.remaining_size()
            )));
        }
        self.pos += bytes;
        Ok(())
    }

    fn take(&mut self, nbytes: usize) -> StatusOr<&'a [u8]> {
        debug_assert!(self.bit_decoder.is_none());
        if self.pos + nbytes > self.data.len() {
            return Err(underflow(format!(
                "need {} bytes, {} remain",
                nbytes,
                self.remaining_size()
            )));
        }
        let slice = &self.data[self.pos..self.pos + nbytes];
        self.pos += nbytes;
        Ok(slice)
    }

    pub fn decode_u8(&mut self) -> StatusOr<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn decode_i8(&mut self) -> StatusOr<i8> {
        Ok(self.decode_u8()? as i8)
    }

    pub fn decode_u16(&mut self) -> StatusOr<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn decode_u32(&mut self) -> StatusOr<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn decode_i32(&mut self) -> StatusOr<i32> {
        Ok(self.decode_u32()? as i32)
    }

    pub fn decode_u64(&mut self) -> StatusOr<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn decode_f32(&mut self) -> StatusOr<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn decode_f64(&mut self) -> StatusOr<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    pub fn decode_data(&mut self, out: &mut [u8]) -> Status {
        let len = out.len();
        out.copy_from_slice(self.take(len)?);
        Ok(())
    }

    pub fn peek_u8(&self) -> StatusOr<u8> {
        if self.pos >= self.data.len() {
            return Err(underflow("peek past end of stream"));
        }
        Ok(self.data[self.pos])
    }

    pub fn decode_varint(&mut self) -> StatusOr<u64> {
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.decode_u8()?;
            if shift >= 64 {
                return Err(DracoError::CorruptStream("varint is too long".to_string()));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    pub fn decode_varint_u32(&mut self) -> StatusOr<u32> {
        let value = self.decode_varint()?;
        u32::try_from(value)
            .map_err(|_| DracoError::CorruptStream("varint exceeds 32 bits".to_string()))
    }

    pub fn decode_varint_signed(&mut self) -> StatusOr<i32> {
        Ok(convert_symbol_to_signed_int(self.decode_varint_u32()?))
    }

    /// Enters bit mode. Returns the region length in bits when the region
    /// was written with a size prefix, 0 otherwise.
    pub fn start_bit_decoding(&mut self, decode_size: bool) -> StatusOr<u64> {
        debug_assert!(self.bit_decoder.is_none());
        let region_bits = if decode_size {
            Some(self.decode_varint()?)
        } else {
            None
        };
        self.bit_decoder = Some(BitDecoder {
            bit_offset: 0,
            region_bits,
        });
        Ok(region_bits.unwrap_or(0))
    }

    pub fn decode_least_significant_bits32(&mut self, nbits: u32) -> StatusOr<u32> {
        debug_assert!(nbits <= 32);
        let decoder = self
            .bit_decoder
            .as_mut()
            .expect("bit decoding is not active");
        let available = (self.data.len() - self.pos) * 8;
        if decoder.bit_offset + nbits as usize > available {
            return Err(underflow("bit region exhausted"));
        }
        if let Some(total) = decoder.region_bits {
            if (decoder.bit_offset + nbits as usize) as u64 > total {
                return Err(underflow("read past the declared bit region"));
            }
        }
        let mut value = 0u32;
        for bit in 0..nbits {
            let offset = decoder.bit_offset;
            let byte = self.data[self.pos + (offset >> 3)];
            value |= u32::from((byte >> (offset & 7)) & 1) << bit;
            decoder.bit_offset += 1;
        }
        Ok(value)
    }

    /// Leaves bit mode, advancing past the whole region when its length
    /// was declared, or past the consumed bits otherwise.
    pub fn end_bit_decoding(&mut self) {
        if let Some(decoder) = self.bit_decoder.take() {
            let bits = match decoder.region_bits {
                Some(total) => total as usize,
                None => decoder.bit_offset,
            };
            self.pos = (self.pos + (bits + 7) / 8).min(self.data.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder_buffer::EncoderBuffer;
    use proptest::prelude::*;

    #[test]
    fn test_byte_decoding() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xAB];
        let mut buf = DecoderBuffer::new(&data);
        assert_eq!(buf.decode_u32().unwrap(), 0x12345678);
        assert_eq!(buf.decode_u8().unwrap(), 0xAB);
        assert!(buf.decode_u8().is_err());
    }

    #[test]
    fn test_bit_mode_round_trip() {
        let mut enc = EncoderBuffer::new();
        enc.start_bit_encoding(32, true);
        enc.encode_least_significant_bits32(5, 19);
        enc.encode_least_significant_bits32(11, 1234);
        enc.end_bit_encoding();
        enc.encode_u8(0x42);

        let mut dec = DecoderBuffer::new(enc.data());
        let bits = dec.start_bit_decoding(true).unwrap();
        assert_eq!(bits, 16);
        assert_eq!(dec.decode_least_significant_bits32(5).unwrap(), 19);
        assert_eq!(dec.decode_least_significant_bits32(11).unwrap(), 1234);
        dec.end_bit_decoding();
        assert_eq!(dec.decode_u8().unwrap(), 0x42);
    }

    #[test]
    fn test_underflow_reports_error() {
        let data = [1u8, 2];
        let mut buf = DecoderBuffer::new(&data);
        assert!(matches!(
            buf.decode_u32(),
            Err(DracoError::BufferUnderflow(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_varint_u64_round_trip(v in any::<u64>()) {
            let mut enc = EncoderBuffer::new();
            enc.encode_varint(v);
            let mut dec = DecoderBuffer::new(enc.data());
            prop_assert_eq!(dec.decode_varint().unwrap(), v);
            prop_assert_eq!(dec.remaining_size(), 0);
        }

        #[test]
        fn prop_varint_signed_round_trip(v in any::<i32>()) {
            let mut enc = EncoderBuffer::new();
            enc.encode_varint_signed(v);
            let mut dec = DecoderBuffer::new(enc.data());
            prop_assert_eq!(dec.decode_varint_signed().unwrap(), v);
        }
    }
}
