//! Entropy coding of unsigned integer symbols grouped into
//! `num_components`-sized tuples. Two schemes are available and the
//! cheaper one is chosen per call:
//!
//! * *tagged* — a 5-bit bit-length tag per tuple (rANS coded over 32
//!   contexts) followed by the components stored raw at that width;
//! * *raw* — every symbol entropy coded directly by a single rANS coder.
//!
//! The scheme is recorded in a leading byte (0 = tagged, 1 = raw). Raw
//! coding is limited to 18-bit values; anything wider forces the tagged
//! scheme.

use crate::bit_utils::bits_required;
use crate::decoder_buffer::DecoderBuffer;
use crate::encoder_buffer::EncoderBuffer;
use crate::rans_symbol_coding::{
    approximate_rans_frequency_table_bits, compute_rans_precision_from_unique_symbols_bit_length,
};
use crate::rans_symbol_decoder::RAnsSymbolDecoder;
use crate::rans_symbol_encoder::RAnsSymbolEncoder;
use crate::shannon_entropy::compute_shannon_entropy;
use crate::status::{corrupt, Status};

const TAGGED_SCHEME: u8 = 0;
const RAW_SCHEME: u8 = 1;

const MAX_RAW_ENCODING_BIT_LENGTH: u32 = 18;
const MAX_TAG_SYMBOLS: usize = 33;

#[derive(Debug, Clone)]
pub struct SymbolEncodingOptions {
    pub compression_level: i32,
}

impl Default for SymbolEncodingOptions {
    fn default() -> Self {
        Self {
            compression_level: 7,
        }
    }
}

fn compute_bit_lengths(symbols: &[u32], num_components: usize) -> (Vec<u32>, u32) {
    let mut bit_lengths = Vec::with_capacity(symbols.len() / num_components);
    let mut max_value = 0;
    for chunk in symbols.chunks(num_components) {
        let max_component_value = chunk.iter().copied().max().unwrap();
        // A zero tuple still takes one bit per component.
        bit_lengths.push(bits_required(max_component_value).max(1));
        max_value = max_value.max(max_component_value);
    }
    (bit_lengths, max_value)
}

fn compute_raw_scheme_bits(symbols: &[u32], max_value: u32) -> u64 {
    let (entropy_bits, num_unique) = compute_shannon_entropy(symbols, max_value);
    entropy_bits + approximate_rans_frequency_table_bits(max_value, num_unique)
}

fn compute_tagged_scheme_bits(
    num_components: usize,
    bit_lengths: &[u32],
) -> u64 {
    let value_bits: u64 = bit_lengths
        .iter()
        .map(|&len| len as u64 * num_components as u64)
        .sum();
    let (tag_entropy_bits, num_unique_tags) = compute_shannon_entropy(bit_lengths, 32);
    value_bits + tag_entropy_bits + approximate_rans_frequency_table_bits(32, num_unique_tags)
}

/// Estimated coded size in bits, without producing any output.
pub fn estimate_bits(symbols: &[u32], num_components: usize) -> u64 {
    if symbols.is_empty() {
        return 0;
    }
    let (bit_lengths, max_value) = compute_bit_lengths(symbols, num_components);
    let tagged_bits = compute_tagged_scheme_bits(num_components, &bit_lengths);
    if bits_required(max_value) > MAX_RAW_ENCODING_BIT_LENGTH {
        return tagged_bits;
    }
    tagged_bits.min(compute_raw_scheme_bits(symbols, max_value))
}

pub fn encode_symbols(
    symbols: &[u32],
    num_components: usize,
    options: &SymbolEncodingOptions,
    target_buffer: &mut EncoderBuffer,
) -> Status {
    if symbols.is_empty() {
        return Ok(());
    }
    debug_assert!(num_components > 0 && symbols.len() % num_components == 0);

    let (bit_lengths, max_value) = compute_bit_lengths(symbols, num_components);
    // Values wider than the raw limit force the tagged scheme (and make
    // the raw frequency table unaffordable to even estimate).
    if bits_required(max_value) > MAX_RAW_ENCODING_BIT_LENGTH {
        target_buffer.encode_u8(TAGGED_SCHEME);
        return encode_tagged_symbols(symbols, num_components, &bit_lengths, target_buffer);
    }
    let tagged_bits = compute_tagged_scheme_bits(num_components, &bit_lengths);
    let raw_bits = compute_raw_scheme_bits(symbols, max_value);

    if tagged_bits < raw_bits {
        target_buffer.encode_u8(TAGGED_SCHEME);
        encode_tagged_symbols(symbols, num_components, &bit_lengths, target_buffer)
    } else {
        target_buffer.encode_u8(RAW_SCHEME);
        encode_raw_symbols(symbols, max_value, options, target_buffer)
    }
}

fn encode_tagged_symbols(
    symbols: &[u32],
    num_components: usize,
    bit_lengths: &[u32],
    target_buffer: &mut EncoderBuffer,
) -> Status {
    let mut frequencies = vec![0u64; MAX_TAG_SYMBOLS];
    for &len in bit_lengths {
        frequencies[len as usize] += 1;
    }

    // The tag alphabet is at most 5 bits wide, which maps to the minimum
    // rANS precision.
    let mut tag_encoder = RAnsSymbolEncoder::new(12);
    if !tag_encoder.create(&frequencies, target_buffer) {
        return Err(corrupt("tag frequency table could not be normalized"));
    }
    tag_encoder.start_encoding();

    // Values go out in forward order through the FIFO bit region; tags go
    // through the LIFO rANS stream and are therefore pushed in reverse.
    let mut value_buffer = EncoderBuffer::new();
    value_buffer.start_bit_encoding(32 * symbols.len(), false);
    for (i, &len) in bit_lengths.iter().enumerate() {
        let val_idx = i * num_components;
        for j in 0..num_components {
            value_buffer.encode_least_significant_bits32(len, symbols[val_idx + j]);
        }
    }
    for &len in bit_lengths.iter().rev() {
        tag_encoder.encode_symbol(len);
    }

    tag_encoder.end_encoding(target_buffer);
    value_buffer.end_bit_encoding();
    target_buffer.encode_data(value_buffer.data());
    Ok(())
}

fn encode_raw_symbols(
    symbols: &[u32],
    max_value: u32,
    options: &SymbolEncodingOptions,
    target_buffer: &mut EncoderBuffer,
) -> Status {
    let mut frequencies = vec![0u64; max_value as usize + 1];
    for &s in symbols {
        frequencies[s as usize] += 1;
    }
    let num_unique_symbols = frequencies.iter().filter(|&&f| f > 0).count() as u32;

    // A larger alphabet model costs table bytes but pays off at higher
    // compression levels.
    let mut unique_symbols_bit_length = bits_required(num_unique_symbols);
    let level = options.compression_level;
    if level < 4 {
        unique_symbols_bit_length = unique_symbols_bit_length.saturating_sub(2);
    } else if level < 6 {
        unique_symbols_bit_length = unique_symbols_bit_length.saturating_sub(1);
    } else if level > 9 {
        unique_symbols_bit_length += 2;
    } else if level > 7 {
        unique_symbols_bit_length += 1;
    }
    unique_symbols_bit_length = unique_symbols_bit_length.clamp(1, MAX_RAW_ENCODING_BIT_LENGTH);

    target_buffer.encode_u8(unique_symbols_bit_length as u8);

    let precision_bits =
        compute_rans_precision_from_unique_symbols_bit_length(unique_symbols_bit_length);
    let mut encoder = RAnsSymbolEncoder::new(precision_bits);
    if !encoder.create(&frequencies, target_buffer) {
        return Err(corrupt("symbol frequency table could not be normalized"));
    }
    encoder.start_encoding();
    for &sym in symbols.iter().rev() {
        encoder.encode_symbol(sym);
    }
    encoder.end_encoding(target_buffer);
    Ok(())
}

pub fn decode_symbols(
    num_values: usize,
    num_components: usize,
    in_buffer: &mut DecoderBuffer<'_>,
    out_symbols: &mut [u32],
) -> Status {
    debug_assert!(out_symbols.len() >= num_values);
    if num_values == 0 {
        return Ok(());
    }
    let scheme = in_buffer.decode_u8()?;
    match scheme {
        TAGGED_SCHEME => decode_tagged_symbols(num_values, num_components, in_buffer, out_symbols),
        RAW_SCHEME => decode_raw_symbols(num_values, in_buffer, out_symbols),
        _ => Err(corrupt(format!("unknown symbol coding scheme {}", scheme))),
    }
}

fn decode_tagged_symbols(
    num_values: usize,
    num_components: usize,
    in_buffer: &mut DecoderBuffer<'_>,
    out_symbols: &mut [u32],
) -> Status {
    let mut tag_decoder = RAnsSymbolDecoder::new(12);
    tag_decoder.create(in_buffer)?;
    tag_decoder.start_decoding(in_buffer)?;

    in_buffer.start_bit_decoding(false)?;
    let num_chunks = num_values / num_components;
    for i in 0..num_chunks {
        let len = tag_decoder.decode_symbol();
        if len == 0 || len > 32 {
            return Err(corrupt(format!("invalid bit-length tag {}", len)));
        }
        let val_idx = i * num_components;
        for j in 0..num_components {
            out_symbols[val_idx + j] = in_buffer.decode_least_significant_bits32(len)?;
        }
    }
    in_buffer.end_bit_decoding();
    tag_decoder.end_decoding();
    Ok(())
}

fn decode_raw_symbols(
    num_values: usize,
    in_buffer: &mut DecoderBuffer<'_>,
    out_symbols: &mut [u32],
) -> Status {
    let unique_symbols_bit_length = in_buffer.decode_u8()? as u32;
    if unique_symbols_bit_length > MAX_RAW_ENCODING_BIT_LENGTH {
        return Err(corrupt("raw symbol bit length out of range"));
    }
    let precision_bits =
        compute_rans_precision_from_unique_symbols_bit_length(unique_symbols_bit_length);

    let mut decoder = RAnsSymbolDecoder::new(precision_bits);
    decoder.create(in_buffer)?;
    decoder.start_decoding(in_buffer)?;
    for value in out_symbols.iter_mut().take(num_values) {
        *value = decoder.decode_symbol();
    }
    decoder.end_decoding();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn round_trip(symbols: &[u32], num_components: usize) -> Vec<u32> {
        let mut buffer = EncoderBuffer::new();
        encode_symbols(
            symbols,
            num_components,
            &SymbolEncodingOptions::default(),
            &mut buffer,
        )
        .unwrap();
        let mut decoded = vec![0u32; symbols.len()];
        let mut source = DecoderBuffer::new(buffer.data());
        decode_symbols(symbols.len(), num_components, &mut source, &mut decoded).unwrap();
        decoded
    }

    #[test]
    fn test_small_alphabet_round_trip() {
        let symbols: Vec<u32> = (0..600).map(|i| (i * 7) % 5).collect();
        assert_eq!(round_trip(&symbols, 1), symbols);
        assert_eq!(round_trip(&symbols, 3), symbols);
    }

    #[test]
    fn test_wide_values_force_tagged_scheme() {
        // 19-bit values cannot take the raw path.
        let symbols = vec![1u32 << 18; 1000];
        let mut buffer = EncoderBuffer::new();
        encode_symbols(
            &symbols,
            1,
            &SymbolEncodingOptions::default(),
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer.data()[0], TAGGED_SCHEME);

        let mut decoded = vec![0u32; symbols.len()];
        let mut source = DecoderBuffer::new(buffer.data());
        decode_symbols(symbols.len(), 1, &mut source, &mut decoded).unwrap();
        assert_eq!(decoded, symbols);
    }

    proptest! {
        #[test]
        fn prop_symbols_round_trip(
            tuples in proptest::collection::vec(
                proptest::collection::vec(0u32..(1 << 20), 3), 1..200),
        ) {
            let symbols: Vec<u32> = tuples.into_iter().flatten().collect();
            prop_assert_eq!(round_trip(&symbols, 3), symbols);
        }

        #[test]
        fn prop_single_component_round_trip(
            symbols in proptest::collection::vec(0u32..5000, 1..300),
        ) {
            prop_assert_eq!(round_trip(&symbols, 1), symbols.clone());
        }
    }
}
