//! Symbol coder boundary cases, including the forced-tagged path for
//! values wider than the raw scheme limit.

use draco_codec::decoder_buffer::DecoderBuffer;
use draco_codec::encoder_buffer::EncoderBuffer;
use draco_codec::symbol_encoding::{decode_symbols, encode_symbols, SymbolEncodingOptions};

fn round_trip(symbols: &[u32], num_components: usize) -> (u8, Vec<u32>) {
    let mut buffer = EncoderBuffer::new();
    encode_symbols(
        symbols,
        num_components,
        &SymbolEncodingOptions::default(),
        &mut buffer,
    )
    .unwrap();
    let scheme = buffer.data()[0];
    let mut decoded = vec![0u32; symbols.len()];
    let mut source = DecoderBuffer::new(buffer.data());
    decode_symbols(symbols.len(), num_components, &mut source, &mut decoded).unwrap();
    (scheme, decoded)
}

#[test]
fn test_19_bit_values_use_tagged_scheme() {
    // Raw coding caps out at 18-bit values; the 19-bit constant stream
    // must take the tagged path and round trip exactly.
    let symbols = vec![1u32 << 18; 1_000_000];
    let (scheme, decoded) = round_trip(&symbols, 1);
    assert_eq!(scheme, 0);
    assert_eq!(decoded, symbols);
}

#[test]
fn test_18_bit_values_round_trip() {
    let symbols: Vec<u32> = (0..10_000).map(|i| (i * 37) % ((1 << 18) - 1)).collect();
    let (_, decoded) = round_trip(&symbols, 1);
    assert_eq!(decoded, symbols);
}

#[test]
fn test_zero_symbols_round_trip() {
    let symbols = vec![0u32; 256];
    let (_, decoded) = round_trip(&symbols, 1);
    assert_eq!(decoded, symbols);
}

#[test]
fn test_component_tuples_round_trip() {
    let symbols: Vec<u32> = (0..999).map(|i| (i * i) % 4096).collect();
    let (_, decoded) = round_trip(&symbols, 3);
    assert_eq!(decoded, symbols);
}

#[test]
fn test_skewed_distribution_round_trip() {
    let symbols: Vec<u32> = (0..50_000)
        .map(|i| if i % 100 == 0 { 900 } else { i % 4 })
        .collect();
    let (_, decoded) = round_trip(&symbols, 1);
    assert_eq!(decoded, symbols);
}
