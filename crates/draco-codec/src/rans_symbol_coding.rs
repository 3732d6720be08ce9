//! Shared pieces of the multi-symbol rANS coder.

#[derive(Debug, Clone, Copy, Default)]
pub struct RAnsSymbol {
    pub prob: u32,
    pub cum_prob: u32,
}

pub fn compute_rans_unclamped_precision(symbols_bit_length: u32) -> u32 {
    (3 * symbols_bit_length) / 2
}

/// Precision of the rANS frequency denominator, clamped to [12, 20] bits.
pub fn compute_rans_precision_from_unique_symbols_bit_length(symbols_bit_length: u32) -> u32 {
    compute_rans_unclamped_precision(symbols_bit_length).clamp(12, 20)
}

/// Rough bit cost of the serialized frequency table, used by the
/// tagged/raw scheme selection heuristic.
pub fn approximate_rans_frequency_table_bits(max_value: u32, num_unique_symbols: u32) -> u64 {
    let diff = max_value.saturating_sub(num_unique_symbols);
    let table_zero_frequency_bits = 8 * (num_unique_symbols + diff / 64);
    (8 * num_unique_symbols + table_zero_frequency_bits) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_clamping() {
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(1), 12);
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(10), 15);
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(18), 20);
        assert_eq!(compute_rans_precision_from_unique_symbols_bit_length(31), 20);
    }
}
