/// Computes the number of bits needed to store the given symbols under a
/// Shannon-optimal code, plus the number of distinct symbols present.
pub fn compute_shannon_entropy(symbols: &[u32], max_value: u32) -> (u64, u32) {
    if symbols.is_empty() {
        return (0, 0);
    }
    let mut frequencies = vec![0u64; max_value as usize + 1];
    for &s in symbols {
        frequencies[s as usize] += 1;
    }

    let total = symbols.len() as f64;
    let mut num_unique = 0u32;
    let mut entropy_bits = 0.0f64;
    for &freq in &frequencies {
        if freq > 0 {
            num_unique += 1;
            let p = freq as f64 / total;
            entropy_bits += -p.log2() * freq as f64;
        }
    }
    (entropy_bits.ceil() as u64, num_unique)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_symbols_have_zero_entropy() {
        let (bits, unique) = compute_shannon_entropy(&[5; 100], 5);
        assert_eq!(bits, 0);
        assert_eq!(unique, 1);
    }

    #[test]
    fn test_two_equiprobable_symbols() {
        let symbols: Vec<u32> = (0..64).map(|i| i & 1).collect();
        let (bits, unique) = compute_shannon_entropy(&symbols, 1);
        assert_eq!(bits, 64);
        assert_eq!(unique, 2);
    }
}
