use crate::ans::{AnsCoder, ANS_IO_BASE};
use crate::encoder_buffer::EncoderBuffer;
use crate::rans_symbol_coding::RAnsSymbol;

/// Multi-symbol rANS encoder. The frequency denominator is
/// `1 << precision_bits`; the normalized probability table is serialized
/// ahead of the symbol stream so the decoder can rebuild it.
pub struct RAnsSymbolEncoder {
    ans: AnsCoder,
    probability_table: Vec<RAnsSymbol>,
    num_symbols: usize,
    rans_precision_bits: u32,
    rans_precision: u32,
    l_rans_base: u32,
}

impl RAnsSymbolEncoder {
    pub fn new(rans_precision_bits: u32) -> Self {
        let rans_precision = 1u32 << rans_precision_bits;
        Self {
            ans: AnsCoder::new(),
            probability_table: Vec::new(),
            num_symbols: 0,
            rans_precision_bits,
            rans_precision,
            l_rans_base: rans_precision * 4,
        }
    }

    /// Normalizes |frequencies| into the rANS probability table and
    /// serializes it into |buffer|.
    pub fn create(&mut self, frequencies: &[u64], buffer: &mut EncoderBuffer) -> bool {
        let mut total_freq: u64 = 0;
        let mut max_valid_symbol = 0;
        for (i, &freq) in frequencies.iter().enumerate() {
            total_freq += freq;
            if freq > 0 {
                max_valid_symbol = i;
            }
        }
        let num_symbols = max_valid_symbol + 1;
        self.num_symbols = num_symbols;
        self.probability_table
            .resize(num_symbols, RAnsSymbol::default());

        if total_freq == 0 {
            return false;
        }

        let total_freq_d = total_freq as f64;
        let rans_precision_d = self.rans_precision as f64;

        let mut total_rans_prob: u32 = 0;
        for i in 0..num_symbols {
            let freq = frequencies[i];
            let prob = freq as f64 / total_freq_d;
            let mut rans_prob = (prob * rans_precision_d + 0.5) as u32;
            if rans_prob == 0 && freq > 0 {
                rans_prob = 1;
            }
            self.probability_table[i].prob = rans_prob;
            total_rans_prob += rans_prob;
        }

        // The normalized probabilities must sum exactly to the precision.
        // Distribute the rounding error over the most probable symbols.
        if total_rans_prob != self.rans_precision {
            let mut sorted_probabilities: Vec<usize> = (0..num_symbols).collect();
            sorted_probabilities
                .sort_by_key(|&i| self.probability_table[i].prob);

            if total_rans_prob < self.rans_precision {
                let last = *sorted_probabilities.last().unwrap();
                self.probability_table[last].prob += self.rans_precision - total_rans_prob;
            } else {
                let mut error = total_rans_prob as i64 - self.rans_precision as i64;
                while error > 0 {
                    let act_rel_error_d = rans_precision_d / total_rans_prob as f64;
                    for j in (1..num_symbols).rev() {
                        let symbol_id = sorted_probabilities[j];
                        let prob = self.probability_table[symbol_id].prob as i64;
                        if prob <= 1 {
                            if j == num_symbols - 1 {
                                return false;
                            }
                            break;
                        }
                        let new_prob = (act_rel_error_d * prob as f64).floor() as i64;
                        let mut fix = prob - new_prob;
                        if fix == 0 {
                            fix = 1;
                        }
                        if fix >= prob {
                            fix = prob - 1;
                        }
                        if fix > error {
                            fix = error;
                        }
                        self.probability_table[symbol_id].prob -= fix as u32;
                        total_rans_prob -= fix as u32;
                        error -= fix;
                        if total_rans_prob == self.rans_precision {
                            break;
                        }
                    }
                }
            }
        }

        let mut total_prob = 0;
        for entry in self.probability_table.iter_mut() {
            entry.cum_prob = total_prob;
            total_prob += entry.prob;
        }
        if total_prob != self.rans_precision {
            return false;
        }

        self.encode_table(buffer)
    }

    /// Each probability is stored in 6-bit groups: the low 2 bits of the
    /// first byte carry the extra-byte count, or the value 3 marking a
    /// run of zero-frequency symbols whose length sits in the upper bits.
    fn encode_table(&self, buffer: &mut EncoderBuffer) -> bool {
        buffer.encode_varint(self.num_symbols as u64);

        let mut i = 0;
        while i < self.num_symbols {
            let prob = self.probability_table[i].prob;
            let mut num_extra_bytes = 0u32;
            if prob >= (1 << 6) {
                num_extra_bytes += 1;
                if prob >= (1 << 14) {
                    num_extra_bytes += 1;
                    if prob >= (1 << 22) {
                        return false;
                    }
                }
            }

            if prob == 0 {
                // Find the length of the zero run (at most 64 entries).
                let mut offset = 0;
                while offset < (1 << 6) - 1 {
                    if i + offset + 1 >= self.num_symbols {
                        break;
                    }
                    if self.probability_table[i + offset + 1].prob > 0 {
                        break;
                    }
                    offset += 1;
                }
                buffer.encode_u8(((offset as u8) << 2) | 3);
                i += offset;
            } else {
                buffer.encode_u8(((prob as u8) << 2) | (num_extra_bytes as u8 & 3));
                for b in 0..num_extra_bytes {
                    buffer.encode_u8((prob >> (8 * (b + 1) - 2)) as u8);
                }
            }
            i += 1;
        }
        true
    }

    pub fn start_encoding(&mut self) {
        self.ans.write_init(self.l_rans_base);
    }

    pub fn encode_symbol(&mut self, symbol: u32) {
        let sym = self.probability_table[symbol as usize];
        let p = sym.prob;
        while self.ans.state >= self.l_rans_base / self.rans_precision * ANS_IO_BASE * p {
            self.ans.buf.push((self.ans.state % ANS_IO_BASE) as u8);
            self.ans.state /= ANS_IO_BASE;
        }
        self.ans.state =
            ((self.ans.state / p) << self.rans_precision_bits) + (self.ans.state % p) + sym.cum_prob;
    }

    pub fn end_encoding(&mut self, buffer: &mut EncoderBuffer) {
        self.ans
            .write_end()
            .expect("rANS state bounded by the renormalization loop");
        buffer.encode_varint(self.ans.data().len() as u64);
        buffer.encode_data(self.ans.data());
    }
}
