use crate::ans::{AnsCoder, ANS_L_BASE};
use crate::bit_utils::{count_one_bits32, reverse_bits32};
use crate::encoder_buffer::EncoderBuffer;

/// Binary rANS coder with a single zero-bit probability computed over the
/// whole sequence. Stream layout: `prob_zero:u8, byte_count:varint, bytes`.
#[derive(Default)]
pub struct RAnsBitEncoder {
    bit_counts: [u64; 2],
    bits: Vec<u32>,
    local_bits: u32,
    num_local_bits: u32,
}

impl RAnsBitEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_encoding(&mut self) {
        self.clear();
    }

    pub fn clear(&mut self) {
        self.bit_counts = [0; 2];
        self.bits.clear();
        self.local_bits = 0;
        self.num_local_bits = 0;
    }

    pub fn encode_bit(&mut self, bit: bool) {
        if bit {
            self.bit_counts[1] += 1;
            self.local_bits |= 1 << self.num_local_bits;
        } else {
            self.bit_counts[0] += 1;
        }
        self.num_local_bits += 1;
        if self.num_local_bits == 32 {
            self.bits.push(self.local_bits);
            self.num_local_bits = 0;
            self.local_bits = 0;
        }
    }

    pub fn encode_least_significant_bits32(&mut self, nbits: u32, value: u32) {
        debug_assert!(nbits > 0 && nbits <= 32);

        let reversed = reverse_bits32(value) >> (32 - nbits);
        let ones = count_one_bits32(reversed);
        self.bit_counts[0] += (nbits - ones) as u64;
        self.bit_counts[1] += ones as u64;

        let remaining = 32 - self.num_local_bits;
        if nbits <= remaining {
            self.local_bits |= reversed << self.num_local_bits;
            self.num_local_bits += nbits;
            if self.num_local_bits == 32 {
                self.bits.push(self.local_bits);
                self.local_bits = 0;
                self.num_local_bits = 0;
            }
        } else {
            self.local_bits |= reversed << self.num_local_bits;
            self.bits.push(self.local_bits);
            self.local_bits = reversed >> remaining;
            self.num_local_bits = nbits - remaining;
        }
    }

    pub fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) {
        let total = self.bit_counts[0] + self.bit_counts[1];
        let total = if total == 0 { 1 } else { total };

        let zero_prob_raw = ((self.bit_counts[0] as f64 / total as f64) * 256.0 + 0.5) as u32;
        let zero_prob = zero_prob_raw.clamp(1, 255) as u8;

        let mut ans_coder = AnsCoder::new();
        ans_coder.write_init(ANS_L_BASE);

        // The ANS stream is LIFO, so push the buffered bits back to front.
        for i in (0..self.num_local_bits).rev() {
            let bit = (self.local_bits >> i) & 1;
            ans_coder.rabs_write(bit != 0, zero_prob);
        }
        for &word in self.bits.iter().rev() {
            for i in (0..32).rev() {
                let bit = (word >> i) & 1;
                ans_coder.rabs_write(bit != 0, zero_prob);
            }
        }

        ans_coder
            .write_end()
            .expect("binary ANS state is always serializable");

        target_buffer.encode_u8(zero_prob);
        target_buffer.encode_varint(ans_coder.data().len() as u64);
        target_buffer.encode_data(ans_coder.data());
        self.clear();
    }
}
