use crate::ans::{AnsCoder, ANS_L_BASE};
use crate::encoder_buffer::EncoderBuffer;

/// Clamps a probability to [1/256, 255/256] in 1/256 units.
pub(crate) fn clamp_probability(p: f64) -> u8 {
    debug_assert!((0.0..=1.0).contains(&p));
    let mut p_int = (p * 256.0 + 0.5) as u32;
    p_int -= (p_int == 256) as u32;
    p_int += (p_int == 0) as u32;
    p_int as u8
}

/// Exponential smoothing of the zero-bit probability with weight 1/128.
pub(crate) fn update_probability(old_p: f64, bit: bool) -> f64 {
    const W: f64 = 128.0;
    const W0: f64 = (W - 1.0) / W;
    const W1: f64 = 1.0 / W;
    old_p * W0 + (!bit as u32 as f64) * W1
}

/// Binary rANS coder with an adaptive zero-bit probability. Bits are
/// buffered and written in reverse with a forward-computed probability
/// table, so the decoder can adapt while reading forward. Stream layout:
/// `byte_count:u32, bytes`.
#[derive(Default)]
pub struct AdaptiveRAnsBitEncoder {
    bits: Vec<bool>,
}

impl AdaptiveRAnsBitEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_encoding(&mut self) {
        self.bits.clear();
    }

    pub fn encode_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn encode_least_significant_bits32(&mut self, nbits: u32, value: u32) {
        debug_assert!(nbits > 0 && nbits <= 32);
        let mut selector = 1u32 << (nbits - 1);
        while selector != 0 {
            self.encode_bit(value & selector != 0);
            selector >>= 1;
        }
    }

    pub fn end_encoding(&mut self, target_buffer: &mut EncoderBuffer) {
        // The bits go out in reverse, with the probabilities of the
        // forward sequence.
        let mut p0 = 0.5f64;
        let mut p0s = Vec::with_capacity(self.bits.len());
        for &bit in &self.bits {
            p0s.push(clamp_probability(p0));
            p0 = update_probability(p0, bit);
        }

        let mut ans_coder = AnsCoder::new();
        ans_coder.write_init(ANS_L_BASE);
        for (&bit, &prob) in self.bits.iter().zip(p0s.iter()).rev() {
            ans_coder.rabs_write(bit, prob);
        }
        ans_coder
            .write_end()
            .expect("binary ANS state is always serializable");

        target_buffer.encode_u32(ans_coder.data().len() as u32);
        target_buffer.encode_data(ans_coder.data());
        self.bits.clear();
    }
}
