//! Uniform scalar quantization used by the lossy attribute transforms.

#[derive(Debug, Default, Clone, Copy)]
pub struct Quantizer {
    inverse_delta: f32,
}

impl Quantizer {
    pub fn new(range: f32, max_quantized_value: i32) -> Self {
        let inverse_delta = if range > 0.0 {
            max_quantized_value as f32 / range
        } else {
            0.0
        };
        Self { inverse_delta }
    }

    pub fn quantize_float(&self, value: f32) -> i32 {
        let scaled = value * self.inverse_delta;
        (scaled + 0.5).floor() as i32
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Dequantizer {
    delta: f32,
}

impl Dequantizer {
    pub fn new(range: f32, max_quantized_value: i32) -> Option<Self> {
        if max_quantized_value <= 0 {
            return None;
        }
        Some(Self {
            delta: range / max_quantized_value as f32,
        })
    }

    pub fn dequantize_float(&self, value: i32) -> f32 {
        value as f32 * self.delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantization_error_is_bounded() {
        let bits = 11;
        let max_value = (1 << bits) - 1;
        let quantizer = Quantizer::new(1.0, max_value);
        let dequantizer = Dequantizer::new(1.0, max_value).unwrap();
        for i in 0..=1000 {
            let value = i as f32 / 1000.0;
            let restored = dequantizer.dequantize_float(quantizer.quantize_float(value));
            assert!((value - restored).abs() <= 1.0 / max_value as f32);
        }
    }

    #[test]
    fn test_zero_range() {
        let quantizer = Quantizer::new(0.0, 255);
        assert_eq!(quantizer.quantize_float(12.5), 0);
    }
}
