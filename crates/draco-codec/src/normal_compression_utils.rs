//! Octahedral encoding of unit normals: the sphere is projected onto an
//! octahedron whose lower hemisphere is folded into the upper one, and
//! the resulting (u, v) square is quantized uniformly.

/// Maps a normal onto octahedral (s, t) coordinates quantized to
/// `quantization_bits` per axis.
pub fn unit_vector_to_quantized_octahedral_coords(
    normal: [f64; 3],
    quantization_bits: u32,
) -> (i32, i32) {
    let abs_sum = normal[0].abs() + normal[1].abs() + normal[2].abs();
    let (mut u, mut v);
    if abs_sum > 0.0 {
        let scale = 1.0 / abs_sum;
        u = normal[0] * scale;
        v = normal[1] * scale;
        if normal[2] < 0.0 {
            // Fold the lower hemisphere.
            let old_u = u;
            u = (1.0 - v.abs()) * sign(old_u);
            v = (1.0 - old_u.abs()) * sign(v);
        }
    } else {
        u = 0.0;
        v = 0.0;
    }
    let max_quantized_value = ((1u32 << quantization_bits) - 1) as f64;
    let quantize = |val: f64| -> i32 {
        let scaled = (val + 1.0) * 0.5 * max_quantized_value;
        (scaled + 0.5).floor() as i32
    };
    (quantize(u), quantize(v))
}

/// Inverse of [`unit_vector_to_quantized_octahedral_coords`]; the result
/// is a unit vector.
pub fn quantized_octahedral_coords_to_unit_vector(
    s: i32,
    t: i32,
    quantization_bits: u32,
) -> [f64; 3] {
    let max_quantized_value = ((1u32 << quantization_bits) - 1) as f64;
    let u = (s as f64 / max_quantized_value) * 2.0 - 1.0;
    let v = (t as f64 / max_quantized_value) * 2.0 - 1.0;
    octahedral_coords_to_unit_vector(u, v)
}

pub fn octahedral_coords_to_unit_vector(mut u: f64, mut v: f64) -> [f64; 3] {
    let z = 1.0 - u.abs() - v.abs();
    if z < 0.0 {
        // Unfold back into the lower hemisphere.
        let old_u = u;
        u = (1.0 - v.abs()) * sign(old_u);
        v = (1.0 - old_u.abs()) * sign(v);
    }
    let norm = (u * u + v * v + z * z).sqrt();
    if norm == 0.0 {
        return [0.0, 0.0, 1.0];
    }
    [u / norm, v / norm, z / norm]
}

fn sign(value: f64) -> f64 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: [f64; 3], b: [f64; 3], eps: f64) {
        for i in 0..3 {
            assert!(
                (a[i] - b[i]).abs() < eps,
                "component {} differs: {:?} vs {:?}",
                i,
                a,
                b
            );
        }
    }

    #[test]
    fn test_axis_normals_round_trip() {
        let q = 10;
        for normal in [
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [-1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, -1.0],
        ] {
            let (s, t) = unit_vector_to_quantized_octahedral_coords(normal, q);
            let restored = quantized_octahedral_coords_to_unit_vector(s, t, q);
            assert_close(normal, restored, 1e-2);
        }
    }

    #[test]
    fn test_generic_normal_round_trip_error_is_bounded() {
        let q = 11;
        let mut normal = [0.3f64, -0.5, 0.81];
        let len = (normal.iter().map(|c| c * c).sum::<f64>()).sqrt();
        normal.iter_mut().for_each(|c| *c /= len);
        let (s, t) = unit_vector_to_quantized_octahedral_coords(normal, q);
        let restored = quantized_octahedral_coords_to_unit_vector(s, t, q);
        assert_close(normal, restored, 4.0 / (1 << q) as f64);
    }

    #[test]
    fn test_coords_stay_in_range() {
        let q = 8;
        let (s, t) = unit_vector_to_quantized_octahedral_coords([-0.7, -0.7, -0.14], q);
        assert!(s >= 0 && s < (1 << q));
        assert!(t >= 0 && t < (1 << q));
    }
}
