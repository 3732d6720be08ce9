/// Integer square root (floor) of a 64-bit unsigned value.
pub fn int_sqrt(number: u64) -> u64 {
    if number == 0 {
        return 0;
    }
    // Newton's method seeded from the float estimate.
    let mut act_number = (number as f64).sqrt() as u64;
    if act_number == 0 {
        act_number = 1;
    }
    loop {
        let next = (act_number + number / act_number) / 2;
        if next >= act_number {
            break;
        }
        act_number = next;
    }
    while act_number.saturating_mul(act_number) > number {
        act_number -= 1;
    }
    while (act_number + 1).saturating_mul(act_number + 1) <= number {
        act_number += 1;
    }
    act_number
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_values() {
        assert_eq!(int_sqrt(0), 0);
        assert_eq!(int_sqrt(1), 1);
        assert_eq!(int_sqrt(2), 1);
        assert_eq!(int_sqrt(3), 1);
        assert_eq!(int_sqrt(4), 2);
        assert_eq!(int_sqrt(99), 9);
        assert_eq!(int_sqrt(100), 10);
    }

    proptest! {
        #[test]
        fn prop_int_sqrt_is_floor(n in any::<u64>()) {
            let root = int_sqrt(n);
            prop_assert!(root.checked_mul(root).map(|sq| sq <= n).unwrap_or(false) || root == 0 && n == 0);
            if let Some(next_sq) = (root + 1).checked_mul(root + 1) {
                prop_assert!(next_sq > n);
            }
        }
    }
}
