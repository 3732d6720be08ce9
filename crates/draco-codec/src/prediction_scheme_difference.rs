//! Difference prediction: every entry is predicted by the previous one
//! in encoding order; the first entry is stored against zero.

use crate::prediction_scheme::PredictionSchemeTransform;

pub fn encode(values: &mut [i32], num_components: usize, transform: &mut PredictionSchemeTransform) {
    transform.init_encoding(values);
    let num_entries = values.len() / num_components;
    // Process back to front so earlier entries are intact when read.
    for p in (1..num_entries).rev() {
        let pred: Vec<i32> =
            values[(p - 1) * num_components..p * num_components].to_vec();
        transform.compute_correction(
            &mut values[p * num_components..(p + 1) * num_components],
            &pred,
        );
    }
    if num_entries > 0 {
        let zero = vec![0i32; num_components];
        transform.compute_correction(&mut values[..num_components], &zero);
    }
}

pub fn decode(values: &mut [i32], num_components: usize, transform: &PredictionSchemeTransform) {
    let num_entries = values.len() / num_components;
    if num_entries == 0 {
        return;
    }
    let zero = vec![0i32; num_components];
    transform.compute_original_value(&mut values[..num_components], &zero);
    for p in 1..num_entries {
        let pred: Vec<i32> =
            values[(p - 1) * num_components..p * num_components].to_vec();
        transform.compute_original_value(
            &mut values[p * num_components..(p + 1) * num_components],
            &pred,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction_scheme::WrapTransform;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_difference_round_trip(
            entries in proptest::collection::vec(
                proptest::collection::vec(-10000i32..10000, 3), 1..64),
        ) {
            let original: Vec<i32> = entries.into_iter().flatten().collect();
            let mut values = original.clone();
            let mut wrap = WrapTransform::default();
            wrap.init_encoding(&values);
            let mut transform = PredictionSchemeTransform::Wrap(wrap);
            encode(&mut values, 3, &mut transform);
            decode(&mut values, 3, &transform);
            prop_assert_eq!(values, original);
        }
    }
}
