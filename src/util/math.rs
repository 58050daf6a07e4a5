//! Numeric helpers for score vectors.

/// Returns the index of the largest value, preferring the first on ties.
///
/// NaN entries never win. Returns `None` for an empty slice.
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Returns the largest value, or `f32::NEG_INFINITY` for an empty slice.
pub(crate) fn max_score(values: &[f32]) -> f32 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f32::NEG_INFINITY, f32::max)
}

#[cfg(test)]
mod tests {
    use super::{argmax, max_score};

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.2, 0.7, 0.7, 0.1]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax(&[f32::NAN, 0.1, 0.3]), Some(2));
        assert_eq!(argmax(&[f32::NAN]), None);
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn max_score_matches_argmax() {
        let values = [0.1f32, 0.9, 0.4];
        assert!((max_score(&values) - 0.9).abs() < 1e-6);
        assert_eq!(max_score(&[]), f32::NEG_INFINITY);
    }
}
