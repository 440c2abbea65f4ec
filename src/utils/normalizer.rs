//! Min-max scaling of score columns.

/// Scale `vals` into `[0, 1]` with `(v - min) / (max - min)`.
///
/// A degenerate range (every finite value equal, single element) maps every
/// value to `1.0` when that shared value is strictly positive and to `0.0`
/// otherwise. Non-finite inputs are ignored for the range and mapped to `0.0`.
/// Never produces NaN or Inf.
pub fn min_max_normalize(vals: &[f64]) -> Vec<f64> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for &v in vals {
        if !v.is_finite() {
            continue;
        }
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    // all non-finite (or empty)
    if !min_v.is_finite() {
        return vec![0.0; vals.len()];
    }
    let range = max_v - min_v;
    if range <= 0.0 {
        let fill = if max_v > 0.0 { 1.0 } else { 0.0 };
        return vals
            .iter()
            .map(|v| if v.is_finite() { fill } else { 0.0 })
            .collect();
    }
    let inv = 1.0 / range;
    vals.iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - min_v) * inv).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// `value / max`, zero when `max` is not positive.
#[inline]
pub fn ratio_to_max(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value / max
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_into_unit_interval() {
        assert_eq!(min_max_normalize(&[-2.0, 0.0, 2.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn uniform_positive_values_become_one() {
        assert_eq!(min_max_normalize(&[0.3, 0.3]), vec![1.0, 1.0]);
        assert_eq!(min_max_normalize(&[4.0]), vec![1.0]);
    }

    #[test]
    fn uniform_non_positive_values_become_zero() {
        assert_eq!(min_max_normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(min_max_normalize(&[-1.0, -1.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let out = min_max_normalize(&[f64::NAN, 1.0, 3.0, f64::INFINITY]);
        assert_eq!(out, vec![0.0, 0.0, 1.0, 0.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }
}
