//! Shared statistics helpers for the signal pipeline

/// Arithmetic mean; 0.0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (denominator n-1, guarded to minimum 1)
pub fn sample_std(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

/// Sample variance (denominator n-1, guarded to minimum 1)
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let denom = (values.len() - 1).max(1) as f64;
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / denom
}

/// Sample covariance between paired observations (denominator n-1,
/// guarded to minimum 1). Panics in debug if lengths differ.
pub fn sample_covariance(xs: &[f64], ys: &[f64]) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let mx = mean(&xs[..n]);
    let my = mean(&ys[..n]);
    let denom = (n - 1).max(1) as f64;
    xs[..n]
        .iter()
        .zip(&ys[..n])
        .map(|(x, y)| (x - mx) * (y - my))
        .sum::<f64>()
        / denom
}

/// Percentile rank of `value` within `cross_section`: fraction of its
/// peers strictly below it, times 100, capped at 100. `value` is a
/// member of the cross-section and is not its own peer, so the maximum
/// ranks exactly 100 and the minimum exactly 0, and `100 - pct` ranks
/// the same values from the other end. None for an empty cross-section.
pub fn percentile_rank(cross_section: &[f64], value: f64) -> Option<f64> {
    if cross_section.is_empty() {
        return None;
    }
    let below = cross_section.iter().filter(|&&v| v < value).count();
    let peers = (cross_section.len() - 1).max(1) as f64;
    Some((below as f64 / peers * 100.0).min(100.0))
}

/// Simple moving average of the trailing `period` values, evaluated at
/// the last element. None when fewer than `period` values exist.
pub fn trailing_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let v = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v) - 5.0).abs() < 1e-12);
        // Sample variance of this classic set is 32/7
        assert!((sample_variance(&v) - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_variance_guarded() {
        // Denominator guard: n-1 floors at 1, so a single value has
        // variance 0, not NaN
        assert_eq!(sample_variance(&[3.0]), 0.0);
        assert_eq!(sample_std(&[3.0]), 0.0);
    }

    #[test]
    fn test_covariance_of_identical_series() {
        let xs = vec![1.0, 2.0, 3.0, 4.0];
        let cov = sample_covariance(&xs, &xs);
        assert!((cov - sample_variance(&xs)).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_rank_excludes_self_from_peers() {
        let cross = vec![10.0, 20.0, 20.0, 30.0];
        assert!((percentile_rank(&cross, 20.0).unwrap() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(percentile_rank(&cross, 30.0), Some(100.0));
        assert_eq!(percentile_rank(&cross, 10.0), Some(0.0));
        assert_eq!(percentile_rank(&cross, 35.0), Some(100.0));
        assert_eq!(percentile_rank(&[], 1.0), None);
    }

    #[test]
    fn test_percentile_rank_extremes_invert_cleanly() {
        // 100 - pct must mirror pct when ranking the same members from
        // the other end
        let cross = vec![5.0, 15.0, 25.0];
        for &v in &cross {
            let pct = percentile_rank(&cross, v).unwrap();
            let inverted = 100.0 - pct;
            let mirrored: Vec<f64> = cross.iter().map(|x| -x).collect();
            let from_other_end = percentile_rank(&mirrored, -v).unwrap();
            assert!((inverted - from_other_end).abs() < 1e-9);
        }
        // A lone member has no peers and ranks 0
        assert_eq!(percentile_rank(&[7.0], 7.0), Some(0.0));
    }

    #[test]
    fn test_trailing_sma() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(trailing_sma(&v, 2), Some(3.5));
        assert_eq!(trailing_sma(&v, 4), Some(2.5));
        assert_eq!(trailing_sma(&v, 5), None);
    }
}
