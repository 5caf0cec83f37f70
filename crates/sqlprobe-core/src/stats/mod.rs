//! Descriptive statistics over timing/cost/row samples.
//!
//! The quantile estimator deliberately reproduces the "exclusive"
//! linear-interpolation method (positions at i*(n+1)/q), so aggregates
//! are comparable with results produced by earlier runs of the harness.

pub mod hypothesis;

pub use hypothesis::{levene_median, mann_whitney_greater, shapiro_wilk, TestOutcome};

pub fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

pub fn median(xs: &[f64]) -> f64 {
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Bessel-corrected sample variance (divisor n-1). NaN below two samples.
pub fn sample_variance(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// The i-th of n-1 cut points splitting the distribution into n equal
/// parts, with linear interpolation between order statistics. i=3, n=4
/// is the 75th percentile; i=9, n=10 the 90th. Needs at least two
/// samples; otherwise there is nothing to interpolate and the estimate
/// is undefined.
pub fn quantile_exclusive(xs: &[f64], i: usize, n: usize) -> Option<f64> {
    let ld = xs.len();
    if ld < 2 || i == 0 || i >= n {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let m = ld + 1;
    let j = (i * m / n).clamp(1, ld - 1);
    let delta = (i * m) as f64 - (j * n) as f64;
    Some((sorted[j - 1] * (n as f64 - delta) + sorted[j] * delta) / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_median_of_reference_sample() {
        let xs = [10.0, 12.0, 11.0, 13.0, 14.0];
        assert_eq!(mean(&xs), 12.0);
        assert_eq!(median(&xs), 12.0);
    }

    #[test]
    fn median_of_even_sample_interpolates() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn quantiles_match_exclusive_method() {
        // statistics.quantiles([10,11,12,13,14], n=4)[2] == 13.5
        let xs = [10.0, 11.0, 12.0, 13.0, 14.0];
        assert_eq!(quantile_exclusive(&xs, 3, 4), Some(13.5));
        // statistics.quantiles(..., n=10)[8] == 14.4 (extrapolation clamped
        // to the outermost pair of order statistics)
        let p90 = quantile_exclusive(&xs, 9, 10).unwrap();
        assert!((p90 - 14.4).abs() < 1e-12);
    }

    #[test]
    fn quantile_needs_two_samples() {
        assert_eq!(quantile_exclusive(&[5.0], 3, 4), None);
        assert!(quantile_exclusive(&[5.0, 6.0], 3, 4).is_some());
    }

    #[test]
    fn bessel_corrected_variance() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_variance(&xs) - 4.571428571428571).abs() < 1e-12);
        assert!(sample_variance(&[1.0]).is_nan());
    }
}
