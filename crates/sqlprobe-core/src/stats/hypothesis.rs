//! Small-sample hypothesis tests backing the statistical comparator.
//!
//! All three tests accept any sample count >= 3. The harness feeds them
//! 5-sample run sets, which sits at the low end of their valid range;
//! the resulting loss of statistical power is a documented limitation of
//! the experiment design, not something these implementations try to
//! compensate for.

use anyhow::{bail, Result};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal};

/// Statistic plus p-value of one test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

/// Shapiro-Wilk normality test using Royston's AS R94 approximation
/// for the weights and the p-value transform.
pub fn shapiro_wilk(xs: &[f64]) -> Result<TestOutcome> {
    let n = xs.len();
    if n < 3 {
        bail!("shapiro-wilk requires at least 3 samples (got {n})");
    }
    let mut x = xs.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    if x[n - 1] - x[0] == 0.0 {
        bail!("shapiro-wilk is undefined for a zero-range sample");
    }

    let nf = n as f64;
    let norm = standard_normal()?;

    // Expected normal order statistics (Blom scores).
    let m: Vec<f64> = (1..=n)
        .map(|i| norm.inverse_cdf((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let ssm: f64 = m.iter().map(|v| v * v).sum();

    let mut a = vec![0.0; n];
    if n == 3 {
        let w = (0.5f64).sqrt();
        a[0] = -w;
        a[2] = w;
    } else {
        let u = 1.0 / nf.sqrt();
        let c_n = m[n - 1] / ssm.sqrt();
        let a_n = c_n
            + u * (0.221157
                + u * (-0.147981 + u * (-2.071190 + u * (4.434685 + u * -2.706056))));
        if n > 5 {
            let c_n1 = m[n - 2] / ssm.sqrt();
            let a_n1 = c_n1
                + u * (0.042981
                    + u * (-0.293762 + u * (-1.752461 + u * (5.682633 + u * -3.582633))));
            let phi = (ssm - 2.0 * m[n - 1] * m[n - 1] - 2.0 * m[n - 2] * m[n - 2])
                / (1.0 - 2.0 * a_n * a_n - 2.0 * a_n1 * a_n1);
            let scale = phi.sqrt();
            for i in 2..n - 2 {
                a[i] = m[i] / scale;
            }
            a[n - 1] = a_n;
            a[n - 2] = a_n1;
            a[0] = -a_n;
            a[1] = -a_n1;
        } else {
            let phi = (ssm - 2.0 * m[n - 1] * m[n - 1]) / (1.0 - 2.0 * a_n * a_n);
            let scale = phi.sqrt();
            for i in 1..n - 1 {
                a[i] = m[i] / scale;
            }
            a[n - 1] = a_n;
            a[0] = -a_n;
        }
    }

    let xbar = x.iter().sum::<f64>() / nf;
    let numerator: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum::<f64>().powi(2);
    let denominator: f64 = x.iter().map(|xi| (xi - xbar).powi(2)).sum();
    let w = (numerator / denominator).min(1.0 - 1e-12);

    let p = if n == 3 {
        (6.0 / std::f64::consts::PI * (w.sqrt().asin() - (0.75f64).sqrt().asin()))
            .clamp(0.0, 1.0)
    } else if n <= 11 {
        let g = -2.273 + 0.459 * nf;
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf * nf - 0.0006714 * nf.powi(3);
        let sigma = (1.3822 - 0.77857 * nf + 0.062767 * nf * nf - 0.0020322 * nf.powi(3)).exp();
        let z = (-((g - (1.0 - w).ln()).ln()) - mu) / sigma;
        1.0 - norm.cdf(z)
    } else {
        let ln_n = nf.ln();
        let mu = -1.5861 - 0.31082 * ln_n - 0.083751 * ln_n * ln_n + 0.0038915 * ln_n.powi(3);
        let sigma = (-0.4803 - 0.082676 * ln_n + 0.0030302 * ln_n * ln_n).exp();
        let z = ((1.0 - w).ln() - mu) / sigma;
        1.0 - norm.cdf(z)
    };

    Ok(TestOutcome {
        statistic: w,
        p_value: p.clamp(0.0, 1.0),
    })
}

/// Two-group Levene test for variance equality with median centering
/// (Brown-Forsythe), the robust default.
pub fn levene_median(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    if a.len() < 3 || b.len() < 3 {
        bail!(
            "levene requires at least 3 samples per group (got {} and {})",
            a.len(),
            b.len()
        );
    }
    let za = absolute_deviations(a);
    let zb = absolute_deviations(b);
    let (n1, n2) = (za.len() as f64, zb.len() as f64);
    let total = n1 + n2;
    let (mean_a, mean_b) = (super::mean(&za), super::mean(&zb));
    let grand = (za.iter().sum::<f64>() + zb.iter().sum::<f64>()) / total;

    let between = n1 * (mean_a - grand).powi(2) + n2 * (mean_b - grand).powi(2);
    let within: f64 = za.iter().map(|z| (z - mean_a).powi(2)).sum::<f64>()
        + zb.iter().map(|z| (z - mean_b).powi(2)).sum::<f64>();

    // Two groups: k - 1 == 1, so W = (N - 2) * between / within.
    let numerator = (total - 2.0) * between;
    if within == 0.0 {
        // No spread in either group's deviations.
        let (stat, p) = if numerator == 0.0 {
            (0.0, 1.0)
        } else {
            (f64::INFINITY, 0.0)
        };
        return Ok(TestOutcome {
            statistic: stat,
            p_value: p,
        });
    }
    let w = numerator / within;
    let f = FisherSnedecor::new(1.0, total - 2.0)
        .map_err(|e| anyhow::anyhow!("invalid F distribution parameters: {e}"))?;
    Ok(TestOutcome {
        statistic: w,
        p_value: (1.0 - f.cdf(w)).clamp(0.0, 1.0),
    })
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| anyhow::anyhow!("invalid normal distribution: {e}"))
}

fn absolute_deviations(xs: &[f64]) -> Vec<f64> {
    let med = super::median(xs);
    xs.iter().map(|x| (x - med).abs()).collect()
}

/// One-sided Mann-Whitney U rank-sum test with alternative "the first
/// sample is stochastically greater". Uses the exact null distribution
/// when the pooled sample is free of ties, and the tie-corrected normal
/// approximation with continuity correction otherwise.
pub fn mann_whitney_greater(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    let (n1, n2) = (a.len(), b.len());
    if n1 < 3 || n2 < 3 {
        bail!(
            "mann-whitney requires at least 3 samples per side (got {} and {})",
            n1,
            n2
        );
    }

    let (rank_sum_a, tie_term, has_ties) = midranks(a, b);
    let u1 = rank_sum_a - (n1 * (n1 + 1)) as f64 / 2.0;

    let p = if !has_ties {
        exact_p_greater(u1.round() as usize, n1, n2)
    } else {
        let nf = (n1 + n2) as f64;
        let mu = (n1 * n2) as f64 / 2.0;
        let sigma2 = (n1 * n2) as f64 / 12.0 * ((nf + 1.0) - tie_term / (nf * (nf - 1.0)));
        if sigma2 <= 0.0 {
            // Every pooled value tied: the test carries no information.
            1.0
        } else {
            let z = (u1 - mu - 0.5) / sigma2.sqrt();
            1.0 - standard_normal()?.cdf(z)
        }
    };

    Ok(TestOutcome {
        statistic: u1,
        p_value: p.clamp(0.0, 1.0),
    })
}

/// Midranks of the first sample within the pooled ordering, plus the
/// tie correction term sum(t^3 - t) and a tie flag.
fn midranks(a: &[f64], b: &[f64]) -> (f64, f64, bool) {
    let mut pooled: Vec<(f64, bool)> = a
        .iter()
        .map(|&v| (v, true))
        .chain(b.iter().map(|&v| (v, false)))
        .collect();
    pooled.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut rank_sum_a = 0.0;
    let mut tie_term = 0.0;
    let mut has_ties = false;
    let mut i = 0;
    while i < pooled.len() {
        let mut j = i;
        while j + 1 < pooled.len() && pooled[j + 1].0 == pooled[i].0 {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        if t > 1.0 {
            has_ties = true;
            tie_term += t * t * t - t;
        }
        let midrank = (i + j + 2) as f64 / 2.0; // 1-based average rank
        for item in &pooled[i..=j] {
            if item.1 {
                rank_sum_a += midrank;
            }
        }
        i = j + 1;
    }
    (rank_sum_a, tie_term, has_ties)
}

/// P(U >= u) under the exact tie-free null distribution. Every
/// interleaving of the two samples is equally likely; a first-sample
/// element placed after j second-sample elements contributes j to U.
fn exact_p_greater(u: usize, n1: usize, n2: usize) -> f64 {
    let max_u = n1 * n2;
    if u > max_u {
        return 0.0;
    }
    // dp[i][j][v]: interleavings using i first-sample and j second-sample
    // elements with partial statistic v
    let mut dp = vec![vec![vec![0.0f64; max_u + 1]; n2 + 1]; n1 + 1];
    dp[0][0][0] = 1.0;
    for i in 0..=n1 {
        for j in 0..=n2 {
            for v in 0..=max_u {
                let c = dp[i][j][v];
                if c == 0.0 {
                    continue;
                }
                if i < n1 && v + j <= max_u {
                    dp[i + 1][j][v + j] += c;
                }
                if j < n2 {
                    dp[i][j + 1][v] += c;
                }
            }
        }
    }
    let dist = &dp[n1][n2];
    let total: f64 = dist.iter().sum();
    let favorable: f64 = dist[u..].iter().sum();
    favorable / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapiro_labels_regular_samples() {
        // Near-normal sample: p should comfortably exceed 0.05
        let xs = [10.0, 12.0, 11.0, 13.0, 14.0];
        let out = shapiro_wilk(&xs).unwrap();
        assert!(out.statistic > 0.9 && out.statistic <= 1.0);
        assert!(out.p_value > 0.05);
    }

    #[test]
    fn shapiro_handles_larger_samples() {
        let xs = [
            2.1, 3.4, 1.9, 2.8, 3.1, 2.5, 2.9, 3.3, 2.2, 2.7, 3.0, 2.6, 2.4, 3.2,
        ];
        let out = shapiro_wilk(&xs).unwrap();
        assert!(out.p_value > 0.05);
    }

    #[test]
    fn shapiro_rejects_degenerate_input() {
        assert!(shapiro_wilk(&[5.0, 5.0, 5.0, 5.0, 5.0]).is_err());
        assert!(shapiro_wilk(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn levene_on_identical_groups_is_equal_variances() {
        let xs = [10.0, 12.0, 11.0, 13.0, 14.0];
        let out = levene_median(&xs, &xs).unwrap();
        assert!(out.p_value >= 0.05);
    }

    #[test]
    fn levene_detects_gross_variance_difference() {
        let tight = [10.0, 10.1, 9.9, 10.0, 10.05, 9.95, 10.02, 9.98];
        let wide = [1.0, 19.0, 3.0, 17.0, 5.0, 15.0, 2.0, 18.0];
        let out = levene_median(&tight, &wide).unwrap();
        assert!(out.p_value < 0.05);
    }

    #[test]
    fn exact_null_distribution_sums_to_one() {
        // P(U >= 0) covers the whole distribution
        assert!((exact_p_greater(0, 5, 5) - 1.0).abs() < 1e-12);
        // Single most extreme arrangement out of C(10,5)
        assert!((exact_p_greater(25, 5, 5) - 1.0 / 252.0).abs() < 1e-12);
    }

    #[test]
    fn mann_whitney_exact_p_for_separated_samples() {
        let slow = [10.0, 11.0, 12.0, 13.0, 14.0];
        let fast = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = mann_whitney_greater(&slow, &fast).unwrap();
        assert_eq!(out.statistic, 25.0);
        assert!((out.p_value - 1.0 / 252.0).abs() < 1e-12);

        // The unfavorable direction is certain: P(U >= 0) = 1
        let reversed = mann_whitney_greater(&fast, &slow).unwrap();
        assert_eq!(reversed.statistic, 0.0);
        assert!((reversed.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mann_whitney_identical_samples_not_significant() {
        let xs = [5.0, 5.0, 5.0, 5.0, 5.0];
        let out = mann_whitney_greater(&xs, &xs).unwrap();
        assert!(out.p_value >= 0.05);
    }

    #[test]
    fn mann_whitney_rejects_tiny_samples() {
        assert!(mann_whitney_greater(&[1.0, 2.0], &[3.0, 4.0, 5.0]).is_err());
    }
}
