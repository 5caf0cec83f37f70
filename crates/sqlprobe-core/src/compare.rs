//! Statistical comparison of baseline vs. rewritten run sets.

use crate::model::Measure;
use crate::stats;
use anyhow::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normality {
    Normal,
    NotNormal,
    /// The test was undefined for the sample (zero range).
    Unknown,
}

impl fmt::Display for Normality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Normality::Normal => "normal",
            Normality::NotNormal => "not normal",
            Normality::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarianceEquality {
    Equal,
    Unequal,
}

impl fmt::Display for VarianceEquality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VarianceEquality::Equal => "equal variances",
            VarianceEquality::Unequal => "unequal variances",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Significant,
    NotSignificant,
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Significance::Significant => "significant",
            Significance::NotSignificant => "not significant",
        })
    }
}

/// One side of a comparison: the raw timing samples plus the aggregates
/// already computed by the experiment runner.
#[derive(Debug, Clone)]
pub struct RunSetSide {
    pub times: Vec<f64>,
    pub avg_time: Measure<f64>,
    pub median_time: Measure<f64>,
    pub avg_cost: Measure<f64>,
    pub avg_rows: Measure<f64>,
}

/// Everything downstream consumers read per pair. The significance
/// verdict is the authoritative signal that a rewrite is reliably
/// faster; the normality labels are informational only and gate nothing.
#[derive(Debug, Clone)]
pub struct ComparisonVerdict {
    pub normality_baseline: Normality,
    pub normality_rewritten: Normality,
    pub variance_baseline: f64,
    pub variance_rewritten: f64,
    pub variance_equality: VarianceEquality,
    pub significance: Significance,
    pub p_value: f64,
    /// Signed rewritten-minus-baseline deltas; negative means improvement.
    pub avg_time_delta: Measure<f64>,
    pub median_time_delta: Measure<f64>,
    pub avg_cost_delta: Measure<f64>,
    pub avg_rows_delta: Measure<f64>,
}

/// Runs the full battery on one baseline/rewritten pair. Requires at
/// least 3 timing samples per side; with the default 5 the tests sit at
/// the low end of their valid range, which is accepted as a power
/// limitation rather than compensated for.
pub fn compare_run_sets(baseline: &RunSetSide, rewritten: &RunSetSide) -> Result<ComparisonVerdict> {
    let normality_baseline = normality(&baseline.times);
    let normality_rewritten = normality(&rewritten.times);

    let variance_baseline = stats::sample_variance(&baseline.times);
    let variance_rewritten = stats::sample_variance(&rewritten.times);

    let levene = stats::levene_median(&baseline.times, &rewritten.times)?;
    let variance_equality = if levene.p_value >= 0.05 {
        VarianceEquality::Equal
    } else {
        VarianceEquality::Unequal
    };

    // One-sided: baseline stochastically greater, i.e. rewritten faster.
    let mwu = stats::mann_whitney_greater(&baseline.times, &rewritten.times)?;
    let significance = if mwu.p_value < 0.05 {
        Significance::Significant
    } else {
        Significance::NotSignificant
    };

    Ok(ComparisonVerdict {
        normality_baseline,
        normality_rewritten,
        variance_baseline,
        variance_rewritten,
        variance_equality,
        significance,
        p_value: mwu.p_value,
        avg_time_delta: delta(&rewritten.avg_time, &baseline.avg_time),
        median_time_delta: delta(&rewritten.median_time, &baseline.median_time),
        avg_cost_delta: delta(&rewritten.avg_cost, &baseline.avg_cost),
        avg_rows_delta: delta(&rewritten.avg_rows, &baseline.avg_rows),
    })
}

fn normality(times: &[f64]) -> Normality {
    match stats::shapiro_wilk(times) {
        Ok(out) if out.p_value > 0.05 => Normality::Normal,
        Ok(_) => Normality::NotNormal,
        Err(_) => Normality::Unknown,
    }
}

fn delta(rewritten: &Measure<f64>, baseline: &Measure<f64>) -> Measure<f64> {
    match (rewritten.value(), baseline.value()) {
        (Some(r), Some(b)) => Measure::Value(r - b),
        _ => Measure::Failed,
    }
}
