// Descriptive statistics

use crate::error::{Error, Result};
use crate::stats::DescriptiveStats;

/// Arithmetic mean; NaN for an empty slice
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation with one degree of freedom removed
///
/// Returns 0 when fewer than two values are available.
pub fn std_dev(data: &[f64]) -> f64 {
    let count = data.len();
    if count < 2 {
        return 0.0;
    }
    let m = mean(data);
    let sum_squared_diff = data.iter().map(|&x| (x - m).powi(2)).sum::<f64>();
    (sum_squared_diff / (count - 1) as f64).sqrt()
}

/// Summary statistics, internal implementation
pub(crate) fn describe_impl(data: &[f64]) -> Result<DescriptiveStats> {
    if data.is_empty() {
        return Err(Error::InvalidInput(
            "summary statistics need at least one value".into(),
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::ComputationError(
            "summary statistics over non-finite values".into(),
        ));
    }

    let count = data.len();
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    Ok(DescriptiveStats {
        count,
        mean: mean(data),
        std: std_dev(data),
        min: sorted[0],
        p05: percentile(&sorted, 0.05),
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q3: percentile(&sorted, 0.75),
        p95: percentile(&sorted, 0.95),
        max: sorted[count - 1],
    })
}

/// Linearly interpolated percentile of already sorted data
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return f64::NAN;
    }

    let n = sorted_data.len();
    let idx = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let idx_floor = idx.floor() as usize;
    let idx_ceil = idx.ceil() as usize;

    if idx_floor == idx_ceil {
        return sorted_data[idx_floor];
    }

    let weight_ceil = idx - idx_floor as f64;
    let weight_floor = 1.0 - weight_ceil;

    sorted_data[idx_floor] * weight_floor + sorted_data[idx_ceil] * weight_ceil
}
