// Statistics used by the forecasting and allocation stages
//
// Descriptive summaries, the spend-response regression and random sampling.

pub mod descriptive;
pub mod regression;
pub mod sampling;

use crate::error::Result;

pub use descriptive::{mean, percentile, std_dev};
pub use regression::{SpendResponseEstimator, SpendResponseModel};
pub use sampling::{normal_draws, seeded_rng};

/// Compute summary statistics of a sample
///
/// # Example
/// ```rust
/// use netnew_forecast::stats;
///
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let summary = stats::describe(&data).unwrap();
/// assert_eq!(summary.median, 3.0);
/// ```
pub fn describe<T: AsRef<[f64]>>(data: T) -> Result<DescriptiveStats> {
    descriptive::describe_impl(data.as_ref())
}

/// Summary statistics of a sample
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    /// Number of values
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std: f64,
    pub min: f64,
    /// 5th percentile
    pub p05: f64,
    /// 25th percentile
    pub q1: f64,
    pub median: f64,
    /// 75th percentile
    pub q3: f64,
    /// 95th percentile
    pub p95: f64,
    pub max: f64,
}
