// Spend-response regression

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::series::ObservedSeries;

/// Fitted linear relationship `net_new ≈ intercept + slope × spend`
///
/// Diagnostics are informational only; the coefficients are used as-is
/// whatever the fit quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpendResponseModel {
    pub intercept: f64,
    pub slope: f64,
    /// Coefficient of determination, undefined for a constant response
    pub r_squared: Option<f64>,
    /// Number of observations used in the fit
    pub n_obs: usize,
}

impl SpendResponseModel {
    /// Model from known coefficients, without fit diagnostics
    pub fn from_coefficients(intercept: f64, slope: f64) -> Self {
        SpendResponseModel {
            intercept,
            slope,
            r_squared: None,
            n_obs: 0,
        }
    }

    /// Estimated net-new at a given spend
    pub fn predict(&self, spend: f64) -> f64 {
        self.intercept + self.slope * spend
    }

    /// Whether more spend is predicted to raise net-new
    pub fn spend_helps(&self) -> bool {
        self.slope > 0.0
    }
}

/// Ordinary least squares of net-new on marketing spend
#[derive(Debug, Clone, Copy, Default)]
pub struct SpendResponseEstimator;

impl SpendResponseEstimator {
    pub fn new() -> Self {
        SpendResponseEstimator
    }

    /// Fit from the `(marketing_spend, net_new)` pairs of a series
    pub fn fit(&self, series: &ObservedSeries) -> Result<SpendResponseModel> {
        self.fit_pairs(&series.marketing_spend(), &series.net_new())
    }

    /// Fit from raw spend and outcome columns
    pub fn fit_pairs(&self, spend: &[f64], net_new: &[f64]) -> Result<SpendResponseModel> {
        if spend.len() != net_new.len() {
            return Err(Error::InvalidInput(format!(
                "spend and net_new lengths differ: {} vs {}",
                spend.len(),
                net_new.len()
            )));
        }
        let n = spend.len();
        if n < 2 {
            return Err(Error::ModelFit(format!(
                "spend regression needs at least 2 observations, got {}",
                n
            )));
        }
        if spend.iter().chain(net_new).any(|v| !v.is_finite()) {
            return Err(Error::ModelFit(
                "spend regression over non-finite values".to_string(),
            ));
        }
        if count_distinct(spend) < 2 {
            return Err(Error::ModelFit(
                "spend regression needs at least 2 distinct spend values".to_string(),
            ));
        }

        // Center the predictor so X^T X stays well conditioned for large spends
        let spend_mean = spend.iter().sum::<f64>() / n as f64;
        let x_matrix = vec![
            vec![1.0; n],
            spend.iter().map(|s| s - spend_mean).collect::<Vec<f64>>(),
        ];

        let xt_x = matrix_multiply_transpose(&x_matrix, &x_matrix);
        let xt_x_inv = matrix_inverse(&xt_x).map_err(|e| Error::ModelFit(e.to_string()))?;
        let xt_y = vec_multiply_transpose(&x_matrix, net_new);

        // β = (X^T X)^-1 X^T y
        let coefficients: Vec<f64> = xt_x_inv
            .iter()
            .map(|row| row.iter().zip(&xt_y).map(|(a, b)| a * b).sum())
            .collect();

        let slope = coefficients[1];
        let intercept = coefficients[0] - slope * spend_mean;

        let y_mean = net_new.iter().sum::<f64>() / n as f64;
        let ss_total: f64 = net_new.iter().map(|&y| (y - y_mean).powi(2)).sum();
        let ss_residual: f64 = spend
            .iter()
            .zip(net_new)
            .map(|(&x, &y)| (y - (intercept + slope * x)).powi(2))
            .sum();
        let r_squared = if ss_total > 0.0 {
            Some(1.0 - ss_residual / ss_total)
        } else {
            None
        };

        log::info!(
            "Regression fit: net_new = {:.2} + {:.4} * spend",
            intercept,
            slope
        );

        Ok(SpendResponseModel {
            intercept,
            slope,
            r_squared,
            n_obs: n,
        })
    }
}

fn count_distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted.dedup();
    sorted.len()
}

/// Transposed product A^T * B, both stored column-major
fn matrix_multiply_transpose(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.len();
    let m = b.len();

    let mut result = vec![vec![0.0; m]; n];
    for i in 0..n {
        for j in 0..m {
            result[i][j] = a[i].iter().zip(&b[j]).map(|(x, y)| x * y).sum();
        }
    }
    result
}

/// Transposed product A^T * y
fn vec_multiply_transpose(a: &[Vec<f64>], y: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|col| col.iter().zip(y).map(|(x, v)| x * v).sum())
        .collect()
}

/// Gauss-Jordan inverse with partial pivoting
fn matrix_inverse(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();

    if n == 0 {
        return Err(Error::InvalidInput("matrix is empty".into()));
    }
    if matrix.iter().any(|row| row.len() != n) {
        return Err(Error::InvalidInput("matrix must be square".into()));
    }

    // Augmented matrix [A|I]
    let mut augmented: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut aug = row.clone();
            aug.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            aug
        })
        .collect();

    for i in 0..n {
        let mut max_row = i;
        let mut max_val = augmented[i][i].abs();
        for j in i + 1..n {
            let abs_val = augmented[j][i].abs();
            if abs_val > max_val {
                max_row = j;
                max_val = abs_val;
            }
        }

        if max_val < 1e-10 {
            return Err(Error::ComputationError(
                "matrix is singular (no inverse exists)".into(),
            ));
        }

        if max_row != i {
            augmented.swap(i, max_row);
        }

        let pivot = augmented[i][i];
        for value in augmented[i].iter_mut() {
            *value /= pivot;
        }

        for j in 0..n {
            if j != i {
                let factor = augmented[j][i];
                for k in 0..2 * n {
                    augmented[j][k] -= factor * augmented[i][k];
                }
            }
        }
    }

    Ok(augmented.into_iter().map(|row| row[n..].to_vec()).collect())
}
