//! Classical seasonal decomposition
//!
//! Splits a series into trend, seasonal and residual components using a
//! centered moving average for the trend and per-position averages of the
//! detrended series for the seasonal indices. When the history is shorter
//! than two full seasons the decomposer falls back to deviations from the
//! mean, which is enough to estimate a residual spread.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::descriptive::{mean, std_dev};

/// How the components combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompositionModel {
    /// value = trend + seasonal + residual
    Additive,
    /// value = trend × seasonal × residual
    Multiplicative,
}

/// Output of a full decomposition
///
/// `trend` and `residual` are undefined (`None`) for the first and last
/// `period / 2` points.
#[derive(Debug, Clone)]
pub struct DecompositionResult {
    pub model: DecompositionModel,
    pub period: usize,
    pub trend: Vec<Option<f64>>,
    pub seasonal: Vec<f64>,
    pub residual: Vec<Option<f64>>,
}

impl DecompositionResult {
    /// Residuals with the undefined edges dropped
    pub fn defined_residuals(&self) -> Vec<f64> {
        self.residual.iter().filter_map(|r| *r).collect()
    }

    /// One seasonal index per position in the cycle
    pub fn seasonal_indices(&self) -> &[f64] {
        let len = self.period.min(self.seasonal.len());
        &self.seasonal[..len]
    }
}

/// Which estimate produced a residual series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidualMethod {
    /// Residual component of a seasonal decomposition
    Decomposition,
    /// Deviation of each observation from the series mean
    MeanDeviation,
}

/// Residual series and the spread consumed by the simulator
#[derive(Debug, Clone)]
pub struct ResidualSpread {
    pub method: ResidualMethod,
    pub residuals: Vec<f64>,
    /// Sample standard deviation of `residuals`
    pub resid_std: f64,
}

/// Seasonal decomposer with a short-history fallback
#[derive(Debug, Clone)]
pub struct TimeSeriesDecomposer {
    period: usize,
    model: DecompositionModel,
}

impl TimeSeriesDecomposer {
    pub fn new(period: usize, model: DecompositionModel) -> Self {
        TimeSeriesDecomposer { period, model }
    }

    /// Multiplicative decomposer, as used by the forecast stage
    pub fn multiplicative(period: usize) -> Self {
        Self::new(period, DecompositionModel::Multiplicative)
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn model(&self) -> DecompositionModel {
        self.model
    }

    /// Minimum number of observations for a seasonal decomposition
    pub fn min_observations(&self) -> usize {
        2 * self.period
    }

    /// Whether `n_obs` observations support a seasonal decomposition
    pub fn can_decompose(&self, n_obs: usize) -> bool {
        self.period >= 2 && n_obs >= self.min_observations()
    }

    /// Full decomposition; requires at least two complete seasons
    pub fn decompose(&self, values: &[f64]) -> Result<DecompositionResult> {
        let n = values.len();
        let period = self.period;

        if period < 2 {
            return Err(Error::InvalidInput(format!(
                "seasonal period must be at least 2, got {}",
                period
            )));
        }
        if n < 2 * period {
            return Err(Error::InvalidInput(format!(
                "seasonal decomposition needs at least {} observations, got {}",
                2 * period,
                n
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::ModelFit(
                "decomposition over non-finite values".to_string(),
            ));
        }
        if self.model == DecompositionModel::Multiplicative && values.iter().any(|&v| v <= 0.0) {
            return Err(Error::ModelFit(
                "multiplicative decomposition is not appropriate for zero or negative values"
                    .to_string(),
            ));
        }

        let trend = centered_moving_average(values, period);

        let detrended: Vec<Option<f64>> = values
            .iter()
            .zip(&trend)
            .map(|(&v, t)| {
                t.map(|t| match self.model {
                    DecompositionModel::Additive => v - t,
                    DecompositionModel::Multiplicative => v / t,
                })
            })
            .collect();

        // Average the detrended values at each position in the cycle
        let mut indices: Vec<f64> = (0..period)
            .map(|pos| {
                let at_pos: Vec<f64> = detrended
                    .iter()
                    .skip(pos)
                    .step_by(period)
                    .filter_map(|d| *d)
                    .collect();
                mean(&at_pos)
            })
            .collect();

        let index_mean = mean(&indices);
        match self.model {
            DecompositionModel::Additive => indices.iter_mut().for_each(|s| *s -= index_mean),
            DecompositionModel::Multiplicative => {
                if index_mean.abs() < 1e-12 {
                    return Err(Error::ModelFit(
                        "seasonal indices average to zero".to_string(),
                    ));
                }
                indices.iter_mut().for_each(|s| *s /= index_mean)
            }
        }

        let seasonal: Vec<f64> = (0..n).map(|i| indices[i % period]).collect();

        let residual: Vec<Option<f64>> = values
            .iter()
            .zip(&trend)
            .zip(&seasonal)
            .map(|((&v, t), &s)| {
                t.map(|t| match self.model {
                    DecompositionModel::Additive => v - t - s,
                    DecompositionModel::Multiplicative => v / (t * s),
                })
            })
            .collect();

        Ok(DecompositionResult {
            model: self.model,
            period,
            trend,
            seasonal,
            residual,
        })
    }

    /// Residual series and its spread, degrading to mean deviations for
    /// short histories
    pub fn residual_spread(&self, values: &[f64]) -> Result<ResidualSpread> {
        if values.is_empty() {
            return Err(Error::InvalidInput(
                "residual estimate needs at least one observation".to_string(),
            ));
        }

        let n_obs = values.len();
        let (method, residuals) = if self.can_decompose(n_obs) {
            let result = self.decompose(values)?;
            log::info!("Performed seasonal decomposition (trend, seasonal, residual).");
            (ResidualMethod::Decomposition, result.defined_residuals())
        } else {
            log::warn!(
                "Insufficient data for seasonal decomposition (need >={}, got {}); skipping.",
                self.min_observations(),
                n_obs
            );
            let m = mean(values);
            let residuals = values
                .iter()
                .map(|&v| {
                    let r = v - m;
                    if r.is_finite() {
                        r
                    } else {
                        0.0
                    }
                })
                .collect();
            (ResidualMethod::MeanDeviation, residuals)
        };

        let resid_std = std_dev(&residuals);
        log::debug!(
            "Residual spread from {:?}: {} residuals, std {:.4}",
            method,
            residuals.len(),
            resid_std
        );

        Ok(ResidualSpread {
            method,
            residuals,
            resid_std,
        })
    }
}

/// Centered moving average; `None` where the window runs off either edge
///
/// Even periods use the 2×p filter `[0.5, 1, …, 1, 0.5] / p`.
fn centered_moving_average(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = period / 2;
    let mut trend = vec![None; n];
    if n < 2 * half + 1 {
        return trend;
    }

    for i in half..n - half {
        let avg = if period % 2 == 0 {
            let inner: f64 = values[i + 1 - half..i + half].iter().sum();
            (0.5 * values[i - half] + inner + 0.5 * values[i + half]) / period as f64
        } else {
            values[i - half..=i + half].iter().sum::<f64>() / period as f64
        };
        trend[i] = Some(avg);
    }
    trend
}
