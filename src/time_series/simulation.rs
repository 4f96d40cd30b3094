//! Monte Carlo uncertainty around point forecasts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::describe;
use crate::stats::descriptive::mean;
use crate::stats::sampling::{normal_draws, seeded_rng};
use crate::time_series::forecasting::PointForecast;

/// Default number of draws per forecast period
pub const DEFAULT_DRAWS: usize = 1000;

/// How the residual spread applies across the horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadPolicy {
    /// Same spread for every period
    #[default]
    Constant,
    /// Spread grows with the square root of the step ahead
    HorizonScaled,
}

impl SpreadPolicy {
    /// Spread for the `step`-th period ahead (1-based)
    pub fn spread_at(&self, resid_std: f64, step: usize) -> f64 {
        match self {
            SpreadPolicy::Constant => resid_std,
            SpreadPolicy::HorizonScaled => resid_std * (step as f64).sqrt(),
        }
    }
}

/// Draws per forecast period; rows are periods, columns are draws
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationMatrix {
    dates: Vec<NaiveDate>,
    draws: Vec<Vec<f64>>,
}

impl SimulationMatrix {
    /// Every row must have the same number of draws
    pub fn new(dates: Vec<NaiveDate>, draws: Vec<Vec<f64>>) -> Result<Self> {
        if dates.len() != draws.len() {
            return Err(Error::InvalidInput(format!(
                "{} period dates for {} rows of draws",
                dates.len(),
                draws.len()
            )));
        }
        if let Some(first) = draws.first() {
            if draws.iter().any(|row| row.len() != first.len()) {
                return Err(Error::InvalidInput(
                    "simulation rows have differing draw counts".to_string(),
                ));
            }
        }
        Ok(SimulationMatrix { dates, draws })
    }

    pub fn period_dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> usize {
        self.draws.len()
    }

    pub fn n_draws(&self) -> usize {
        self.draws.first().map_or(0, |row| row.len())
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.draws.get(index).map(|row| row.as_slice())
    }

    /// Iterate `(period_date, draws)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[f64])> + '_ {
        self.dates
            .iter()
            .copied()
            .zip(self.draws.iter().map(|row| row.as_slice()))
    }

    pub fn row_mean(&self, index: usize) -> Option<f64> {
        self.row(index).map(mean)
    }

    /// Per-period summary of the draws
    pub fn summary(&self) -> Result<Vec<DrawSummary>> {
        self.iter()
            .map(|(period_date, row)| {
                let stats = describe(row)?;
                Ok(DrawSummary {
                    period_date,
                    mean: stats.mean,
                    std: stats.std,
                    p05: stats.p05,
                    p50: stats.median,
                    p95: stats.p95,
                })
            })
            .collect()
    }
}

/// Distribution summary for one forecast period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawSummary {
    pub period_date: NaiveDate,
    pub mean: f64,
    pub std: f64,
    pub p05: f64,
    pub p50: f64,
    pub p95: f64,
}

/// Draws normal deviations around each point forecast
#[derive(Debug, Clone)]
pub struct UncertaintySimulator {
    draws: usize,
    seed: Option<u64>,
    spread: SpreadPolicy,
}

impl Default for UncertaintySimulator {
    fn default() -> Self {
        UncertaintySimulator {
            draws: DEFAULT_DRAWS,
            seed: None,
            spread: SpreadPolicy::Constant,
        }
    }
}

impl UncertaintySimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    /// Fix the generator seed for reproducible output
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn spread(mut self, spread: SpreadPolicy) -> Self {
        self.spread = spread;
        self
    }

    pub fn draw_count(&self) -> usize {
        self.draws
    }

    /// One row of draws per forecast period
    pub fn simulate(&self, forecast: &PointForecast, resid_std: f64) -> Result<SimulationMatrix> {
        if self.draws == 0 {
            return Err(Error::InvalidInput(
                "simulation needs at least one draw per period".to_string(),
            ));
        }
        if !resid_std.is_finite() || resid_std < 0.0 {
            return Err(Error::InvalidInput(format!(
                "residual spread must be finite and non-negative, got {}",
                resid_std
            )));
        }

        let mut rng = seeded_rng(self.seed);
        let draws = forecast
            .points()
            .iter()
            .enumerate()
            .map(|(i, point)| {
                let sigma = self.spread.spread_at(resid_std, i + 1);
                normal_draws(&mut rng, point.forecast_net_new, sigma, self.draws)
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Simulated {} periods x {} draws (spread {:?}, resid_std {:.4})",
            draws.len(),
            self.draws,
            self.spread,
            resid_std
        );

        SimulationMatrix::new(forecast.period_dates(), draws)
    }
}
