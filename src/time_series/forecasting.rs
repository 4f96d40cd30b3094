//! Point forecasts for the monthly net-new series
//!
//! Chooses between a seasonal Holt-Winters model and a trend-only Holt model
//! depending on how much history is available, fits it, and labels the
//! forecasts with the months that follow the last observation.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::series::ObservedSeries;
use crate::temporal::{monthly_range, next_month_start};
use crate::time_series::smoothing::{ExponentialSmoothing, Forecaster, SmoothingFit};
use crate::time_series::SEASONAL_PERIODS;

/// Model form selected for a history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Additive trend, multiplicative seasonality
    Seasonal,
    /// Additive trend only
    TrendOnly,
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVariant::Seasonal => write!(f, "Seasonal"),
            ModelVariant::TrendOnly => write!(f, "TrendOnly"),
        }
    }
}

/// One forecast period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub period_date: NaiveDate,
    pub forecast_net_new: f64,
}

/// Forecasts for consecutive future months
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointForecast {
    points: Vec<ForecastPoint>,
}

impl PointForecast {
    /// Wrap forecast points; dates must be strictly increasing and values finite
    pub fn new(points: Vec<ForecastPoint>) -> Result<Self> {
        for pair in points.windows(2) {
            if pair[1].period_date <= pair[0].period_date {
                return Err(Error::MissingData(format!(
                    "forecast periods out of order: {} follows {}",
                    pair[1].period_date, pair[0].period_date
                )));
            }
        }
        if let Some(bad) = points.iter().find(|p| !p.forecast_net_new.is_finite()) {
            return Err(Error::MissingData(format!(
                "non-finite forecast for {}",
                bad.period_date
            )));
        }
        Ok(PointForecast { points })
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Number of forecast periods
    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn period_dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.period_date).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.forecast_net_new).collect()
    }
}

/// Chooses, fits and runs the smoothing model for a history
#[derive(Debug, Clone)]
pub struct ForecastModel {
    seasonal_periods: usize,
}

impl Default for ForecastModel {
    fn default() -> Self {
        ForecastModel::new(SEASONAL_PERIODS)
    }
}

impl ForecastModel {
    pub fn new(seasonal_periods: usize) -> Self {
        ForecastModel { seasonal_periods }
    }

    pub fn seasonal_periods(&self) -> usize {
        self.seasonal_periods
    }

    /// Forecast horizon: one season, or the history length if shorter
    pub fn horizon(&self, n_obs: usize) -> usize {
        if n_obs >= self.seasonal_periods {
            self.seasonal_periods
        } else {
            n_obs
        }
    }

    /// Seasonal model once two full seasons are available
    pub fn variant_for(&self, n_obs: usize) -> ModelVariant {
        if self.seasonal_periods >= 2 && n_obs >= 2 * self.seasonal_periods {
            ModelVariant::Seasonal
        } else {
            ModelVariant::TrendOnly
        }
    }

    /// Fit the model selected for `series`
    pub fn fit(&self, series: &ObservedSeries) -> Result<FittedForecastModel> {
        let values = series.net_new();
        let n_obs = values.len();
        let variant = self.variant_for(n_obs);

        let mut smoother = match variant {
            ModelVariant::Seasonal => {
                log::info!(
                    "Fitting ETS model with additive trend and multiplicative seasonality."
                );
                ExponentialSmoothing::holt_winters(self.seasonal_periods)
            }
            ModelVariant::TrendOnly => {
                log::warn!(
                    "Insufficient history for seasonal smoothing (need >={}, got {}); fitting additive trend only.",
                    2 * self.seasonal_periods,
                    n_obs
                );
                ExponentialSmoothing::holt()
            }
        };
        smoother.fit(&values)?;
        log::info!("ETS model fitted.");

        Ok(FittedForecastModel {
            variant,
            horizon: self.horizon(n_obs),
            last_period: series.last_period(),
            smoother,
        })
    }

    /// Fit and forecast in one step
    pub fn forecast(&self, series: &ObservedSeries) -> Result<PointForecast> {
        self.fit(series)?.point_forecast()
    }
}

/// A fitted model together with the labels for its forecasts
#[derive(Debug, Clone)]
pub struct FittedForecastModel {
    variant: ModelVariant,
    horizon: usize,
    last_period: NaiveDate,
    smoother: ExponentialSmoothing,
}

impl FittedForecastModel {
    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn model_name(&self) -> &str {
        self.smoother.name()
    }

    /// Coefficients and fit diagnostics
    pub fn summary(&self) -> Option<&SmoothingFit> {
        self.smoother.fitted()
    }

    pub fn parameters(&self) -> HashMap<String, f64> {
        self.smoother.parameters()
    }

    /// Forecasts for the months following the last observation
    pub fn point_forecast(&self) -> Result<PointForecast> {
        let values = self.smoother.forecast(self.horizon)?;
        let dates = monthly_range(next_month_start(self.last_period), self.horizon);
        let points = dates
            .into_iter()
            .zip(values)
            .map(|(period_date, forecast_net_new)| ForecastPoint {
                period_date,
                forecast_net_new,
            })
            .collect();
        PointForecast::new(points).map_err(|e| Error::ModelFit(e.to_string()))
    }
}
