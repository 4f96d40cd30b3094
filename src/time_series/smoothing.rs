//! Exponential smoothing models
//!
//! Holt's linear trend and Holt-Winters seasonal smoothing. Smoothing
//! coefficients and the initial level and trend are estimated together by
//! minimizing the in-sample one-step-ahead squared error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats::descriptive::{mean, std_dev};
use crate::time_series::optimizer::{nelder_mead, NelderMeadConfig};

/// Common interface of the forecasting models
pub trait Forecaster {
    /// Estimate the model from an evenly spaced series
    fn fit(&mut self, values: &[f64]) -> Result<()>;

    /// Point forecasts for the next `periods` steps
    fn forecast(&self, periods: usize) -> Result<Vec<f64>>;

    /// Model name
    fn name(&self) -> &str;

    /// Fitted coefficients by name
    fn parameters(&self) -> HashMap<String, f64>;
}

/// Seasonal term of the model; the trend is always additive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonalComponent {
    None,
    Multiplicative,
}

/// Estimated state and diagnostics of a fitted model
#[derive(Debug, Clone, Serialize)]
pub struct SmoothingFit {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: Option<f64>,
    pub initial_level: f64,
    pub initial_trend: f64,
    /// Level after the last observation
    pub level: f64,
    /// Trend after the last observation
    pub trend: f64,
    /// Seasonal state, indexed by position in the cycle
    pub seasonals: Vec<f64>,
    #[serde(skip)]
    pub fitted_values: Vec<f64>,
    /// In-sample sum of squared one-step errors
    pub sse: f64,
    /// Undefined for a perfect fit
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub n_obs: usize,
    /// Simplex iterations used by the search
    pub iterations: usize,
}

/// Holt / Holt-Winters exponential smoothing
#[derive(Debug, Clone)]
pub struct ExponentialSmoothing {
    seasonal: SeasonalComponent,
    seasonal_period: usize,
    search: NelderMeadConfig,
    fit: Option<SmoothingFit>,
}

impl ExponentialSmoothing {
    pub fn new(seasonal: SeasonalComponent, seasonal_period: usize) -> Self {
        ExponentialSmoothing {
            seasonal,
            seasonal_period,
            search: NelderMeadConfig::default(),
            fit: None,
        }
    }

    /// Holt's linear trend method
    pub fn holt() -> Self {
        Self::new(SeasonalComponent::None, 1)
    }

    /// Additive trend with multiplicative seasonality
    pub fn holt_winters(seasonal_period: usize) -> Self {
        Self::new(SeasonalComponent::Multiplicative, seasonal_period)
    }

    /// Override the simplex search settings
    pub fn with_search(mut self, search: NelderMeadConfig) -> Self {
        self.search = search;
        self
    }

    pub fn seasonal(&self) -> SeasonalComponent {
        self.seasonal
    }

    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Result of the last successful fit
    pub fn fitted(&self) -> Option<&SmoothingFit> {
        self.fit.as_ref()
    }

    fn has_seasonal(&self) -> bool {
        self.seasonal != SeasonalComponent::None
    }

    fn validate(&self, values: &[f64]) -> Result<()> {
        let n = values.len();
        if n < 2 {
            return Err(Error::ModelFit(format!(
                "exponential smoothing needs at least 2 observations, got {}",
                n
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::ModelFit(
                "exponential smoothing over non-finite values".to_string(),
            ));
        }
        if std_dev(values) == 0.0 {
            return Err(Error::ModelFit(
                "series has zero variance; nothing to smooth".to_string(),
            ));
        }
        if self.has_seasonal() {
            let period = self.seasonal_period;
            if period < 2 {
                return Err(Error::ModelFit(format!(
                    "seasonal period must be at least 2, got {}",
                    period
                )));
            }
            if n < 2 * period {
                return Err(Error::ModelFit(format!(
                    "seasonal smoothing needs at least {} observations, got {}",
                    2 * period,
                    n
                )));
            }
        }
        if self.has_seasonal() && values.iter().any(|&v| v <= 0.0) {
            return Err(Error::ModelFit(
                "multiplicative seasonality is not appropriate for zero or negative values"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Starting state: level, trend and seasonal indices
    fn initial_state(&self, values: &[f64]) -> (f64, f64, Vec<f64>) {
        if !self.has_seasonal() {
            let trend = values[1] - values[0];
            // level before the first observation
            return (values[0] - trend, trend, Vec::new());
        }

        let period = self.seasonal_period;
        let first = &values[..period];
        let first_mean = mean(first);
        let seasonals = first.iter().map(|v| v / first_mean).collect();
        let trend = (mean(&values[period..2 * period]) - first_mean) / period as f64;
        (first_mean, trend, seasonals)
    }

    /// Layout of the search vector: alpha, beta, [gamma], l0, b0
    fn unpack(&self, params: &[f64]) -> Coefficients {
        let mut it = params.iter().copied();
        let alpha = it.next().unwrap_or(0.0);
        let beta = it.next().unwrap_or(0.0);
        let gamma = if self.has_seasonal() { it.next() } else { None };
        let level = it.next().unwrap_or(0.0);
        let trend = it.next().unwrap_or(0.0);
        Coefficients {
            alpha,
            beta,
            gamma,
            level,
            trend,
        }
    }

    /// Run the recursions over `values`
    fn filter(&self, values: &[f64], coef: &Coefficients, seasonals: &[f64]) -> FilterState {
        let period = self.seasonal_period.max(1);
        let alpha = coef.alpha;
        let beta = coef.beta;
        let gamma = coef.gamma.unwrap_or(0.0);

        let mut level = coef.level;
        let mut trend = coef.trend;
        let mut season = seasonals.to_vec();
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let base = level + trend;
            let (y_hat, new_level) = match self.seasonal {
                SeasonalComponent::None => (base, alpha * y + (1.0 - alpha) * base),
                SeasonalComponent::Multiplicative => {
                    let s = season[t % period];
                    let deseasonalized = if s.abs() > 1e-10 { y / s } else { y };
                    (base * s, alpha * deseasonalized + (1.0 - alpha) * base)
                }
            };

            let err = y - y_hat;
            sse += err * err;
            fitted.push(y_hat);

            trend = beta * (new_level - level) + (1.0 - beta) * trend;

            if self.has_seasonal() && new_level.abs() > 1e-10 {
                let pos = t % period;
                season[pos] = gamma * (y / new_level) + (1.0 - gamma) * season[pos];
            }

            level = new_level;
        }

        FilterState {
            level,
            trend,
            seasonals: season,
            fitted,
            sse,
        }
    }

    fn n_estimated(&self) -> usize {
        // alpha, beta, l0, b0
        let mut k = 4;
        if self.has_seasonal() {
            k += 1;
        }
        k
    }
}

struct Coefficients {
    alpha: f64,
    beta: f64,
    gamma: Option<f64>,
    level: f64,
    trend: f64,
}

struct FilterState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

impl Forecaster for ExponentialSmoothing {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        self.validate(values)?;

        let (l0, b0, seasonals) = self.initial_state(values);

        let mut start = vec![0.5, 0.1];
        let mut bounds = vec![(0.0, 1.0), (0.0, 1.0)];
        if self.has_seasonal() {
            start.push(0.1);
            bounds.push((0.0, 1.0));
        }
        start.push(l0);
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
        start.push(b0);
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));

        let objective = |params: &[f64]| {
            let coef = self.unpack(params);
            self.filter(values, &coef, &seasonals).sse
        };
        let result = nelder_mead(objective, &start, &bounds, self.search);

        if !result.converged {
            return Err(Error::ModelFit(format!(
                "{} did not converge after {} iterations",
                self.name(),
                result.iterations
            )));
        }
        if !result.optimal_value.is_finite() {
            return Err(Error::ModelFit(format!(
                "{} produced a non-finite error sum",
                self.name()
            )));
        }

        let coef = self.unpack(&result.optimal_point);
        let state = self.filter(values, &coef, &seasonals);

        let n = values.len();
        let k = self.n_estimated() as f64;
        let (aic, bic) = if state.sse > 0.0 {
            let log_term = n as f64 * (state.sse / n as f64).ln();
            (
                Some(log_term + 2.0 * k),
                Some(log_term + k * (n as f64).ln()),
            )
        } else {
            (None, None)
        };

        log::debug!(
            "{} fitted: alpha={:.4} beta={:.4} gamma={:?} sse={:.4} ({} iterations)",
            self.name(),
            coef.alpha,
            coef.beta,
            coef.gamma,
            state.sse,
            result.iterations
        );

        self.fit = Some(SmoothingFit {
            alpha: coef.alpha,
            beta: coef.beta,
            gamma: coef.gamma,
            initial_level: coef.level,
            initial_trend: coef.trend,
            level: state.level,
            trend: state.trend,
            seasonals: state.seasonals,
            fitted_values: state.fitted,
            sse: state.sse,
            aic,
            bic,
            n_obs: n,
            iterations: result.iterations,
        });
        Ok(())
    }

    fn forecast(&self, periods: usize) -> Result<Vec<f64>> {
        let fit = self.fit.as_ref().ok_or_else(|| {
            Error::InvalidInput(format!("{} must be fitted before forecasting", self.name()))
        })?;

        let period = self.seasonal_period.max(1);
        let last = fit.n_obs - 1;
        let points = (1..=periods)
            .map(|k| {
                let base = fit.level + k as f64 * fit.trend;
                match self.seasonal {
                    SeasonalComponent::None => base,
                    SeasonalComponent::Multiplicative => base * fit.seasonals[(last + k) % period],
                }
            })
            .collect();
        Ok(points)
    }

    fn name(&self) -> &str {
        match self.seasonal {
            SeasonalComponent::None => "HoltLinear",
            SeasonalComponent::Multiplicative => "HoltWinters",
        }
    }

    fn parameters(&self) -> HashMap<String, f64> {
        let mut params = HashMap::new();
        if let Some(fit) = &self.fit {
            params.insert("alpha".to_string(), fit.alpha);
            params.insert("beta".to_string(), fit.beta);
            if let Some(gamma) = fit.gamma {
                params.insert("gamma".to_string(), gamma);
            }
            params.insert("initial_level".to_string(), fit.initial_level);
            params.insert("initial_trend".to_string(), fit.initial_trend);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let t = t as f64;
                (100.0 + 2.0 * t) * (1.0 + 0.2 * (2.0 * PI * t / 12.0).sin())
            })
            .collect()
    }

    #[test]
    fn test_holt_extends_exact_line() {
        let values: Vec<f64> = (0..10).map(|t| 10.0 + 2.0 * t as f64).collect();
        let mut model = ExponentialSmoothing::holt();
        model.fit(&values).unwrap();

        let forecast = model.forecast(3).unwrap();
        assert!((forecast[0] - 30.0).abs() < 1e-4);
        assert!((forecast[2] - 34.0).abs() < 1e-4);

        let fit = model.fitted().unwrap();
        assert!(fit.sse < 1e-8);
        assert!((0.0..=1.0).contains(&fit.alpha));
        assert!((0.0..=1.0).contains(&fit.beta));
        assert!(fit.gamma.is_none());
    }

    #[test]
    fn test_holt_winters_tracks_seasonal_pattern() {
        let values = seasonal_series(36);
        let mut model = ExponentialSmoothing::holt_winters(12);
        model.fit(&values).unwrap();

        let forecast = model.forecast(12).unwrap();
        let truth: Vec<f64> = seasonal_series(48)[36..].to_vec();
        for (f, t) in forecast.iter().zip(&truth) {
            assert!((f - t).abs() / t < 0.15, "forecast {} vs {}", f, t);
        }

        let fit = model.fitted().unwrap();
        assert_eq!(fit.seasonals.len(), 12);
        assert!(fit.gamma.is_some());
        assert!(fit.aic.is_some());
        assert_eq!(model.name(), "HoltWinters");
        assert!(model.parameters().contains_key("gamma"));
    }

    #[test]
    fn test_zero_variance_is_fit_failure() {
        let mut model = ExponentialSmoothing::holt();
        let result = model.fit(&[5.0; 8]);
        assert!(matches!(result, Err(Error::ModelFit(_))));
    }

    #[test]
    fn test_too_short_is_fit_failure() {
        let mut model = ExponentialSmoothing::holt();
        assert!(matches!(model.fit(&[5.0]), Err(Error::ModelFit(_))));

        let mut seasonal = ExponentialSmoothing::holt_winters(12);
        let short = seasonal_series(20);
        assert!(matches!(seasonal.fit(&short), Err(Error::ModelFit(_))));
    }

    #[test]
    fn test_multiplicative_rejects_non_positive() {
        let mut values = seasonal_series(24);
        values[3] = -1.0;
        let mut model = ExponentialSmoothing::holt_winters(12);
        assert!(matches!(model.fit(&values), Err(Error::ModelFit(_))));
    }

    #[test]
    fn test_non_finite_is_fit_failure() {
        let mut model = ExponentialSmoothing::holt();
        assert!(matches!(
            model.fit(&[1.0, f64::NAN, 3.0]),
            Err(Error::ModelFit(_))
        ));
    }

    #[test]
    fn test_forecast_before_fit() {
        let model = ExponentialSmoothing::holt();
        assert!(model.forecast(3).is_err());
        assert!(model.parameters().is_empty());
    }

    #[test]
    fn test_search_budget_exhaustion_is_fit_failure() {
        let values = seasonal_series(36);
        let mut model = ExponentialSmoothing::holt_winters(12).with_search(NelderMeadConfig {
            max_iter: 2,
            ..NelderMeadConfig::default()
        });
        assert!(matches!(model.fit(&values), Err(Error::ModelFit(_))));
    }

    #[test]
    fn test_model_forms() {
        let holt = ExponentialSmoothing::holt();
        assert_eq!(holt.seasonal(), SeasonalComponent::None);
        assert_eq!(holt.name(), "HoltLinear");

        let hw = ExponentialSmoothing::holt_winters(12);
        assert_eq!(hw.seasonal(), SeasonalComponent::Multiplicative);
        assert_eq!(hw.seasonal_period(), 12);
        assert_eq!(hw.name(), "HoltWinters");
    }

    #[test]
    fn test_holt_reports_trend_parameters() {
        let values: Vec<f64> = (0..12)
            .map(|t| 5.0 + 1.5 * t as f64 + if t % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let mut model = ExponentialSmoothing::holt();
        model.fit(&values).unwrap();

        let params = model.parameters();
        for key in ["alpha", "beta", "initial_level", "initial_trend"] {
            assert!(params.contains_key(key), "missing {}", key);
        }
        assert!(!params.contains_key("gamma"));
        // alpha, beta, l0, b0
        let fit = model.fitted().unwrap();
        let log_term = 12.0 * (fit.sse / 12.0).ln();
        assert!((fit.aic.unwrap() - (log_term + 8.0)).abs() < 1e-9);
    }
}
