mod common;

use std::f64::consts::PI;

use chrono::NaiveDate;
use common::{monthly_history, seasonal_history, short_history};
use netnew_forecast::time_series::ResidualMethod;
use netnew_forecast::{forecast_series, ModelVariant, PipelineConfig};

fn seeded_config(seed: u64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.simulation.seed = Some(seed);
    config
}

#[test]
fn test_three_years_uses_seasonal_path() {
    let series = seasonal_history(36);
    let output = forecast_series(&series, &seeded_config(1)).unwrap();

    assert_eq!(output.residuals.method, ResidualMethod::Decomposition);
    assert_eq!(output.residuals.residuals.len(), 36 - 12);
    assert!(!output.report.insufficient_history);
    assert_eq!(output.report.variant, ModelVariant::Seasonal);
    assert_eq!(output.report.horizon, 12);
    assert!(output.report.parameters.contains_key("gamma"));

    // forecasts start the month after the last observation
    assert_eq!(
        output.forecast.period_dates()[0],
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    );
    assert_eq!(
        output.forecast.period_dates()[11],
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    );
}

#[test]
fn test_linear_plus_sine_uses_seasonal_path() {
    // 80 + 2t + 15 sin(2*pi*t/12), flat spend
    let series = monthly_history(36, |t| {
        let tf = t as f64;
        (80.0 + 2.0 * tf + 15.0 * (2.0 * PI * tf / 12.0).sin(), 1000.0)
    });
    let output = forecast_series(&series, &seeded_config(11)).unwrap();

    assert_eq!(output.residuals.method, ResidualMethod::Decomposition);
    assert_eq!(output.residuals.residuals.len(), 24);
    assert_eq!(output.report.variant, ModelVariant::Seasonal);
    assert_eq!(output.report.horizon, 12);
    assert_eq!(output.forecast.horizon(), 12);
    assert!(output.forecast.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_ten_months_falls_back() {
    let series = short_history(10);
    let output = forecast_series(&series, &seeded_config(2)).unwrap();

    assert!(output.report.insufficient_history);
    assert_eq!(output.residuals.method, ResidualMethod::MeanDeviation);
    assert_eq!(output.residuals.residuals.len(), 10);
    assert_eq!(output.report.variant, ModelVariant::TrendOnly);
    assert_eq!(output.forecast.horizon(), 10);
    assert_eq!(output.simulation.rows(), 10);
}

#[test]
fn test_horizon_is_capped_at_one_season() {
    for (n, expected) in [(12, 12), (13, 12), (23, 12), (24, 12), (5, 5)] {
        let series = short_history(n);
        let output = forecast_series(&series, &seeded_config(3)).unwrap();
        assert_eq!(output.forecast.horizon(), expected, "n_obs = {}", n);
    }
}

#[test]
fn test_two_seasons_is_the_threshold() {
    let below = forecast_series(&seasonal_history(23), &seeded_config(4)).unwrap();
    assert_eq!(below.report.variant, ModelVariant::TrendOnly);
    assert_eq!(below.residuals.residuals.len(), 23);

    let at = forecast_series(&seasonal_history(24), &seeded_config(4)).unwrap();
    assert_eq!(at.report.variant, ModelVariant::Seasonal);
    assert_eq!(at.residuals.residuals.len(), 12);
}

#[test]
fn test_simulation_matrix_centered_on_forecast() {
    let series = seasonal_history(36);
    let output = forecast_series(&series, &seeded_config(5)).unwrap();
    let matrix = &output.simulation;

    assert_eq!(matrix.rows(), 12);
    assert_eq!(matrix.n_draws(), 1000);
    assert_eq!(matrix.period_dates(), output.forecast.period_dates().as_slice());

    let tolerance = 5.0 * output.residuals.resid_std / (1000f64).sqrt() + 1e-9;
    for (i, point) in output.forecast.values().iter().enumerate() {
        let row_mean = matrix.row_mean(i).unwrap();
        assert!(
            (row_mean - point).abs() <= tolerance,
            "row {} mean {} vs forecast {}",
            i,
            row_mean,
            point
        );
    }
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let series = short_history(15);
    let a = forecast_series(&series, &seeded_config(99)).unwrap();
    let b = forecast_series(&series, &seeded_config(99)).unwrap();
    assert_eq!(a.forecast, b.forecast);
    assert_eq!(a.simulation, b.simulation);
}

#[test]
fn test_draw_count_follows_config() {
    let mut config = seeded_config(6);
    config.simulation.draws = 64;
    let output = forecast_series(&short_history(8), &config).unwrap();
    assert_eq!(output.simulation.n_draws(), 64);
    assert_eq!(output.report.draws, 64);
}
