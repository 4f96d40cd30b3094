mod common;

use common::{monthly_history, TempTestDir};
use netnew_forecast::temporal::monthly_range;
use netnew_forecast::time_series::{ForecastPoint, PointForecast};
use netnew_forecast::{
    optimise_series, BudgetAllocator, Error, PipelineConfig, SolveStatus, SpendResponseEstimator,
    SpendResponseModel,
};

fn twelve_periods() -> PointForecast {
    let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let points = monthly_range(start, 12)
        .into_iter()
        .map(|period_date| ForecastPoint {
            period_date,
            forecast_net_new: 100.0,
        })
        .collect();
    PointForecast::new(points).unwrap()
}

fn budget_config(total: f64, cap: Option<f64>) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.budget.total = total;
    config.budget.max_per_period = cap;
    config
}

#[test]
fn test_positive_slope_spends_whole_budget() {
    let allocator = BudgetAllocator::new(1000.0, 200.0);
    let model = SpendResponseModel::from_coefficients(20.0, 0.5);
    let prescription = allocator
        .allocate(&twelve_periods().period_dates(), &model)
        .unwrap();

    assert_eq!(prescription.status, SolveStatus::Optimal);
    assert_eq!(prescription.total_spend(), 1000.0);
    for r in &prescription.records {
        assert!(r.optimal_spend >= 0.0 && r.optimal_spend <= 200.0);
        assert_eq!(r.estimated_net_new, 20.0 + 0.5 * r.optimal_spend);
    }
}

#[test]
fn test_total_is_min_of_budget_and_capacity() {
    let model = SpendResponseModel::from_coefficients(0.0, 1.0);
    let periods = twelve_periods().period_dates();
    for (budget, cap) in [(1000.0, 200.0), (5000.0, 200.0), (0.0, 50.0), (330.0, 1e6)] {
        let p = BudgetAllocator::new(budget, cap)
            .allocate(&periods, &model)
            .unwrap();
        let expected = f64::min(budget, cap * 12.0);
        assert!((p.total_spend() - expected).abs() < 1e-9);
        assert!(p.records.iter().all(|r| r.optimal_spend <= cap));
    }
}

#[test]
fn test_history_with_falling_response_spends_nothing() {
    let series = monthly_history(18, |t| {
        let spend = 100.0 * (t % 6) as f64;
        (300.0 - 0.2 * spend, spend)
    });
    let output = optimise_series(&series, &twelve_periods(), &budget_config(1000.0, Some(200.0)))
        .unwrap();

    assert!(output.response.slope < 0.0);
    assert!(output
        .prescription
        .records
        .iter()
        .all(|r| r.optimal_spend == 0.0));
    for r in &output.prescription.records {
        assert!((r.estimated_net_new - output.response.intercept).abs() < 1e-9);
    }
}

#[test]
fn test_history_with_rising_response() {
    let series = monthly_history(18, |t| {
        let spend = 200.0 + 150.0 * (t % 4) as f64;
        (10.0 + 0.05 * spend, spend)
    });
    let output = optimise_series(&series, &twelve_periods(), &budget_config(1000.0, Some(200.0)))
        .unwrap();

    assert!((output.response.slope - 0.05).abs() < 1e-9);
    assert!((output.response.intercept - 10.0).abs() < 1e-6);
    assert_eq!(output.report.status, SolveStatus::Optimal);
    assert!((output.report.total_spend - 1000.0).abs() < 1e-9);
    assert_eq!(output.report.periods, 12);
}

#[test]
fn test_cap_defaults_to_budget() {
    let series = monthly_history(6, |t| (5.0 + t as f64, 100.0 * t as f64));
    let output =
        optimise_series(&series, &twelve_periods(), &budget_config(900.0, None)).unwrap();
    // whole budget lands in the first period
    assert_eq!(output.prescription.records[0].optimal_spend, 900.0);
    assert_eq!(output.prescription.total_spend(), 900.0);
}

#[test]
fn test_negative_budget_is_infeasible() {
    let series = monthly_history(6, |t| (5.0 + t as f64, 100.0 * t as f64));
    let err = optimise_series(&series, &twelve_periods(), &budget_config(-5.0, None)).unwrap_err();
    assert!(matches!(
        err,
        Error::InfeasibleAllocation {
            status: SolveStatus::Infeasible,
            ..
        }
    ));
}

#[test]
fn test_constant_spend_history_cannot_be_fitted() {
    let series = monthly_history(6, |t| (5.0 + t as f64, 250.0));
    let result = SpendResponseEstimator::new().fit(&series);
    assert!(matches!(result, Err(Error::ModelFit(_))));
}

#[test]
fn test_infeasible_run_writes_no_prescriptions() {
    let dir = TempTestDir::new("infeasible").unwrap();
    let mut config = dir.pipeline_config();
    config.budget.total = f64::INFINITY;
    config.budget.max_per_period = Some(f64::INFINITY);

    let series = monthly_history(6, |t| (5.0 + t as f64, 100.0 * t as f64));
    common::write_history(&dir, &series);
    netnew_forecast::io::write_point_forecast(config.paths.forecasts_path(), &twelve_periods())
        .unwrap();

    let err = netnew_forecast::run_optimise(&config).unwrap_err();
    assert_eq!(err.solve_status(), Some(SolveStatus::Unbounded));
    assert!(!config.paths.prescriptions_path().exists());
}
