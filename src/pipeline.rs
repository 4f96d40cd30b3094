//! Forecast and optimise stages
//!
//! Each stage reads its inputs from the artifact directory, runs to
//! completion and replaces its output files. The `*_series` functions do the
//! same work in memory for callers that manage their own data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::io;
use crate::optimize::{BudgetAllocator, Prescription, SolveStatus};
use crate::series::ObservedSeries;
use crate::stats::{SpendResponseEstimator, SpendResponseModel};
use crate::time_series::{
    ForecastModel, ModelVariant, PointForecast, ResidualMethod, ResidualSpread, SimulationMatrix,
    TimeSeriesDecomposer, UncertaintySimulator,
};

/// What the forecast stage did
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub n_obs: usize,
    pub first_period: NaiveDate,
    pub last_period: NaiveDate,
    /// Fewer than two full seasons; fallbacks were used
    pub insufficient_history: bool,
    pub residual_method: ResidualMethod,
    pub resid_std: f64,
    pub variant: ModelVariant,
    pub model: String,
    pub parameters: BTreeMap<String, f64>,
    pub sse: f64,
    pub aic: Option<f64>,
    pub bic: Option<f64>,
    pub horizon: usize,
    pub draws: usize,
}

/// In-memory result of the forecast stage
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub report: ForecastReport,
    pub residuals: ResidualSpread,
    pub forecast: PointForecast,
    pub simulation: SimulationMatrix,
}

/// What the optimise stage did
#[derive(Debug, Clone, Serialize)]
pub struct OptimiseReport {
    pub n_obs: usize,
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: Option<f64>,
    pub budget: f64,
    pub max_monthly_spend: f64,
    pub periods: usize,
    pub status: SolveStatus,
    pub total_spend: f64,
    pub total_estimated_net_new: f64,
}

/// In-memory result of the optimise stage
#[derive(Debug, Clone)]
pub struct OptimiseOutput {
    pub report: OptimiseReport,
    pub response: SpendResponseModel,
    pub prescription: Prescription,
}

/// Report of a full run, written as `run_summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub forecast: ForecastReport,
    pub optimise: OptimiseReport,
}

/// Decompose, fit, forecast and simulate
pub fn forecast_series(series: &ObservedSeries, config: &PipelineConfig) -> Result<ForecastOutput> {
    let values = series.net_new();
    let n_obs = values.len();
    let periods = config.seasonal_periods;

    let decomposer = TimeSeriesDecomposer::multiplicative(periods);
    let residuals = decomposer.residual_spread(&values)?;

    let model = ForecastModel::new(periods);
    let fitted = model.fit(series)?;
    let forecast = fitted.point_forecast()?;

    let simulation = UncertaintySimulator::new()
        .draws(config.simulation.draws)
        .seed(config.simulation.seed)
        .spread(config.simulation.spread)
        .simulate(&forecast, residuals.resid_std)?;

    let (sse, aic, bic) = fitted
        .summary()
        .map(|fit| (fit.sse, fit.aic, fit.bic))
        .unwrap_or((f64::NAN, None, None));

    let records = series.records();
    let report = ForecastReport {
        n_obs,
        first_period: records[0].period_date,
        last_period: series.last_period(),
        insufficient_history: !decomposer.can_decompose(n_obs),
        residual_method: residuals.method,
        resid_std: residuals.resid_std,
        variant: fitted.variant(),
        model: fitted.model_name().to_string(),
        parameters: fitted.parameters().into_iter().collect(),
        sse,
        aic,
        bic,
        horizon: forecast.horizon(),
        draws: simulation.n_draws(),
    };

    Ok(ForecastOutput {
        report,
        residuals,
        forecast,
        simulation,
    })
}

/// Fit the spend response and allocate the budget over the forecast periods
pub fn optimise_series(
    series: &ObservedSeries,
    forecast: &PointForecast,
    config: &PipelineConfig,
) -> Result<OptimiseOutput> {
    let response = SpendResponseEstimator::new().fit(series)?;

    let allocator = BudgetAllocator::new(config.budget.total, config.max_monthly_spend());
    let prescription = allocator.allocate(&forecast.period_dates(), &response)?;

    let report = OptimiseReport {
        n_obs: response.n_obs,
        intercept: response.intercept,
        slope: response.slope,
        r_squared: response.r_squared,
        budget: allocator.budget(),
        max_monthly_spend: allocator.max_period_spend(),
        periods: prescription.records.len(),
        status: prescription.status,
        total_spend: prescription.total_spend(),
        total_estimated_net_new: prescription.total_estimated_net_new(),
    };

    Ok(OptimiseOutput {
        report,
        response,
        prescription,
    })
}

/// Forecast stage: history in, forecasts and Monte Carlo draws out
pub fn run_forecast(config: &PipelineConfig) -> Result<ForecastReport> {
    let paths = &config.paths;
    let series = io::read_observed_series(paths.transformed_data_path())?;
    log::info!(
        "Loaded {} observations from {}",
        series.len(),
        paths.transformed_data_path().display()
    );

    let output = forecast_series(&series, config)?;

    let forecast_path = paths.forecasts_path();
    io::write_point_forecast(&forecast_path, &output.forecast)?;
    log::info!("Point forecasts written to {}", forecast_path.display());

    let summary = output.simulation.summary()?;

    let mc_path = paths.monte_carlo_results_path();
    io::write_simulation_matrix(&mc_path, &output.simulation)?;
    log::info!("Monte Carlo results written to {}", mc_path.display());

    let summary_path = paths.monte_carlo_summary_path();
    io::write_simulation_summary(&summary_path, &summary)?;
    log::info!("Monte Carlo summary written to {}", summary_path.display());

    Ok(output.report)
}

/// Optimise stage: history and forecast periods in, prescriptions out
pub fn run_optimise(config: &PipelineConfig) -> Result<OptimiseReport> {
    let paths = &config.paths;
    let series = io::read_observed_series(paths.transformed_data_path())?;
    let forecast = io::read_point_forecast(paths.forecasts_path())?;

    let output = optimise_series(&series, &forecast, config)?;

    let path = paths.prescriptions_path();
    io::write_prescription(&path, &output.prescription)?;
    log::info!("Prescriptions written to {}", path.display());

    Ok(output.report)
}

/// Both stages in order, then the run summary
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunSummary> {
    log::info!("Starting pipeline: forecast -> optimise");
    let forecast = run_forecast(config)?;
    let optimise = run_optimise(config)?;

    let summary = RunSummary {
        version: crate::VERSION.to_string(),
        forecast,
        optimise,
    };
    let path = config.paths.run_summary_path();
    io::write_json(&path, &summary)?;
    log::info!("Run summary written to {}", path.display());
    log::info!("Pipeline completed successfully.");

    Ok(summary)
}
