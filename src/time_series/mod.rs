//! Time series modeling for the forecast stage
//!
//! - Classical seasonal decomposition with a short-history fallback
//! - Holt and Holt-Winters exponential smoothing fitted by a bounded
//!   Nelder-Mead search
//! - Monte Carlo uncertainty around the point forecasts

pub mod decomposition;
pub mod forecasting;
pub mod optimizer;
pub mod simulation;
pub mod smoothing;

/// Season length of monthly data
pub const SEASONAL_PERIODS: usize = 12;

pub use decomposition::{
    DecompositionModel, DecompositionResult, ResidualMethod, ResidualSpread, TimeSeriesDecomposer,
};
pub use forecasting::{
    FittedForecastModel, ForecastModel, ForecastPoint, ModelVariant, PointForecast,
};
pub use optimizer::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use simulation::{
    DrawSummary, SimulationMatrix, SpreadPolicy, UncertaintySimulator, DEFAULT_DRAWS,
};
pub use smoothing::{
    ExponentialSmoothing, Forecaster, SeasonalComponent, SmoothingFit,
};
