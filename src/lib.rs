#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod config;
pub mod error;
pub mod io;
pub mod optimize;
pub mod pipeline;
pub mod series;
pub mod stats;
pub mod temporal;
pub mod time_series;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use optimize::{BudgetAllocator, Prescription, PrescriptionRecord, SolveStatus};
pub use pipeline::{
    forecast_series, optimise_series, run_forecast, run_optimise, run_pipeline, ForecastOutput,
    ForecastReport, OptimiseOutput, OptimiseReport, RunSummary,
};
pub use series::{ObservationRecord, ObservedSeries};
pub use stats::{SpendResponseEstimator, SpendResponseModel};
pub use time_series::{
    ForecastModel, ModelVariant, PointForecast, SimulationMatrix, SpreadPolicy,
    TimeSeriesDecomposer, UncertaintySimulator,
};

// Export version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
