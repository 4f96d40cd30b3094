//! # netnew-forecast
//!
//! Command-line entry point for the forecast and optimise stages.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use netnew_forecast::{run_forecast, run_optimise, run_pipeline, Error, PipelineConfig};

#[derive(Parser)]
#[command(name = "netnew-forecast", version)]
#[command(about = "Forecast net-new customers and prescribe marketing spend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (.toml, .yaml, .yml or .json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the CSV artifacts
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Total budget across the forecast horizon
    #[arg(long, global = true)]
    budget: Option<f64>,

    /// Spend cap per forecast month
    #[arg(long, global = true)]
    max_monthly_spend: Option<f64>,

    /// Seed for the Monte Carlo draws
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompose, fit the smoothing model, forecast and simulate
    Forecast,
    /// Fit the spend response and allocate the budget
    Optimise,
    /// Forecast then optimise, and write the run summary
    Run,
}

impl Cli {
    fn pipeline_config(&self) -> netnew_forecast::Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env(self.config.as_deref())?;

        if let Some(dir) = &self.data_dir {
            config.paths.data_dir = dir.clone();
        }
        if let Some(budget) = self.budget {
            config.budget.total = budget;
        }
        if let Some(cap) = self.max_monthly_spend {
            config.budget.max_per_period = Some(cap);
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(cli: &Cli) -> netnew_forecast::Result<()> {
    let config = cli.pipeline_config()?;
    log::debug!("Configuration: {:?}", config);

    match cli.command {
        Commands::Forecast => {
            let report = run_forecast(&config)?;
            log::info!(
                "Forecast stage done: {} model, horizon {}, resid_std {:.4}",
                report.model,
                report.horizon,
                report.resid_std
            );
        }
        Commands::Optimise => {
            let report = run_optimise(&config)?;
            log::info!(
                "Optimise stage done: total spend {:.2}, estimated net-new {:.2}",
                report.total_spend,
                report.total_estimated_net_new
            );
        }
        Commands::Run => {
            run_pipeline(&config)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::InfeasibleAllocation { .. }) => {
            log::error!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
