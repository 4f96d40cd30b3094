//! Pipeline configuration
//!
//! Built once at process start from, in increasing precedence: defaults, an
//! optional config file, environment variables, and command-line overrides.
//! Components receive the finished value; nothing reads the environment
//! after that.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time_series::{SpreadPolicy, DEFAULT_DRAWS, SEASONAL_PERIODS};

pub const ENV_BUDGET: &str = "PRESCRIPTIVE_BUDGET";
pub const ENV_MAX_MONTHLY_SPEND: &str = "MAX_MONTHLY_SPEND";
pub const ENV_DATA_DIR: &str = "FORECAST_DATA_DIR";
pub const ENV_SEED: &str = "MONTE_CARLO_SEED";
pub const ENV_DRAWS: &str = "MONTE_CARLO_DRAWS";

/// Complete configuration of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub budget: BudgetConfig,
    pub paths: PathsConfig,
    pub simulation: SimulationConfig,
    /// Season length in months
    pub seasonal_periods: usize,
}

/// Spend limits for the allocator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Total budget across the forecast horizon
    pub total: f64,
    /// Cap per forecast period; the total budget when unset
    pub max_per_period: Option<f64>,
}

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub transformed_data: String,
    pub forecasts: String,
    pub monte_carlo_results: String,
    pub monte_carlo_summary: String,
    pub prescriptions: String,
    pub run_summary: String,
}

/// Monte Carlo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub draws: usize,
    /// Fixed generator seed; fresh entropy per run when unset
    pub seed: Option<u64>,
    pub spread: SpreadPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            budget: BudgetConfig::default(),
            paths: PathsConfig::default(),
            simulation: SimulationConfig::default(),
            seasonal_periods: SEASONAL_PERIODS,
        }
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        BudgetConfig {
            total: 0.0,
            max_per_period: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            data_dir: PathBuf::from("data"),
            transformed_data: "transformed_data.csv".to_string(),
            forecasts: "forecasts.csv".to_string(),
            monte_carlo_results: "monte_carlo_results.csv".to_string(),
            monte_carlo_summary: "monte_carlo_summary.csv".to_string(),
            prescriptions: "prescriptions.csv".to_string(),
            run_summary: "run_summary.json".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            draws: DEFAULT_DRAWS,
            seed: None,
            spread: SpreadPolicy::Constant,
        }
    }
}

impl PathsConfig {
    /// Same file names under another directory
    pub fn with_data_dir<P: Into<PathBuf>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn transformed_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.transformed_data)
    }

    pub fn forecasts_path(&self) -> PathBuf {
        self.data_dir.join(&self.forecasts)
    }

    pub fn monte_carlo_results_path(&self) -> PathBuf {
        self.data_dir.join(&self.monte_carlo_results)
    }

    pub fn monte_carlo_summary_path(&self) -> PathBuf {
        self.data_dir.join(&self.monte_carlo_summary)
    }

    pub fn prescriptions_path(&self) -> PathBuf {
        self.data_dir.join(&self.prescriptions)
    }

    pub fn run_summary_path(&self) -> PathBuf {
        self.data_dir.join(&self.run_summary)
    }
}

impl PipelineConfig {
    /// Optional config file overridden by the process environment, validated
    pub fn from_env(file: Option<&Path>) -> Result<Self> {
        Self::load(file, |key| std::env::var(key).ok())
    }

    /// Defaults overridden by an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = PipelineConfig::default();
        config.apply_lookup(lookup)?;
        Ok(config)
    }

    /// Read a `.toml`, `.yaml`/`.yml` or `.json` file; missing keys take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let parsed = match extension.as_deref() {
            Some("toml") => toml::from_str(&content).map_err(|e| e.to_string()),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            Some("json") => serde_json::from_str(&content).map_err(|e| e.to_string()),
            _ => {
                return Err(Error::Config(format!(
                    "unsupported config file type: {}",
                    path.display()
                )))
            }
        };

        parsed.map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// File (if any) then environment lookup, validated
    pub fn load<F>(file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => PipelineConfig::default(),
        };
        config.apply_lookup(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style variables
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(total) = parse_var::<f64, _>(&lookup, ENV_BUDGET)? {
            self.budget.total = total;
        }
        if let Some(cap) = parse_var::<f64, _>(&lookup, ENV_MAX_MONTHLY_SPEND)? {
            self.budget.max_per_period = Some(cap);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.paths.data_dir = PathBuf::from(dir.trim());
        }
        if let Some(seed) = parse_var::<u64, _>(&lookup, ENV_SEED)? {
            self.simulation.seed = Some(seed);
        }
        if let Some(draws) = parse_var::<usize, _>(&lookup, ENV_DRAWS)? {
            self.simulation.draws = draws;
        }
        Ok(())
    }

    /// Per-period spend cap, falling back to the total budget
    pub fn max_monthly_spend(&self) -> f64 {
        self.budget.max_per_period.unwrap_or(self.budget.total)
    }

    pub fn validate(&self) -> Result<()> {
        if self.budget.total.is_nan() {
            return Err(Error::Config("budget must be a number".to_string()));
        }
        if self.max_monthly_spend().is_nan() {
            return Err(Error::Config(
                "maximum monthly spend must be a number".to_string(),
            ));
        }
        if self.seasonal_periods < 2 {
            return Err(Error::Config(format!(
                "seasonal_periods must be at least 2, got {}",
                self.seasonal_periods
            )));
        }
        if self.simulation.draws == 0 {
            return Err(Error::Config(
                "simulation needs at least one draw".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid value {:?} for {}: {}", raw, key, e))),
        _ => Ok(None),
    }
}
