//! Test utilities for temporary artifact directories and synthetic history
//!
//! Temporary paths respect TMPDIR, TEMP and TMP and are removed on drop.

#![allow(dead_code)]

use std::env;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use netnew_forecast::temporal::add_months;
use netnew_forecast::{ObservationRecord, ObservedSeries, PipelineConfig};

static TEST_FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Get the temporary directory, respecting environment variables
pub fn get_temp_dir() -> PathBuf {
    env::var("TMPDIR")
        .or_else(|_| env::var("TEMP"))
        .or_else(|_| env::var("TMP"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
}

/// Unique path for a test file
pub fn test_temp_path(test_name: &str, extension: &str) -> PathBuf {
    let counter = TEST_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let filename = format!(
        "netnew_test_{}_{}_{}.{}",
        test_name,
        std::process::id(),
        counter,
        extension
    );
    get_temp_dir().join(filename)
}

/// Unique path for a test directory
pub fn test_temp_dir(test_name: &str) -> PathBuf {
    let counter = TEST_FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dirname = format!(
        "netnew_test_dir_{}_{}_{}",
        test_name,
        std::process::id(),
        counter
    );
    get_temp_dir().join(dirname)
}

/// Temporary file deleted on drop
pub struct TempTestFile {
    path: PathBuf,
}

impl TempTestFile {
    pub fn new(test_name: &str, extension: &str) -> Self {
        TempTestFile {
            path: test_temp_path(test_name, extension),
        }
    }

    /// Temporary file holding `content`
    pub fn with_content(test_name: &str, extension: &str, content: &str) -> Self {
        let file = Self::new(test_name, extension);
        fs::write(file.path(), content).expect("Failed to write test file");
        file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempTestFile {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Temporary directory deleted with its contents on drop
pub struct TempTestDir {
    path: PathBuf,
}

impl TempTestDir {
    pub fn new(test_name: &str) -> std::io::Result<Self> {
        let path = test_temp_dir(test_name);
        fs::create_dir_all(&path)?;
        Ok(TempTestDir { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pipeline configuration with every artifact under this directory
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.paths.data_dir = self.path.clone();
        config
    }
}

impl Drop for TempTestDir {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

pub fn first_month() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date")
}

/// Monthly history starting January 2021 with `(net_new, spend)` from `f(t)`
pub fn monthly_history<F>(n: usize, f: F) -> ObservedSeries
where
    F: Fn(usize) -> (f64, f64),
{
    let records = (0..n)
        .map(|t| {
            let (net_new, spend) = f(t);
            ObservationRecord::new(add_months(first_month(), t as i32), net_new, spend)
        })
        .collect();
    ObservedSeries::new(records).expect("valid synthetic history")
}

/// Linear trend times a 12-month sine, with spend that drives net-new
pub fn seasonal_history(n: usize) -> ObservedSeries {
    monthly_history(n, |t| {
        let tf = t as f64;
        let spend = 1000.0 + 100.0 * (t % 5) as f64;
        let net_new = (120.0 + 1.5 * tf) * (1.0 + 0.15 * (2.0 * PI * tf / 12.0).sin())
            + 0.01 * (spend - 1200.0);
        (net_new, spend)
    })
}

/// Short noisy linear history
pub fn short_history(n: usize) -> ObservedSeries {
    monthly_history(n, |t| {
        let tf = t as f64;
        let wiggle = if t % 2 == 0 { 2.0 } else { -2.0 };
        (40.0 + 3.0 * tf + wiggle, 500.0 + 50.0 * tf)
    })
}

/// Write `series` as `transformed_data.csv` under the directory
pub fn write_history(dir: &TempTestDir, series: &ObservedSeries) -> PathBuf {
    let config = dir.pipeline_config();
    let path = config.paths.transformed_data_path();
    netnew_forecast::io::write_observed_series(&path, series).expect("Failed to write history");
    path
}

/// Helper to create a test CSV file with given data
pub fn create_test_csv(test_name: &str, headers: &[&str], rows: &[Vec<String>]) -> TempTestFile {
    let mut content = headers.join(",");
    content.push('\n');
    for row in rows {
        content.push_str(&row.join(","));
        content.push('\n');
    }
    TempTestFile::with_content(test_name, "csv", &content)
}
