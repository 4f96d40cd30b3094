//! Flat-file artifacts exchanged between pipeline stages

pub mod csv;

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::Result;

// Re-export commonly used functions
pub use self::csv::{
    read_observed_series, read_point_forecast, read_prescriptions, read_simulation_matrix,
    write_observed_series, write_point_forecast, write_prescription, write_simulation_matrix,
    write_simulation_summary,
};

/// Replace `path` with `bytes` in one step
///
/// The content goes to a temporary file in the destination directory which
/// is then renamed over the destination, so readers see either the old or
/// the new file.
pub fn write_bytes_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path)?;
    Ok(())
}

/// Pretty-printed JSON, written atomically
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes_atomic(path, &bytes)
}
