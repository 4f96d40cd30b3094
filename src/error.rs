use thiserror::Error;

use crate::optimize::SolveStatus;

/// Error type shared by every stage of the pipeline
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[source] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[source] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    /// Input file fields absent or unparseable. Raised before any modeling.
    #[error("missing or malformed data: {0}")]
    MissingData(String),

    /// Smoothing, decomposition or regression could not be fitted.
    #[error("model fit failed: {0}")]
    ModelFit(String),

    #[error("allocation not solvable (status: {status}): {reason}")]
    InfeasibleAllocation { status: SolveStatus, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("computation error: {0}")]
    ComputationError(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Status carried by an allocation failure, if this is one
    pub fn solve_status(&self) -> Option<SolveStatus> {
        match self {
            Error::InfeasibleAllocation { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}
