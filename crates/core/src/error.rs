//! Error types for wheatn

use std::path::PathBuf;

use thiserror::Error;

use crate::index::VegetationIndex;

/// Main error type for wheatn operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error in {path}: {reason}")]
    Tiff { path: PathBuf, reason: String },

    #[error("Data directory not found: {0}")]
    DataDirNotFound(PathBuf),

    #[error("No .tif files found in {0}")]
    NoInputFiles(PathBuf),

    #[error("{path}: expected at least {expected} bands, found {found}")]
    MissingBands {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("{0}: no acquisition date in GDAL metadata or file name")]
    MissingDate(PathBuf),

    #[error("Empty vegetation index set")]
    EmptyIndexSet,

    #[error("No valid indices available for N content estimation (need one of NDRE, CIred-edge, MCARI)")]
    NoApplicableMethod,

    #[error("{index} = {value} is outside its legal range [{min}, {max}]")]
    IndexOutOfDomain {
        index: VegetationIndex,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Error {
    /// True for the errors a single observation can fail with during
    /// estimation (as opposed to I/O or configuration problems).
    pub fn is_input_validation(&self) -> bool {
        matches!(
            self,
            Error::EmptyIndexSet | Error::NoApplicableMethod | Error::IndexOutOfDomain { .. }
        )
    }
}

/// Result type alias for wheatn operations
pub type Result<T> = std::result::Result<T, Error>;
