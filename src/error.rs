//! Error taxonomy for chronics generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors raised by a synthesis call or by its I/O collaborators.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Invalid or missing parameter, or invalid catalogue entry.
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// A node resolved to a grid cell outside the generated noise field.
    ///
    /// Indicates a sizing bug rather than bad input.
    #[error(
        "node \"{node}\" maps to cell ({x}, {y}) outside the {nx}x{ny} {channel} noise field"
    )]
    OutOfBounds {
        node: String,
        channel: &'static str,
        x: i64,
        y: i64,
        nx: usize,
        ny: usize,
    },

    /// Irradiance template incompatible with the requested window or timestep.
    #[error("data alignment error: {0}")]
    DataAlignment(String),

    /// Filesystem failure, tagged with the offending path.
    #[error("I/O error on \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// CSV encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON report serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Worker pool for batch runs could not be started.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl GenerationError {
    /// Shorthand for a configuration error on `field`.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration(ConfigError::new(field, message))
    }

    /// Wraps an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
