//! Error type shared by every generation stage.
//!
//! Only precondition violations are errors. Degenerate numeric input (tiny noise
//! scale, zero octaves, flat fields) and hitting the prop limit have defined
//! fallback behavior and never surface here.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can make a generation request fail.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("map dimensions must be at least 1x1, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("flat buffer holds {actual} elements but the grid needs {expected}")]
    FlatLengthMismatch { expected: usize, actual: usize },

    #[error("prop placement requested with an empty prop catalog")]
    EmptyPropCatalog,

    #[error("failed to read generation config {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse generation config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
