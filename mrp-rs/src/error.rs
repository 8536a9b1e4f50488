use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MrpError>;

/// Failures while reading a run request or writing model outputs.
#[derive(Debug, Error)]
pub enum MrpError {
    #[error("no input on stdin")]
    EmptyInput,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse run request: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to deserialize model input: {0}")]
    Input(#[source] serde_json::Error),

    #[error("failed to read parameter file {}: {source}", path.display())]
    ParameterFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write CSV output: {0}")]
    Csv(#[from] csv::Error),
}
