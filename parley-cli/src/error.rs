//! Error types for the CLI.

use crate::config::ConfigError;
use parley_core::ParleyError;
use parley_ingest::TableError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Parley(#[from] ParleyError),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
