//! PARLEY CLI
//!
//! `parley format` turns a raw WhatsApp or Discord export into a message
//! table, `parley context` adds token lengths and a context column, and
//! `parley pairs` writes context/reply pairs for training.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod oracle;
pub mod telemetry;

pub use cli::{Cli, Command};
pub use commands::{dispatch, prepare, PreparedLog};
pub use config::PipelineConfig;
pub use error::CliError;
pub use oracle::{build_oracle, BpeOracle, OracleKind};
pub use telemetry::{init_logging, LogFormat};
