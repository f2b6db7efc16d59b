//! PARLEY entry point.

use clap::Parser;
use parley_cli::{dispatch, init_logging, Cli, CliError, PipelineConfig};

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;
    init_logging(cli.log_format.unwrap_or(config.log_format))?;

    let output = dispatch(cli.command, config)?;
    println!("{}", output.display());
    Ok(())
}
