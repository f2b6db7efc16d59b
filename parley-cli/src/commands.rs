//! Subcommand implementations.

use crate::cli::{Command, ContextArgs, FormatArgs, PairsArgs};
use crate::config::PipelineConfig;
use crate::error::CliError;
use crate::oracle::build_oracle;
use parley_context::{annotate_in_place, materialize, ContextWindowBuilder, WindowSummary};
use parley_core::{ChatLog, ContextRecord, ParleyResult, TokenOracle};
use parley_ingest::{
    normalize, parse_export, read_json_path, read_messages_path, sibling_path,
    write_context_table_path, write_messages_path, write_pairs_path, ActionMap, NameMap,
    NormalizeOptions,
};
use std::path::{Path, PathBuf};

/// Run one subcommand and return the path it wrote.
pub fn dispatch(command: Command, config: PipelineConfig) -> Result<PathBuf, CliError> {
    match command {
        Command::Format(args) => run_format(&args),
        Command::Context(args) => run_context(&args, config),
        Command::Pairs(args) => run_pairs(&args, config),
    }
}

pub fn run_format(args: &FormatArgs) -> Result<PathBuf, CliError> {
    let export = read_to_string(&args.input)?;
    let log = parse_export(args.platform, &export)?;
    let parsed = log.len();

    let mut options = NormalizeOptions::new();
    for sender in &args.exclude_senders {
        options = options.exclude_sender(sender.clone());
    }
    if let Some(path) = &args.names {
        options = options.with_names(read_json_path::<NameMap>(path)?);
    }
    if let Some(path) = &args.actions {
        options = options.with_actions(read_json_path::<ActionMap>(path)?);
    }
    let log = normalize(log, &options);

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "", "tsv"));
    write_messages_path(&output, &log)?;

    tracing::info!(
        platform = %args.platform,
        parsed,
        kept = log.len(),
        output = %output.display(),
        "Formatted chat export"
    );
    Ok(output)
}

pub fn run_context(args: &ContextArgs, mut config: PipelineConfig) -> Result<PathBuf, CliError> {
    args.pipeline.apply(&mut config);
    config.validate()?;

    let oracle = build_oracle(config.oracle)?;
    let prepared = prepare(read_messages_path(&args.input)?, &config, &*oracle)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "_with_context", "tsv"));
    write_context_table_path(&output, &prepared.log, &prepared.records)?;

    tracing::info!(output = %output.display(), "Wrote context table");
    Ok(output)
}

pub fn run_pairs(args: &PairsArgs, mut config: PipelineConfig) -> Result<PathBuf, CliError> {
    args.pipeline.apply(&mut config);
    config.validate()?;

    let oracle = build_oracle(config.oracle)?;
    let prepared = prepare(read_messages_path(&args.input)?, &config, &*oracle)?;
    let examples = materialize(&prepared.log, &prepared.records)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| sibling_path(&args.input, "_pairs", "jsonl"));
    write_pairs_path(&output, &examples)?;

    tracing::info!(
        pairs = examples.len(),
        output = %output.display(),
        "Wrote training pairs"
    );
    Ok(output)
}

/// A filtered, annotated log with one context record per message.
#[derive(Debug, Clone)]
pub struct PreparedLog {
    pub log: ChatLog,
    pub records: Vec<ContextRecord>,
    pub summary: WindowSummary,
}

/// Drop over-long messages, annotate token lengths and build every window.
pub fn prepare(
    mut log: ChatLog,
    config: &PipelineConfig,
    oracle: &dyn TokenOracle,
) -> ParleyResult<PreparedLog> {
    let dropped = log.retain_max_chars(config.max_message_chars);
    let stats = annotate_in_place(&mut log, oracle)?;

    let builder = ContextWindowBuilder::new(config.window.clone())?;
    let records = builder.build(&log)?;
    let summary = WindowSummary::from_records(&records);

    tracing::info!(
        messages = log.len(),
        dropped_long = dropped,
        mean_token_length = stats.mean_length,
        max_token_length = stats.max_length,
        mean_context_length = summary.mean_context_length,
        max_context_length = summary.max_context_length,
        conversation_starts = summary.conversation_starts,
        "Built context windows"
    );

    Ok(PreparedLog {
        log,
        records,
        summary,
    })
}

fn read_to_string(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}
