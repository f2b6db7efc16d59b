//! Command-line arguments.

use crate::config::PipelineConfig;
use crate::oracle::OracleKind;
use crate::telemetry::LogFormat;
use clap::{Args, Parser, Subcommand};
use parley_core::TokenAccounting;
use parley_ingest::Platform;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "parley")]
#[command(about = "Turn chat exports into context/reply training data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Pipeline configuration file (TOML)
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a raw chat export into a message table
    Format(FormatArgs),

    /// Annotate a message table and add a context column
    Context(ContextArgs),

    /// Write context/reply training pairs as JSON Lines
    Pairs(PairsArgs),
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Raw export file
    pub input: PathBuf,

    /// Export flavour (whatsapp or discord)
    #[arg(long)]
    pub platform: Platform,

    /// JSON object of name replacements
    #[arg(long)]
    pub names: Option<PathBuf>,

    /// JSON object of action phrases
    #[arg(long)]
    pub actions: Option<PathBuf>,

    /// Drop messages from this sender (repeatable)
    #[arg(long = "exclude-sender")]
    pub exclude_senders: Vec<String>,

    /// Output table (defaults to <input stem>.tsv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ContextArgs {
    /// Message table
    pub input: PathBuf,

    /// Output table (defaults to <input stem>_with_context.tsv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Debug, Args)]
pub struct PairsArgs {
    /// Message table
    pub input: PathBuf,

    /// Output file (defaults to <input stem>_pairs.jsonl)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Flags that override the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct PipelineArgs {
    /// Tokenizer used for message lengths
    #[arg(long, value_enum)]
    pub oracle: Option<OracleKind>,

    /// Token budget per context window
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Maximum age of a context message, in seconds
    #[arg(long)]
    pub window_seconds: Option<i64>,

    /// How total_tokens is reported (legacy or exact)
    #[arg(long)]
    pub accounting: Option<TokenAccounting>,

    /// Drop messages longer than this many characters
    #[arg(long)]
    pub max_message_chars: Option<usize>,

    /// Fail on out-of-order timestamps instead of building anyway
    #[arg(long)]
    pub require_sorted: bool,
}

impl PipelineArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(oracle) = self.oracle {
            config.oracle = oracle;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.window.max_tokens = max_tokens;
        }
        if let Some(window_seconds) = self.window_seconds {
            config.window.window_seconds = window_seconds;
        }
        if let Some(accounting) = self.accounting {
            config.window.accounting = accounting;
        }
        if let Some(max_message_chars) = self.max_message_chars {
            config.max_message_chars = max_message_chars;
        }
        if self.require_sorted {
            config.window.require_sorted = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        let cli = Cli::try_parse_from([
            "parley",
            "format",
            "chat.txt",
            "--platform",
            "whatsapp",
            "--exclude-sender",
            "The Group",
            "--exclude-sender",
            "Meta AI",
        ])
        .unwrap();
        match cli.command {
            Command::Format(args) => {
                assert_eq!(args.platform, Platform::WhatsApp);
                assert_eq!(args.exclude_senders, vec!["The Group", "Meta AI"]);
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_platform_rejected() {
        let result =
            Cli::try_parse_from(["parley", "format", "chat.txt", "--platform", "telegram"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "parley",
            "context",
            "chat.tsv",
            "--oracle",
            "heuristic",
            "--max-tokens",
            "128",
            "--accounting",
            "exact",
            "--require-sorted",
        ])
        .unwrap();
        let Command::Context(args) = cli.command else {
            panic!("expected context command");
        };

        let mut config = PipelineConfig::default();
        args.pipeline.apply(&mut config);
        assert_eq!(config.oracle, OracleKind::Heuristic);
        assert_eq!(config.window.max_tokens, 128);
        assert_eq!(config.window.window_seconds, 3600);
        assert_eq!(config.window.accounting, TokenAccounting::Exact);
        assert!(config.window.require_sorted);
        assert_eq!(config.max_message_chars, 200);
    }
}
