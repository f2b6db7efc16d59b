//! Tokenizer selection.

use clap::ValueEnum;
use parley_core::{HeuristicOracle, OracleError, ParleyResult, TokenOracle};
use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Which tokenizer measures message lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    /// cl100k_base byte-pair encoding
    #[default]
    Bpe,
    /// 0.75 tokens per byte estimate
    Heuristic,
}

/// Byte-pair-encoding oracle using the cl100k_base vocabulary.
pub struct BpeOracle {
    encoder: CoreBPE,
}

impl BpeOracle {
    pub fn new() -> ParleyResult<Self> {
        let encoder = cl100k_base().map_err(|e| OracleError::Unavailable {
            oracle: "bpe".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { encoder })
    }
}

impl std::fmt::Debug for BpeOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BpeOracle").field("vocabulary", &"cl100k_base").finish()
    }
}

impl TokenOracle for BpeOracle {
    fn token_length(&self, text: &str) -> ParleyResult<usize> {
        Ok(self.encoder.encode_with_special_tokens(text).len())
    }

    fn name(&self) -> &str {
        "bpe"
    }
}

pub fn build_oracle(kind: OracleKind) -> ParleyResult<Box<dyn TokenOracle>> {
    let oracle: Box<dyn TokenOracle> = match kind {
        OracleKind::Bpe => Box::new(BpeOracle::new()?),
        OracleKind::Heuristic => Box::new(HeuristicOracle),
    };
    tracing::debug!(oracle = oracle.name(), "Tokenizer ready");
    Ok(oracle)
}
