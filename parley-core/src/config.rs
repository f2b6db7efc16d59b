//! Configuration types

use crate::{ConfigError, ParleyError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token cost of the literal `"sender: "` header fragment.
pub const SENDER_OVERHEAD: usize = 3;
/// Token cost of the literal `"context:"` header fragment.
pub const CONTEXT_OVERHEAD: usize = 3;
/// Ceiling on the running token total.
pub const MAX_TOKENS: usize = 450;
/// Maximum age, in seconds, of a context message relative to its reply.
pub const WINDOW_SECONDS: i64 = 3600;

/// How `ContextRecord::total_tokens` is reported.
///
/// The stopping rule is the same for both modes; only the reported figure
/// differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAccounting {
    /// Report starts from the gate total, so the immediate predecessor is
    /// counted twice when it is included, and a failed gate still reports it.
    #[default]
    Legacy,
    /// Report is the header overhead plus the lengths of included messages.
    Exact,
}

impl TokenAccounting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Exact => "exact",
        }
    }
}

impl fmt::Display for TokenAccounting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenAccounting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "exact" => Ok(Self::Exact),
            other => Err(ConfigError::InvalidValue {
                field: "accounting".to_string(),
                value: other.to_string(),
                reason: "expected 'legacy' or 'exact'".to_string(),
            }),
        }
    }
}

/// Parameters of the context window builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    /// Token cost of the sender header fragment
    pub sender_overhead: usize,
    /// Token cost of the context header fragment
    pub context_overhead: usize,
    /// Ceiling on the running token total
    pub max_tokens: usize,
    /// Maximum age of a context message, in seconds
    pub window_seconds: i64,
    /// Reporting mode for `total_tokens`
    pub accounting: TokenAccounting,
    /// Reject logs whose timestamps decrease
    pub require_sorted: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            sender_overhead: SENDER_OVERHEAD,
            context_overhead: CONTEXT_OVERHEAD,
            max_tokens: MAX_TOKENS,
            window_seconds: WINDOW_SECONDS,
            accounting: TokenAccounting::Legacy,
            require_sorted: false,
        }
    }
}

impl WindowConfig {
    /// Fixed header cost paid by every record.
    pub fn overhead(&self) -> usize {
        self.sender_overhead + self.context_overhead
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_window_seconds(mut self, window_seconds: i64) -> Self {
        self.window_seconds = window_seconds;
        self
    }

    pub fn with_accounting(mut self, accounting: TokenAccounting) -> Self {
        self.accounting = accounting;
        self
    }

    pub fn with_require_sorted(mut self, require_sorted: bool) -> Self {
        self.require_sorted = require_sorted;
        self
    }

    /// Validate the configuration.
    ///
    /// Validates:
    /// - max_tokens > 0
    /// - window_seconds >= 0
    /// - the header overhead fits under max_tokens
    pub fn validate(&self) -> ParleyResult<()> {
        if self.max_tokens == 0 {
            return Err(ParleyError::Config(ConfigError::InvalidValue {
                field: "max_tokens".to_string(),
                value: self.max_tokens.to_string(),
                reason: "max_tokens must be greater than 0".to_string(),
            }));
        }

        if self.window_seconds < 0 {
            return Err(ParleyError::Config(ConfigError::InvalidValue {
                field: "window_seconds".to_string(),
                value: self.window_seconds.to_string(),
                reason: "window_seconds must be non-negative".to_string(),
            }));
        }

        if self.overhead() > self.max_tokens {
            return Err(ParleyError::Config(ConfigError::InvalidValue {
                field: "max_tokens".to_string(),
                value: self.max_tokens.to_string(),
                reason: format!(
                    "max_tokens must cover the header overhead of {} tokens",
                    self.overhead()
                ),
            }));
        }

        Ok(())
    }
}
