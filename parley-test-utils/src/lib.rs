//! PARLEY Test Utilities
//!
//! Centralized test infrastructure for the PARLEY workspace:
//! - Proptest generators for messages and chat logs
//! - Mock tokenization oracles
//! - Fixture logs and raw export samples
//! - Custom assertions for context records

// Re-export core types for convenience
pub use parley_core::{
    gap_seconds, ChatLog, ContextRecord, HeuristicOracle, Message, OracleError, ParleyError,
    ParleyResult, Timestamp, TokenAccounting, TokenOracle, TrainingExample, WindowConfig,
    WindowError,
};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::HashMap;

// ============================================================================
// MOCK ORACLES
// ============================================================================

/// Oracle that returns the same length for every input.
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle {
    length: usize,
}

impl FixedOracle {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl TokenOracle for FixedOracle {
    fn token_length(&self, _text: &str) -> ParleyResult<usize> {
        Ok(self.length)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Oracle with a lookup table and a whitespace-word fallback.
#[derive(Debug, Clone, Default)]
pub struct TableOracle {
    lengths: HashMap<String, usize>,
}

impl TableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, text: impl Into<String>, length: usize) -> Self {
        self.lengths.insert(text.into(), length);
        self
    }
}

impl TokenOracle for TableOracle {
    fn token_length(&self, text: &str) -> ParleyResult<usize> {
        Ok(self
            .lengths
            .get(text)
            .copied()
            .unwrap_or_else(|| text.split_whitespace().count()))
    }

    fn name(&self) -> &str {
        "table"
    }
}

/// Wraps another oracle and counts how often it is consulted.
#[derive(Debug)]
pub struct CountingOracle<O> {
    inner: O,
    calls: Cell<usize>,
}

impl<O: TokenOracle> CountingOracle<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<O: TokenOracle> TokenOracle for CountingOracle<O> {
    fn token_length(&self, text: &str) -> ParleyResult<usize> {
        self.calls.set(self.calls.get() + 1);
        self.inner.token_length(text)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Oracle that always fails, as an unloadable model would.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingOracle;

impl TokenOracle for FailingOracle {
    fn token_length(&self, _text: &str) -> ParleyResult<usize> {
        Err(OracleError::Unavailable {
            oracle: "failing".to_string(),
            reason: "no model files".to_string(),
        }
        .into())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

/// Base instant used by every fixture.
pub const FIXTURE_EPOCH: i64 = 1_727_600_000;

/// Fixture timestamp `secs` seconds after [`FIXTURE_EPOCH`].
pub fn ts(secs: i64) -> Timestamp {
    Utc.timestamp_opt(FIXTURE_EPOCH + secs, 0)
        .single()
        .unwrap_or_else(|| panic!("fixture timestamp out of range: {}", secs))
}

/// Annotated message at fixture time `secs`.
pub fn annotated(sender: &str, secs: i64, text: &str, token_length: usize) -> Message {
    Message::new(sender, ts(secs), text).with_token_length(token_length)
}

/// The three-message exchange: A "hi" at 0s, B "hey" at 10s, A "sup" at 20s,
/// with token lengths 5, 4, 5.
pub fn scenario_log() -> ChatLog {
    ChatLog::new(vec![
        annotated("A", 0, "hi", 5),
        annotated("B", 10, "hey", 4),
        annotated("A", 20, "sup", 5),
    ])
}

/// Sorted, annotated log built from (gap seconds, token length) steps.
pub fn log_from_steps(steps: &[(i64, usize)]) -> ChatLog {
    let mut secs = 0;
    steps
        .iter()
        .enumerate()
        .map(|(i, (gap, length))| {
            secs += gap;
            annotated(&format!("user{}", i % 4), secs, &format!("message {}", i), *length)
        })
        .collect()
}

/// WhatsApp export sample: two senders, a continuation line, a direction mark
/// and an attachment notice.
pub const WHATSAPP_SAMPLE: &str = "\
[29/09/24, 9:15:02 AM] Ana: morning all
[29/09/24, 9:15:40 AM] Ben: \u{200e}hey
how was the trip?
[29/09/24, 9:20:00 AM] Ana: \u{200e}document omitted
[29/09/24, 11:02:13 PM] Ben: lol
";

/// Discord export sample: header lines followed by bodies and blank lines.
pub const DISCORD_SAMPLE: &str = "\
[29/09/2024 09:15] Ana
morning all

[29/09/2024 09:16] Ben
hey
how was the trip?

[29/09/2024 23:02] Ana
lol
";

// ============================================================================
// GENERATORS
// ============================================================================

/// Sender names, including ones with spaces and non-ASCII characters.
pub fn arb_sender() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Ana".to_string()),
        Just("Ben Okafor".to_string()),
        Just("Zoë".to_string()),
        "[a-z]{1,12}",
    ]
}

/// Message texts, sometimes spanning several lines.
pub fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9 ,.!?]{0,40}", 1..4).prop_map(|lines| lines.join("\n"))
}

/// (gap seconds, token length) steps; gaps straddle the default window.
pub fn arb_steps() -> impl Strategy<Value = Vec<(i64, usize)>> {
    prop::collection::vec((0i64..5_000, 0usize..150), 1..40)
}

/// Sorted, fully annotated chat log.
pub fn arb_chat_log() -> impl Strategy<Value = ChatLog> {
    prop::collection::vec((arb_sender(), arb_text(), 0i64..5_000, 0usize..150), 1..40).prop_map(
        |rows| {
            let mut secs = 0;
            rows.into_iter()
                .map(|(sender, text, gap, length)| {
                    secs += gap;
                    Message::new(sender, ts(secs), text).with_token_length(length)
                })
                .collect()
        },
    )
}

/// Window configurations with varied budgets and windows.
pub fn arb_window_config() -> impl Strategy<Value = WindowConfig> {
    (6usize..1_000, 0i64..10_000, prop::bool::ANY).prop_map(|(max_tokens, window, exact)| {
        WindowConfig::default()
            .with_max_tokens(max_tokens)
            .with_window_seconds(window)
            .with_accounting(if exact {
                TokenAccounting::Exact
            } else {
                TokenAccounting::Legacy
            })
    })
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Assert that `records` is ordinal-aligned with `log`.
pub fn assert_aligned(log: &ChatLog, records: &[ContextRecord]) {
    assert_eq!(records.len(), log.len(), "one record per message");
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.index, i, "record {} carries index {}", i, record.index);
        assert!(
            record.context_length <= i,
            "record {} folds in {} messages",
            i,
            record.context_length
        );
    }
}
