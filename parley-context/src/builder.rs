//! Context window builder.
//!
//! For every message, walks backwards over its predecessors and folds in as
//! many as both the recency window and the token budget allow. Both limits
//! are tested against the *next* candidate before it is included, using the
//! gap and running total already fetched for the termination test.

use parley_core::{
    gap_seconds, ChatLog, ContextRecord, Message, ParleyResult, TokenAccounting, WindowConfig,
    WindowError,
};

/// Prompt body for a record with no prior turns.
pub const START_MARKER: &str = "start conversation";

/// Header that opens every prompt.
pub fn prompt_header(sender: &str) -> String {
    format!("sender: {} | context:\n", sender)
}

// ============================================================================
// SCAN ACCUMULATOR
// ============================================================================

/// Running state of one backward scan. Owned by a single index, never shared.
#[derive(Debug, Clone, Copy)]
struct WindowScan {
    /// Seconds between the target message and the candidate under test
    gap_seconds: i64,
    /// Overhead plus the lengths of every candidate tested so far
    budget: usize,
    /// Set once the start of the log has been reached
    exhausted: bool,
}

impl WindowScan {
    fn open(gap_seconds: i64, budget: usize) -> Self {
        Self {
            gap_seconds,
            budget,
            exhausted: false,
        }
    }

    /// Whether the candidate under test may be included.
    fn admits(&self, config: &WindowConfig) -> bool {
        !self.exhausted
            && self.gap_seconds <= config.window_seconds
            && self.budget <= config.max_tokens
    }

    /// Move on to the next older candidate.
    fn advance(&mut self, gap_seconds: i64, token_length: usize) {
        self.gap_seconds = gap_seconds;
        self.budget = self.budget.saturating_add(token_length);
    }

    fn exhaust(&mut self) {
        self.exhausted = true;
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Builds one [`ContextRecord`] per message of an annotated [`ChatLog`].
///
/// The builder only reads cached token lengths; it never tokenizes.
#[derive(Debug, Clone)]
pub struct ContextWindowBuilder {
    config: WindowConfig,
}

impl ContextWindowBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: WindowConfig) -> ParleyResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Build the context record of every message, in log order.
    ///
    /// Fails fast with `MissingTokenLength` if any message is unannotated,
    /// and with `UnsortedLog` when `require_sorted` is set and the log is
    /// out of order.
    pub fn build(&self, log: &ChatLog) -> ParleyResult<Vec<ContextRecord>> {
        self.check_annotated(log)?;
        self.check_order(log)?;

        let records = (0..log.len())
            .map(|index| self.window_at(log, index))
            .collect::<ParleyResult<Vec<_>>>()?;

        tracing::debug!(
            messages = log.len(),
            conversation_starts = records.iter().filter(|r| r.starts_conversation()).count(),
            accounting = %self.config.accounting,
            "Built context windows"
        );

        Ok(records)
    }

    /// Build the context record of the message at `index`.
    ///
    /// Applies the same whole-log checks as [`build`](Self::build), so both
    /// agree on which logs are valid.
    pub fn build_at(&self, log: &ChatLog, index: usize) -> ParleyResult<ContextRecord> {
        log.get(index)?;
        self.check_annotated(log)?;
        self.check_order(log)?;
        self.window_at(log, index)
    }

    fn check_annotated(&self, log: &ChatLog) -> ParleyResult<()> {
        match log.first_missing_token_length() {
            Some(index) => Err(WindowError::MissingTokenLength { index }.into()),
            None => Ok(()),
        }
    }

    fn check_order(&self, log: &ChatLog) -> ParleyResult<()> {
        if !self.config.require_sorted {
            return Ok(());
        }
        match log.first_unsorted_index() {
            Some(index) => Err(WindowError::UnsortedLog { index }.into()),
            None => Ok(()),
        }
    }

    fn window_at(&self, log: &ChatLog, index: usize) -> ParleyResult<ContextRecord> {
        let target = log.get(index)?;
        let overhead = self.config.overhead();
        let mut prompt = prompt_header(&target.sender);

        if index == 0 {
            prompt.push_str(START_MARKER);
            return Ok(ContextRecord {
                index,
                prompt,
                context_length: 0,
                total_tokens: overhead,
            });
        }

        let mut scan = WindowScan::open(
            gap_to(target, log.get(index - 1)?),
            overhead.saturating_add(log.token_length_at(index - 1)?),
        );
        let mut reported = match self.config.accounting {
            TokenAccounting::Legacy => scan.budget,
            TokenAccounting::Exact => overhead,
        };

        if !scan.admits(&self.config) {
            prompt.push_str(START_MARKER);
            return Ok(ContextRecord {
                index,
                prompt,
                context_length: 0,
                total_tokens: reported,
            });
        }

        // newest first
        let mut turns: Vec<String> = Vec::new();
        let mut k = 1;
        while scan.admits(&self.config) && k <= index {
            let j = index - k;
            turns.push(log.get(j)?.turn());
            reported = reported.saturating_add(log.token_length_at(j)?);
            k += 1;

            if k <= index {
                let candidate = log.get(index - k)?;
                scan.advance(gap_to(target, candidate), log.token_length_at(index - k)?);
            } else {
                scan.exhaust();
            }
        }

        let context_length = turns.len();
        let context = turns
            .iter()
            .rev()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&context);

        tracing::trace!(index, context_length, total_tokens = reported, "Context window");

        Ok(ContextRecord {
            index,
            prompt,
            context_length,
            total_tokens: reported,
        })
    }
}

fn gap_to(target: &Message, candidate: &Message) -> i64 {
    gap_seconds(target.timestamp, candidate.timestamp)
}

// ============================================================================
// SUMMARY
// ============================================================================

/// Aggregate figures over a set of records, for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub records: usize,
    pub conversation_starts: usize,
    pub max_context_length: usize,
    pub mean_context_length: f64,
    pub max_total_tokens: usize,
}

impl WindowSummary {
    pub fn from_records(records: &[ContextRecord]) -> Self {
        let total_context: usize = records.iter().map(|r| r.context_length).sum();
        Self {
            records: records.len(),
            conversation_starts: records.iter().filter(|r| r.starts_conversation()).count(),
            max_context_length: records.iter().map(|r| r.context_length).max().unwrap_or(0),
            mean_context_length: if records.is_empty() {
                0.0
            } else {
                total_context as f64 / records.len() as f64
            },
            max_total_tokens: records.iter().map(|r| r.total_tokens).max().unwrap_or(0),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
