//! PARLEY Core - Chat Log Types
//!
//! Pure data structures shared by every other crate: messages, the ordered
//! chat log, context records and training examples, plus the error taxonomy,
//! window configuration and the tokenization oracle boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod oracle;

pub use config::{
    TokenAccounting, WindowConfig, CONTEXT_OVERHEAD, MAX_TOKENS, SENDER_OVERHEAD, WINDOW_SECONDS,
};
pub use error::{
    ConfigError, IngestError, OracleError, ParleyError, ParleyResult, WindowError,
};
pub use oracle::{estimate_tokens, HeuristicOracle, TokenOracle};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Whole seconds elapsed from `earlier` to `later`. Negative when the pair is
/// out of order.
pub fn gap_seconds(later: Timestamp, earlier: Timestamp) -> i64 {
    (later - earlier).num_seconds()
}

// ============================================================================
// MESSAGE
// ============================================================================

/// One chat utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message
    pub sender: String,
    /// When the message was sent
    pub timestamp: Timestamp,
    /// Raw utterance content, may contain newlines
    pub text: String,
    /// Cached token length of `"{sender}: {text}"`
    #[serde(default)]
    token_length: Option<usize>,
}

impl Message {
    /// Create a message without a token length.
    pub fn new(sender: impl Into<String>, timestamp: Timestamp, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            timestamp,
            text: text.into(),
            token_length: None,
        }
    }

    /// Set the token length up front.
    pub fn with_token_length(mut self, token_length: usize) -> Self {
        self.token_length = Some(token_length);
        self
    }

    /// The turn as it appears in a context window: `"{sender}: {text}"`.
    pub fn turn(&self) -> String {
        format!("{}: {}", self.sender, self.text)
    }

    /// Cached token length, if annotated.
    pub fn token_length(&self) -> Option<usize> {
        self.token_length
    }

    /// Record the token length. A length that is already set is never
    /// overwritten; returns whether the value was stored.
    pub fn set_token_length(&mut self, token_length: usize) -> bool {
        if self.token_length.is_some() {
            return false;
        }
        self.token_length = Some(token_length);
        true
    }
}

// ============================================================================
// CHAT LOG
// ============================================================================

/// Chronologically ordered sequence of messages. Index order is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatLog {
    messages: Vec<Message>,
}

impl ChatLog {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Message> {
        self.messages.iter_mut()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Message at `index`, or `OutOfRange`.
    pub fn get(&self, index: usize) -> ParleyResult<&Message> {
        self.messages.get(index).ok_or_else(|| {
            WindowError::OutOfRange {
                index,
                len: self.messages.len(),
            }
            .into()
        })
    }

    /// Cached token length at `index`, or `OutOfRange` / `MissingTokenLength`.
    pub fn token_length_at(&self, index: usize) -> ParleyResult<usize> {
        self.get(index)?
            .token_length()
            .ok_or_else(|| WindowError::MissingTokenLength { index }.into())
    }

    /// Index of the first message without a token length.
    pub fn first_missing_token_length(&self) -> Option<usize> {
        self.messages.iter().position(|m| m.token_length.is_none())
    }

    /// Index of the first message older than its predecessor.
    pub fn first_unsorted_index(&self) -> Option<usize> {
        self.messages
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
            .map(|pos| pos + 1)
    }

    pub fn is_sorted(&self) -> bool {
        self.first_unsorted_index().is_none()
    }

    /// Stable sort by timestamp, keeping export order for ties.
    pub fn sort_chronologically(&mut self) {
        self.messages.sort_by_key(|m| m.timestamp);
    }

    /// Seconds since the previous message; the first message gets 0.
    pub fn reply_gaps(&self) -> Vec<i64> {
        let mut gaps = Vec::with_capacity(self.messages.len());
        let mut previous: Option<Timestamp> = None;
        for message in &self.messages {
            gaps.push(previous.map_or(0, |prev| gap_seconds(message.timestamp, prev)));
            previous = Some(message.timestamp);
        }
        gaps
    }

    /// Drop messages whose text exceeds `max_chars` characters. Returns the
    /// number of messages removed; survivors are re-indexed from 0.
    pub fn retain_max_chars(&mut self, max_chars: usize) -> usize {
        let before = self.messages.len();
        self.messages.retain(|m| m.text.chars().count() <= max_chars);
        before - self.messages.len()
    }

    /// Keep only messages matching `keep`. Returns the number removed.
    pub fn retain<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Message) -> bool,
    {
        let before = self.messages.len();
        self.messages.retain(keep);
        before - self.messages.len()
    }
}

impl From<Vec<Message>> for ChatLog {
    fn from(messages: Vec<Message>) -> Self {
        Self::new(messages)
    }
}

impl FromIterator<Message> for ChatLog {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ChatLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

impl IntoIterator for ChatLog {
    type Item = Message;
    type IntoIter = std::vec::IntoIter<Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

// ============================================================================
// DERIVED OUTPUTS
// ============================================================================

/// Context built for one message, ordinal-aligned with the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Index of the source message
    pub index: usize,
    /// Header plus either the start marker or the prior turns
    pub prompt: String,
    /// Number of prior messages folded into the prompt
    pub context_length: usize,
    /// Reported token total
    pub total_tokens: usize,
}

impl ContextRecord {
    /// True when no prior message was included.
    pub fn starts_conversation(&self) -> bool {
        self.context_length == 0
    }
}

/// A (context, reply) pair ready for a dataset adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub context: String,
    pub reply: String,
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// After a chronological sort every reply gap is non-negative and the
        /// gaps sum to the span of the log.
        #[test]
        fn prop_sorted_log_has_non_negative_gaps(
            offsets in prop::collection::vec(0i64..1_000_000, 1..40),
        ) {
            let mut log: ChatLog = offsets
                .iter()
                .map(|o| Message::new("A", Utc.timestamp_opt(1_600_000_000 + o, 0).unwrap(), "x"))
                .collect();
            log.sort_chronologically();
            prop_assert!(log.is_sorted());

            let gaps = log.reply_gaps();
            prop_assert_eq!(gaps.len(), log.len());
            prop_assert!(gaps.iter().all(|g| *g >= 0));

            let span = gap_seconds(log.messages()[log.len() - 1].timestamp, log.messages()[0].timestamp);
            prop_assert_eq!(gaps.iter().sum::<i64>(), span);
        }
    }
}
