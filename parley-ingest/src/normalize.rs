//! Post-parse normalization: sender filtering, chronological order, name
//! replacement, attachment collapsing and action phrases.

use parley_core::{ChatLog, Message};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Marker WhatsApp writes in place of a shared document.
pub const DOCUMENT_OMITTED: &str = "document omitted";

/// Substring replacements applied to senders and texts, e.g. phone numbers or
/// nicknames mapped to canonical names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameMap(BTreeMap<String, String>);

impl NameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.0.insert(from.into(), to.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every replacement, longest key first so that a key never
    /// clobbers part of a longer one.
    pub fn apply(&self, input: &str) -> String {
        let mut keys: Vec<&String> = self.0.keys().filter(|k| !k.is_empty()).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut output = input.to_string();
        for key in keys {
            if let Some(replacement) = self.0.get(key) {
                output = output.replace(key.as_str(), replacement);
            }
        }
        output
    }
}

impl FromIterator<(String, String)> for NameMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Whole-message phrases rewritten as third-person actions: a text equal to
/// a key becomes `"{sender} {action}"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionMap(HashMap<String, String>);

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, phrase: impl Into<String>, action: impl Into<String>) -> Self {
        self.0.insert(phrase.into(), action.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn apply(&self, sender: &str, text: &str) -> Option<String> {
        self.0
            .get(text)
            .map(|action| format!("{} {}", sender, action))
    }
}

impl FromIterator<(String, String)> for ActionMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Options for [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Senders whose messages are dropped (e.g. the group itself)
    pub exclude_senders: Vec<String>,
    pub names: NameMap,
    pub actions: ActionMap,
    /// Replace any text mentioning an omitted document with the bare marker
    pub collapse_attachments: bool,
}

impl NormalizeOptions {
    pub fn new() -> Self {
        Self {
            collapse_attachments: true,
            ..Self::default()
        }
    }

    pub fn exclude_sender(mut self, sender: impl Into<String>) -> Self {
        self.exclude_senders.push(sender.into());
        self
    }

    pub fn with_names(mut self, names: NameMap) -> Self {
        self.names = names;
        self
    }

    pub fn with_actions(mut self, actions: ActionMap) -> Self {
        self.actions = actions;
        self
    }
}

/// Clean up a freshly parsed log.
///
/// Steps, in order: drop excluded senders, stable-sort by timestamp, apply
/// name replacements to sender and text, collapse attachment notices, then
/// rewrite action phrases using the renamed sender.
pub fn normalize(mut log: ChatLog, options: &NormalizeOptions) -> ChatLog {
    let dropped = log.retain(|m| !options.exclude_senders.iter().any(|s| s == &m.sender));
    log.sort_chronologically();

    let mut actions_applied = 0usize;
    let messages: Vec<Message> = log
        .into_iter()
        .map(|mut message| {
            if !options.names.is_empty() {
                message.sender = options.names.apply(&message.sender);
                message.text = options.names.apply(&message.text);
            }
            if options.collapse_attachments && message.text.contains(DOCUMENT_OMITTED) {
                message.text = DOCUMENT_OMITTED.to_string();
            }
            if let Some(action) = options.actions.apply(&message.sender, &message.text) {
                message.text = action;
                actions_applied += 1;
            }
            message
        })
        .collect();

    tracing::debug!(
        kept = messages.len(),
        dropped,
        actions_applied,
        "Normalized chat log"
    );

    ChatLog::new(messages)
}
