//! PARLEY Ingest - Raw Exports and Message Tables
//!
//! Turns chat exports into normalized chat logs and moves chat logs, context
//! records and training pairs in and out of files.

pub mod discord;
pub mod normalize;
pub mod table;
pub mod whatsapp;

pub use normalize::{normalize, ActionMap, NameMap, NormalizeOptions, DOCUMENT_OMITTED};
pub use table::{
    format_timestamp, parse_timestamp, read_json_path, read_messages, read_messages_path,
    sibling_path, write_context_table, write_context_table_path, write_messages,
    write_messages_path, write_pairs, write_pairs_path, TableError, TIMESTAMP_FORMAT,
};

use parley_core::{ChatLog, ConfigError, ParleyResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat export flavours understood by [`parse_export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[serde(rename = "whatsapp")]
    WhatsApp,
    Discord,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::WhatsApp => "whatsapp",
            Platform::Discord => "discord",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "whatsapp" => Ok(Platform::WhatsApp),
            "discord" => Ok(Platform::Discord),
            other => Err(ConfigError::InvalidValue {
                field: "platform".to_string(),
                value: other.to_string(),
                reason: "expected 'whatsapp' or 'discord'".to_string(),
            }),
        }
    }
}

/// Parse a raw export of the given platform, in export order.
pub fn parse_export(platform: Platform, export: &str) -> ParleyResult<ChatLog> {
    match platform {
        Platform::WhatsApp => whatsapp::parse(export),
        Platform::Discord => discord::parse(export),
    }
}
