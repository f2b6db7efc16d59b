//! Tab-separated message tables.
//!
//! One row per message. Columns are `timestamp`, `sender`, `message`, the
//! derived `duration` and `tokenized_message_with_sender_length`, and for
//! context tables additionally `input`, `context_length`, `total_tokens`.

use chrono::{DateTime, NaiveDateTime, Utc};
use parley_core::{ChatLog, ContextRecord, Message, Timestamp, TrainingExample};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp layout used in every table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors raised while reading or writing tables and lookup files.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Stream(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp in row {row}: {value}")]
    Timestamp { row: usize, value: String },

    #[error("Row count mismatch: {messages} messages but {records} records")]
    RowMismatch { messages: usize, records: usize },
}

impl TableError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attach `path` to a bare stream error.
    fn at(self, path: &Path) -> Self {
        match self {
            Self::Stream(source) => Self::io(path, source),
            other => other,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MessageRow {
    timestamp: String,
    sender: String,
    message: String,
    #[serde(default)]
    duration: Option<i64>,
    #[serde(default)]
    tokenized_message_with_sender_length: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ContextRow<'a> {
    timestamp: String,
    sender: &'a str,
    message: &'a str,
    duration: i64,
    tokenized_message_with_sender_length: Option<usize>,
    input: &'a str,
    context_length: usize,
    total_tokens: usize,
}

pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a table timestamp; RFC 3339 is accepted as well.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader)
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer)
}

/// Read a message table. Extra columns (such as those of a context table) are
/// ignored; a token length column, when present, is carried over.
pub fn read_messages<R: Read>(reader: R) -> Result<ChatLog, TableError> {
    let mut messages = Vec::new();
    for (row, result) in tsv_reader(reader).deserialize::<MessageRow>().enumerate() {
        let record = result?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| TableError::Timestamp {
            row: row + 1,
            value: record.timestamp.clone(),
        })?;
        let mut message = Message::new(record.sender, timestamp, record.message);
        if let Some(length) = record.tokenized_message_with_sender_length {
            message.set_token_length(length);
        }
        messages.push(message);
    }
    tracing::debug!(rows = messages.len(), "Read message table");
    Ok(ChatLog::new(messages))
}

pub fn read_messages_path(path: &Path) -> Result<ChatLog, TableError> {
    let file = File::open(path).map_err(|e| TableError::io(path, e))?;
    read_messages(file)
}

/// Write a message table with reply gaps and any cached token lengths.
pub fn write_messages<W: Write>(writer: W, log: &ChatLog) -> Result<(), TableError> {
    let mut out = tsv_writer(writer);
    for (message, gap) in log.iter().zip(log.reply_gaps()) {
        out.serialize(MessageRow {
            timestamp: format_timestamp(&message.timestamp),
            sender: message.sender.clone(),
            message: message.text.clone(),
            duration: Some(gap),
            tokenized_message_with_sender_length: message.token_length(),
        })?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_messages_path(path: &Path, log: &ChatLog) -> Result<(), TableError> {
    let file = File::create(path).map_err(|e| TableError::io(path, e))?;
    write_messages(BufWriter::new(file), log).map_err(|e| e.at(path))
}

/// Write the message table joined with its context records.
pub fn write_context_table<W: Write>(
    writer: W,
    log: &ChatLog,
    records: &[ContextRecord],
) -> Result<(), TableError> {
    if log.len() != records.len() {
        return Err(TableError::RowMismatch {
            messages: log.len(),
            records: records.len(),
        });
    }

    let mut out = tsv_writer(writer);
    for ((message, record), gap) in log.iter().zip(records).zip(log.reply_gaps()) {
        out.serialize(ContextRow {
            timestamp: format_timestamp(&message.timestamp),
            sender: &message.sender,
            message: &message.text,
            duration: gap,
            tokenized_message_with_sender_length: message.token_length(),
            input: &record.prompt,
            context_length: record.context_length,
            total_tokens: record.total_tokens,
        })?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_context_table_path(
    path: &Path,
    log: &ChatLog,
    records: &[ContextRecord],
) -> Result<(), TableError> {
    let file = File::create(path).map_err(|e| TableError::io(path, e))?;
    write_context_table(BufWriter::new(file), log, records).map_err(|e| e.at(path))
}

/// Write training pairs as JSON Lines.
pub fn write_pairs<W: Write>(mut writer: W, examples: &[TrainingExample]) -> Result<(), TableError> {
    for example in examples {
        serde_json::to_writer(&mut writer, example)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_pairs_path(path: &Path, examples: &[TrainingExample]) -> Result<(), TableError> {
    let file = File::create(path).map_err(|e| TableError::io(path, e))?;
    write_pairs(BufWriter::new(file), examples).map_err(|e| e.at(path))
}

/// Read a JSON lookup file (name or action map).
pub fn read_json_path<T>(path: &Path) -> Result<T, TableError>
where
    T: serde::de::DeserializeOwned,
{
    let file = File::open(path).map_err(|e| TableError::io(path, e))?;
    Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
}

/// `<dir>/<stem><suffix>.<ext>` next to `input`.
pub fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}
