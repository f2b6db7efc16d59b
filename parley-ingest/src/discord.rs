//! Discord text export parser.
//!
//! Each message starts with a `[29/09/2024 09:15] Sender` header line; the
//! lines below it up to the next header form the body.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use parley_core::{ChatLog, IngestError, Message, ParleyResult};
use regex::Regex;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{2}/\d{2}/\d{4}\s\d{2}:\d{2})\]\s?(.*)$").expect("valid Discord header regex")
});

/// Parse a Discord export into a chat log in export order. Blank body lines
/// are dropped.
pub fn parse(export: &str) -> ParleyResult<ChatLog> {
    let mut messages: Vec<Message> = Vec::new();
    let mut body: Vec<&str> = Vec::new();

    for (line_no, line) in export.lines().enumerate() {
        let line_no = line_no + 1;

        if let Some(caps) = HEADER.captures(line) {
            flush_body(&mut messages, &mut body);

            let value = caps[1].to_string();
            let timestamp = NaiveDateTime::parse_from_str(&value, "%d/%m/%Y %H:%M")
                .map(|naive| naive.and_utc())
                .map_err(|_| IngestError::InvalidTimestamp { line: line_no, value })?;

            let sender = caps[2].trim();
            if sender.is_empty() {
                return Err(IngestError::InvalidHeader {
                    line: line_no,
                    reason: "missing sender".to_string(),
                }
                .into());
            }
            messages.push(Message::new(sender, timestamp, ""));
        } else if messages.is_empty() {
            if !line.trim().is_empty() {
                return Err(IngestError::OrphanLine { line: line_no }.into());
            }
        } else if !line.trim().is_empty() {
            body.push(line);
        }
    }
    flush_body(&mut messages, &mut body);

    if messages.is_empty() {
        return Err(IngestError::NoMessages.into());
    }

    tracing::debug!(messages = messages.len(), "Parsed Discord export");
    Ok(ChatLog::new(messages))
}

fn flush_body(messages: &mut [Message], body: &mut Vec<&str>) {
    if let Some(last) = messages.last_mut() {
        last.text = body.join("\n");
    }
    body.clear();
}
