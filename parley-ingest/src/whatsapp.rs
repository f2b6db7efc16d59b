//! WhatsApp text export parser.
//!
//! Header lines look like `[29/09/24, 9:15:02 AM] Sender: text`. Any other
//! line continues the message above it.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use parley_core::{ChatLog, IngestError, Message, ParleyResult, Timestamp};
use regex::Regex;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{2}/\d{2}/\d{2}),\s(\d{1,2}:\d{2}:\d{2})\s(AM|PM)\]\s?")
        .expect("valid WhatsApp header regex")
});

/// Left-to-right mark sprinkled through exports around attachments.
const LRM: char = '\u{200e}';

/// Parse a WhatsApp export into a chat log in export order.
pub fn parse(export: &str) -> ParleyResult<ChatLog> {
    let mut messages: Vec<Message> = Vec::new();

    for (line_no, raw) in export.lines().enumerate() {
        let line: String = raw.chars().filter(|c| *c != LRM).collect();
        let line_no = line_no + 1;

        match HEADER.captures(&line) {
            Some(caps) => {
                let timestamp = parse_timestamp(line_no, &caps[1], &caps[2], &caps[3])?;
                let rest = &line[caps.get(0).map_or(0, |m| m.end())..];
                let (sender, text) = match rest.split_once(": ") {
                    Some((sender, text)) => (sender, text),
                    None => (rest, ""),
                };
                messages.push(Message::new(sender, timestamp, text));
            }
            None => match messages.last_mut() {
                Some(last) => {
                    last.text.push('\n');
                    last.text.push_str(&line);
                }
                None => return Err(IngestError::OrphanLine { line: line_no }.into()),
            },
        }
    }

    if messages.is_empty() {
        return Err(IngestError::NoMessages.into());
    }

    tracing::debug!(messages = messages.len(), "Parsed WhatsApp export");
    Ok(ChatLog::new(messages))
}

fn parse_timestamp(line: usize, date: &str, time: &str, meridiem: &str) -> ParleyResult<Timestamp> {
    let value = format!("{} {} {}", date, time, meridiem);
    NaiveDateTime::parse_from_str(&value, "%d/%m/%y %I:%M:%S %p")
        .map(|naive| naive.and_utc())
        .map_err(|_| IngestError::InvalidTimestamp { line, value }.into())
}
