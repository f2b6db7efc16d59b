//! Turns context records into (context, reply) training pairs.

use parley_core::{ChatLog, ContextRecord, ParleyResult, TrainingExample, WindowError};

/// Pair every record's prompt with the text of the message it precedes.
pub fn materialize(log: &ChatLog, records: &[ContextRecord]) -> ParleyResult<Vec<TrainingExample>> {
    if log.len() != records.len() {
        return Err(WindowError::LengthMismatch {
            contexts: records.len(),
            replies: log.len(),
        }
        .into());
    }

    Ok(records
        .iter()
        .zip(log.iter())
        .map(|(record, message)| TrainingExample {
            context: record.prompt.clone(),
            reply: message.text.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextWindowBuilder, START_MARKER};
    use chrono::{TimeZone, Utc};
    use parley_core::{Message, ParleyError, WindowConfig};

    fn log() -> ChatLog {
        let t = |s: i64| Utc.timestamp_opt(1_700_000_000 + s, 0).unwrap();
        ChatLog::new(vec![
            Message::new("A", t(0), "hi").with_token_length(5),
            Message::new("B", t(10), "hey").with_token_length(4),
        ])
    }

    #[test]
    fn test_pairs_prompt_with_reply() {
        let log = log();
        let records = ContextWindowBuilder::new(WindowConfig::default())
            .unwrap()
            .build(&log)
            .unwrap();
        let examples = materialize(&log, &records).unwrap();

        assert_eq!(examples.len(), 2);
        assert!(examples[0].context.ends_with(START_MARKER));
        assert_eq!(examples[0].reply, "hi");
        assert_eq!(examples[1].context, "sender: B | context:\nA: hi");
        assert_eq!(examples[1].reply, "hey");
    }

    #[test]
    fn test_length_mismatch() {
        let err = materialize(&log(), &[]).unwrap_err();
        assert_eq!(
            err,
            ParleyError::Window(WindowError::LengthMismatch {
                contexts: 0,
                replies: 2
            })
        );
    }
}
