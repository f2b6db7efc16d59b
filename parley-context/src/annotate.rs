//! Token-length annotation.
//!
//! Single pass over a chat log that asks the oracle for the length of each
//! message's turn. Lengths already present are reused, so a log is never
//! tokenized twice.

use parley_core::{ChatLog, ParleyResult, TokenOracle};

/// Outcome of an annotation pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnnotationStats {
    /// Messages sent to the oracle
    pub tokenized: usize,
    /// Messages that already carried a length
    pub cached: usize,
    /// Longest turn, in tokens
    pub max_length: usize,
    /// Mean turn length, in tokens
    pub mean_length: f64,
}

/// Annotate every unannotated message of `log` in place.
pub fn annotate_in_place<O>(log: &mut ChatLog, oracle: &O) -> ParleyResult<AnnotationStats>
where
    O: TokenOracle + ?Sized,
{
    let mut stats = AnnotationStats::default();
    let mut total = 0usize;

    for message in log.iter_mut() {
        let length = match message.token_length() {
            Some(length) => {
                stats.cached += 1;
                length
            }
            None => {
                let length = oracle.token_length(&message.turn())?;
                message.set_token_length(length);
                stats.tokenized += 1;
                length
            }
        };
        total = total.saturating_add(length);
        stats.max_length = stats.max_length.max(length);
    }

    if !log.is_empty() {
        stats.mean_length = total as f64 / log.len() as f64;
    }

    tracing::info!(
        oracle = oracle.name(),
        tokenized = stats.tokenized,
        cached = stats.cached,
        max_length = stats.max_length,
        mean_length = stats.mean_length,
        "Annotated token lengths"
    );

    Ok(stats)
}

/// Annotate `log` and hand it back.
pub fn annotate<O>(mut log: ChatLog, oracle: &O) -> ParleyResult<ChatLog>
where
    O: TokenOracle + ?Sized,
{
    annotate_in_place(&mut log, oracle)?;
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parley_core::{HeuristicOracle, Message, OracleError, ParleyError};
    use std::cell::RefCell;

    /// Counts characters and remembers every input it saw.
    struct RecordingOracle {
        seen: RefCell<Vec<String>>,
    }

    impl TokenOracle for RecordingOracle {
        fn token_length(&self, text: &str) -> ParleyResult<usize> {
            self.seen.borrow_mut().push(text.to_string());
            Ok(text.chars().count())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct BrokenOracle;

    impl TokenOracle for BrokenOracle {
        fn token_length(&self, _text: &str) -> ParleyResult<usize> {
            Err(OracleError::Failed {
                reason: "model not loaded".to_string(),
            }
            .into())
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn log() -> ChatLog {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        ChatLog::new(vec![
            Message::new("A", t, "hi"),
            Message::new("B", t, "hey").with_token_length(99),
            Message::new("A", t, "sup"),
        ])
    }

    #[test]
    fn test_annotates_turn_strings_once() {
        let oracle = RecordingOracle {
            seen: RefCell::new(Vec::new()),
        };
        let mut log = log();
        let stats = annotate_in_place(&mut log, &oracle).unwrap();

        assert_eq!(*oracle.seen.borrow(), vec!["A: hi".to_string(), "A: sup".to_string()]);
        assert_eq!(stats.tokenized, 2);
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.max_length, 99);
        assert_eq!(log.first_missing_token_length(), None);
        assert_eq!(log.token_length_at(0).unwrap(), 5);
        assert_eq!(log.token_length_at(1).unwrap(), 99);
    }

    #[test]
    fn test_huge_cached_lengths_do_not_overflow() {
        let t = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut log = ChatLog::new(vec![
            Message::new("A", t, "wall").with_token_length(usize::MAX),
            Message::new("B", t, "ok").with_token_length(5),
        ]);
        let stats = annotate_in_place(&mut log, &HeuristicOracle).unwrap();
        assert_eq!(stats.cached, 2);
        assert_eq!(stats.max_length, usize::MAX);
        assert!(stats.mean_length > 0.0);
    }

    #[test]
    fn test_second_pass_uses_cache() {
        let oracle = RecordingOracle {
            seen: RefCell::new(Vec::new()),
        };
        let log = annotate(log(), &oracle).unwrap();
        let log = annotate(log, &oracle).unwrap();
        assert_eq!(oracle.seen.borrow().len(), 2);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_oracle_failure_propagates() {
        let err = annotate(log(), &BrokenOracle).unwrap_err();
        assert!(matches!(err, ParleyError::Oracle(OracleError::Failed { .. })));
    }

    #[test]
    fn test_dyn_oracle() {
        let oracle: Box<dyn TokenOracle> = Box::new(HeuristicOracle);
        let log = annotate(log(), oracle.as_ref()).unwrap();
        assert_eq!(log.token_length_at(2).unwrap(), 5);
    }

    #[test]
    fn test_empty_log() {
        let stats = annotate_in_place(&mut ChatLog::default(), &HeuristicOracle).unwrap();
        assert_eq!(stats, AnnotationStats::default());
    }
}
