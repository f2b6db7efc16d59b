//! Error types for PARLEY operations

use thiserror::Error;

/// Context window errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Index {index} out of range for chat log of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("Message {index} has no precomputed token length")]
    MissingTokenLength { index: usize },

    #[error("Chat log is not sorted by timestamp at index {index}")]
    UnsortedLog { index: usize },

    #[error("Length mismatch: {contexts} contexts but {replies} replies")]
    LengthMismatch { contexts: usize, replies: usize },
}

/// Tokenization oracle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Tokenizer {oracle} unavailable: {reason}")]
    Unavailable { oracle: String, reason: String },

    #[error("Tokenization failed: {reason}")]
    Failed { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Raw export ingestion errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Export contains no messages")]
    NoMessages,

    #[error("Line {line} continues a message but no message header precedes it")]
    OrphanLine { line: usize },

    #[error("Invalid timestamp on line {line}: {value}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("Invalid message header on line {line}: {reason}")]
    InvalidHeader { line: usize, reason: String },
}

/// Master error type for all PARLEY errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParleyError {
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),
}

/// Result type alias for PARLEY operations.
pub type ParleyResult<T> = Result<T, ParleyError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_error_display_out_of_range() {
        let err = WindowError::OutOfRange { index: 7, len: 3 };
        let msg = format!("{}", err);
        assert!(msg.contains("out of range"));
        assert!(msg.contains('7'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_window_error_display_missing_token_length() {
        let err = WindowError::MissingTokenLength { index: 12 };
        let msg = format!("{}", err);
        assert!(msg.contains("token length"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_oracle_error_display_unavailable() {
        let err = OracleError::Unavailable {
            oracle: "cl100k_base".to_string(),
            reason: "missing ranks".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("cl100k_base"));
        assert!(msg.contains("missing ranks"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "max_tokens".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("max_tokens"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_ingest_error_display_invalid_timestamp() {
        let err = IngestError::InvalidTimestamp {
            line: 4,
            value: "31/02/24, 9:00:00 AM".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("line 4"));
        assert!(msg.contains("31/02/24"));
    }

    #[test]
    fn test_parley_error_from_variants() {
        let window = ParleyError::from(WindowError::UnsortedLog { index: 1 });
        assert!(matches!(window, ParleyError::Window(_)));

        let oracle = ParleyError::from(OracleError::Failed {
            reason: "boom".to_string(),
        });
        assert!(matches!(oracle, ParleyError::Oracle(_)));

        let config = ParleyError::from(ConfigError::InvalidValue {
            field: "window_seconds".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(matches!(config, ParleyError::Config(_)));

        let ingest = ParleyError::from(IngestError::NoMessages);
        assert!(matches!(ingest, ParleyError::Ingest(_)));
    }
}
