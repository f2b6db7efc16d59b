//! Tokenization oracle boundary.
//!
//! The builder never tokenizes; oracles are only consulted by annotation.

use crate::ParleyResult;

/// Converts a string into its token count.
///
/// Implementations must be deterministic: the same input always yields the
/// same count.
pub trait TokenOracle {
    /// Token count of `text`.
    fn token_length(&self, text: &str) -> ParleyResult<usize>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

impl<T: TokenOracle + ?Sized> TokenOracle for &T {
    fn token_length(&self, text: &str) -> ParleyResult<usize> {
        (**self).token_length(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: TokenOracle + ?Sized> TokenOracle for Box<T> {
    fn token_length(&self, text: &str) -> ParleyResult<usize> {
        (**self).token_length(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Estimate token count for text.
/// Rough estimate: ~0.75 tokens per byte (English).
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() as f64 * 0.75).ceil() as usize
}

/// Oracle backed by [`estimate_tokens`]. Needs no model files.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicOracle;

impl TokenOracle for HeuristicOracle {
    fn token_length(&self, text: &str) -> ParleyResult<usize> {
        Ok(estimate_tokens(text))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_empty() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_estimate_tokens_short() {
        // "hello" = 5 bytes * 0.75 = 3.75, ceil = 4
        assert_eq!(estimate_tokens("hello"), 4);
    }

    #[test]
    fn test_estimate_tokens_longer() {
        let text = "a".repeat(100);
        assert_eq!(estimate_tokens(&text), 75);
    }

    #[test]
    fn test_heuristic_oracle_through_reference() {
        let oracle = HeuristicOracle;
        let by_ref: &dyn TokenOracle = &oracle;
        assert_eq!(by_ref.token_length("A: hi").unwrap(), 4);
        assert_eq!(by_ref.name(), "heuristic");
    }
}
