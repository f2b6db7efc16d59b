//! Configuration loading for the PARLEY CLI.
//!
//! Every field is optional in the file; missing fields take the pipeline
//! defaults. Command-line flags are applied on top by the caller.

use crate::oracle::OracleKind;
use crate::telemetry::LogFormat;
use parley_core::{ParleyError, WindowConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Messages longer than this many characters are dropped before annotation.
pub const MAX_MESSAGE_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub window: WindowConfig,
    pub max_message_chars: usize,
    pub oracle: OracleKind,
    pub log_format: LogFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            max_message_chars: MAX_MESSAGE_CHARS,
            oracle: OracleKind::default(),
            log_format: LogFormat::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(transparent)]
    Window(#[from] ParleyError),
}

impl PipelineConfig {
    /// Load from `path` when given (from `--config` or `PARLEY_CONFIG`),
    /// otherwise start from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_chars == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_message_chars",
                reason: "must be > 0".to_string(),
            });
        }
        self.window.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::TokenAccounting;

    #[test]
    fn test_empty_file_is_default() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.max_message_chars, 200);
        assert_eq!(config.window.max_tokens, 450);
    }

    #[test]
    fn test_window_table() {
        let config = PipelineConfig::from_toml(
            r#"
            oracle = "heuristic"
            max_message_chars = 500

            [window]
            max_tokens = 1024
            accounting = "exact"
            "#,
        )
        .unwrap();
        assert_eq!(config.oracle, OracleKind::Heuristic);
        assert_eq!(config.max_message_chars, 500);
        assert_eq!(config.window.max_tokens, 1024);
        assert_eq!(config.window.window_seconds, 3600);
        assert_eq!(config.window.accounting, TokenAccounting::Exact);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = PipelineConfig::from_toml("max_tokens = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_zero_chars() {
        let config = PipelineConfig {
            max_message_chars: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "max_message_chars",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_checks_window() {
        let config = PipelineConfig::from_toml("[window]\nmax_tokens = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Window(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "[window]\nwindow_seconds = 600\n").unwrap();

        let config = PipelineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.window.window_seconds, 600);

        let missing = PipelineConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
