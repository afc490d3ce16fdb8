//! Run configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration that reproduces the standard run: a 90-day window over the
//! S&P 500, top 50 written to `sp500_top50_data.csv`.

use crate::data::universe::DEFAULT_UNIVERSE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Longest accepted trailing window, about a century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoversConfig {
    /// Trailing window length in calendar days.
    pub window_days: u32,
    /// Maximum number of rows in the report.
    pub top_n: usize,
    /// Directory holding one CSV per cached symbol.
    pub cache_dir: PathBuf,
    /// Where the fetched universe is written.
    pub ticker_list_path: PathBuf,
    /// Where the ranked report is written.
    pub report_path: PathBuf,
    /// Listing page whose first table carries a `Symbol` column.
    pub universe_url: String,
    pub http_timeout_secs: u64,
}

impl Default for MoversConfig {
    fn default() -> Self {
        Self {
            window_days: 90,
            top_n: 50,
            cache_dir: PathBuf::from("data"),
            ticker_list_path: PathBuf::from("ticker_list.csv"),
            report_path: PathBuf::from("sp500_top50_data.csv"),
            universe_url: DEFAULT_UNIVERSE_URL.to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl MoversConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string and validate it.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 {
            return Err(ConfigError::Invalid("window_days must be at least 1".into()));
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "window_days must be at most {MAX_WINDOW_DAYS}, got {}",
                self.window_days
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = MoversConfig::from_toml("").unwrap();
        assert_eq!(config, MoversConfig::default());
        assert_eq!(config.window_days, 90);
        assert_eq!(config.top_n, 50);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = MoversConfig::from_toml(
            r#"
            window_days = 30
            cache_dir = "/tmp/prices"
            "#,
        )
        .unwrap();
        assert_eq!(config.window_days, 30);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/prices"));
        assert_eq!(config.top_n, 50);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert!(matches!(
            MoversConfig::from_toml("top_n = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MoversConfig::from_toml("window_days = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn oversized_window_is_rejected() {
        assert!(matches!(
            MoversConfig::from_toml("window_days = 4000000000"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            MoversConfig::from_toml("window_days = 36501"),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(
            MoversConfig::from_toml("window_days = 36500").unwrap().window_days,
            MAX_WINDOW_DAYS
        );
    }

    #[test]
    fn unknown_types_fail_to_parse() {
        assert!(matches!(
            MoversConfig::from_toml("top_n = \"fifty\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let config = MoversConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(MoversConfig::from_toml(&text).unwrap(), config);
    }
}
