//! Runtime configuration

use std::path::PathBuf;

use thiserror::Error;

use crate::evaluator::{DEFAULT_CONCURRENCY, EvaluateOptions};

pub const DEFAULT_DATABASE: &str = "prun_data.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,
    #[error("invalid log filter '{0}'")]
    EmptyLogFilter(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database: PathBuf,
    pub concurrency: usize,
    pub log_filter: String,
    /// Keep results computed before an interrupted ROI run
    pub keep_partial: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            concurrency: DEFAULT_CONCURRENCY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            keep_partial: false,
        }
    }
}

impl Config {
    pub fn new(
        database: PathBuf,
        concurrency: usize,
        log_filter: Option<String>,
        keep_partial: bool,
    ) -> Result<Self, ConfigError> {
        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        let log_filter = match log_filter {
            Some(f) if f.trim().is_empty() => return Err(ConfigError::EmptyLogFilter(f)),
            Some(f) => f,
            None => DEFAULT_LOG_FILTER.to_string(),
        };

        Ok(Self {
            database,
            concurrency,
            log_filter,
            keep_partial,
        })
    }

    pub fn evaluate_options(&self) -> EvaluateOptions {
        EvaluateOptions {
            concurrency_limit: self.concurrency,
            keep_partial: self.keep_partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_concurrency() {
        assert_eq!(
            Config::new(PathBuf::from("x.db"), 0, None, false),
            Err(ConfigError::ZeroConcurrency)
        );
    }

    #[test]
    fn defaults_log_filter() {
        let config = Config::new(PathBuf::from("x.db"), 8, None, true).unwrap();
        assert_eq!(config.log_filter, "info");
        let options = config.evaluate_options();
        assert_eq!(options.concurrency_limit, 8);
        assert!(options.keep_partial);
    }

    #[test]
    fn rejects_blank_log_filter() {
        assert!(matches!(
            Config::new(PathBuf::from("x.db"), 1, Some("  ".to_string()), false),
            Err(ConfigError::EmptyLogFilter(_))
        ));
    }

    #[test]
    fn default_matches_documented_values() {
        let config = Config::default();
        assert_eq!(config.database, PathBuf::from("prun_data.db"));
        assert_eq!(config.concurrency, 64);
    }
}
