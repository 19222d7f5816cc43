#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::history::DEFAULT_HISTORY_CAPACITY;
use crate::domain::ports::{ConfigProvider, ResponsePolicy};
use crate::utils::error::{CalcError, Result};
use crate::utils::validation::{self, Validate};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(CalcError::InvalidConfigValue {
                field: "logging.format".to_string(),
                value: other.to_string(),
                reason: "Expected one of: compact, json".to_string(),
            }),
        }
    }
}

/// Effective settings after merging defaults, the settings file and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub timeout: Option<Duration>,
    pub history_capacity: usize,
    pub response_policy: ResponsePolicy,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            response_policy: ResponsePolicy::ApplyAll,
            log_format: LogFormat::Compact,
        }
    }
}

impl Settings {
    /// Layers a settings file over the current values.
    pub fn apply_file(mut self, file: &TomlConfig) -> Result<Self> {
        file.validate()?;
        if let Some(endpoint) = &file.evaluator.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(secs) = file.evaluator.timeout_seconds {
            self.timeout = Some(Duration::from_secs(secs));
        }
        if let Some(capacity) = file.history.capacity {
            self.history_capacity = capacity;
        }
        if let Some(mode) = file.session.stale_responses.as_deref() {
            self.response_policy = match mode {
                "discard" => ResponsePolicy::DiscardStale,
                _ => ResponsePolicy::ApplyAll,
            };
        }
        if let Some(format) = file.logging.format.as_deref() {
            self.log_format = format.parse()?;
        }
        Ok(self)
    }
}

impl ConfigProvider for Settings {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    fn response_policy(&self) -> ResponsePolicy {
        self.response_policy
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", &self.endpoint)?;
        validation::validate_range("history_capacity", self.history_capacity, 1, 1000)?;
        if let Some(timeout) = self.timeout {
            validation::validate_positive_number("timeout_seconds", timeout.as_secs(), 1)?;
        }
        Ok(())
    }
}
