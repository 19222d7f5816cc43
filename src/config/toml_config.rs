use crate::utils::error::{CalcError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STALE_RESPONSE_MODES: [&str; 2] = ["apply", "discard"];
pub const LOG_FORMATS: [&str; 2] = ["compact", "json"];

/// Optional settings file. Every section and key may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub evaluator: EvaluatorSection,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluatorSection {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistorySection {
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    /// `"apply"` or `"discard"`.
    pub stale_responses: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `"compact"` or `"json"`.
    pub format: Option<String>,
}

impl TomlConfig {
    /// Loads and parses a settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CalcError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CalcError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_REF: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REF.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.evaluator.endpoint {
            validation::validate_url("evaluator.endpoint", endpoint)?;
        }
        if let Some(timeout) = self.evaluator.timeout_seconds {
            validation::validate_positive_number("evaluator.timeout_seconds", timeout, 1)?;
        }
        if let Some(capacity) = self.history.capacity {
            validation::validate_range("history.capacity", capacity, 1, 1000)?;
        }
        if let Some(mode) = &self.session.stale_responses {
            validation::validate_one_of("session.stale_responses", mode, &STALE_RESPONSE_MODES)?;
        }
        if let Some(format) = &self.logging.format {
            validation::validate_one_of("logging.format", format, &LOG_FORMATS)?;
        }
        Ok(())
    }
}
