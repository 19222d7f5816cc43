use super::toml_config::TomlConfig;
use super::{LogFormat, Settings, DEFAULT_ENDPOINT};
use crate::core::history::DEFAULT_HISTORY_CAPACITY;
use crate::domain::ports::ResponsePolicy;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "remote-calc")]
#[command(about = "Keypad calculator backed by a remote calculation service")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_ENDPOINT, help = "Base URL of the calculation service")]
    pub endpoint: String,

    #[arg(long, help = "Settings file (TOML); its values override the defaults")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Per-request timeout; requests never time out when unset")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    #[arg(long, help = "Drop answers overtaken by a newer request or a clear")]
    pub discard_stale: bool,

    #[arg(long, value_parser = ["compact", "json"])]
    pub log_format: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Flags first, then the settings file, then flags that were set explicitly.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = Settings {
            endpoint: self.endpoint.clone(),
            history_capacity: self.history_capacity,
            ..Settings::default()
        };

        if let Some(path) = &self.config {
            tracing::debug!("Loading settings from {}", path.display());
            settings = settings.apply_file(&TomlConfig::from_file(path)?)?;
        }

        if let Some(secs) = self.timeout_seconds {
            settings.timeout = Some(Duration::from_secs(secs));
        }
        if self.discard_stale {
            settings.response_policy = ResponsePolicy::DiscardStale;
        }
        if let Some(format) = &self.log_format {
            settings.log_format = format.parse::<LogFormat>()?;
        }
        Ok(settings)
    }
}
