use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TranslatorError};

pub const DEFAULT_CONFIG_FILE: &str = "Application.configuration";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_source_file() -> String {
    "English.lng".to_string()
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_entry_delay_ms() -> u64 {
    100
}

fn default_max_empty_attempts() -> usize {
    3
}

fn default_clear_every() -> usize {
    50
}

fn default_timeout_secs() -> u64 {
    60
}

/// Settings read from `Application.configuration`.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    pub api_key: String,

    pub desired_language: String,

    pub start_from_line: usize,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_source_file")]
    pub source_file: String,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_entry_delay_ms")]
    pub entry_delay_ms: u64,

    #[serde(default = "default_max_empty_attempts")]
    pub max_empty_attempts: usize,

    /// Clear the console every N entries; 0 never clears.
    #[serde(default = "default_clear_every")]
    pub clear_every: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| TranslatorError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&data).map_err(|e| match e {
            TranslatorError::ConfigParse { source, .. } => TranslatorError::ConfigParse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let cfg: AppConfig =
            serde_json::from_str(data).map_err(|source| TranslatorError::ConfigParse {
                path: Default::default(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(TranslatorError::ConfigValue("ApiKey must not be empty".into()));
        }
        if self.desired_language.trim().is_empty() {
            return Err(TranslatorError::ConfigValue(
                "DesiredLanguage must not be empty".into(),
            ));
        }
        if self.max_empty_attempts == 0 {
            return Err(TranslatorError::ConfigValue(
                "MaxEmptyAttempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// `<DesiredLanguage>.lng`
    pub fn output_file_name(&self) -> String {
        format!("{}.lng", self.desired_language.trim())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn entry_delay(&self) -> Duration {
        Duration::from_millis(self.entry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
