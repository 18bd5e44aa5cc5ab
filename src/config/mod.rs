#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

pub const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_MODEL: &str = "sonar";
pub const DEFAULT_TEMPERATURE: f64 = 0.17;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_CACHE_DIR: &str = "./.playground-cache";

pub const ENV_API_KEY: &str = "PERPLEXITY_API_KEY";
pub const ENV_MODEL: &str = "PERPLEXITY_MODEL";
pub const ENV_TEMPERATURE: &str = "PERPLEXITY_TEMPERATURE";
pub const ENV_SEARCH_CONTEXT_SIZE: &str = "PERPLEXITY_SEARCH_CONTEXT_SIZE";
pub const ENV_ENDPOINT: &str = "PERPLEXITY_ENDPOINT";
pub const ENV_TIMEOUT_SECONDS: &str = "PERPLEXITY_TIMEOUT_SECONDS";

/// How much web context the search API gathers per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchContextSize {
    #[default]
    Low,
    Medium,
    High,
}

impl SearchContextSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchContextSize::Low => "low",
            SearchContextSize::Medium => "medium",
            SearchContextSize::High => "high",
        }
    }
}

impl fmt::Display for SearchContextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchContextSize {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(SearchContextSize::Low),
            "medium" => Ok(SearchContextSize::Medium),
            "high" => Ok(SearchContextSize::High),
            other => Err(EnrichError::InvalidConfigValueError {
                field: "search_context_size".to_string(),
                value: other.to_string(),
                reason: "Expected one of: low, medium, high".to_string(),
            }),
        }
    }
}

/// Settings for the enrichment fetcher.
///
/// | field                 | env var                           | default                                      |
/// |-----------------------|-----------------------------------|----------------------------------------------|
/// | `api_key`             | `PERPLEXITY_API_KEY`              | none (the fetcher fails without it)          |
/// | `endpoint`            | `PERPLEXITY_ENDPOINT`             | `https://api.perplexity.ai/chat/completions` |
/// | `model`               | `PERPLEXITY_MODEL`                | `sonar`                                      |
/// | `temperature`         | `PERPLEXITY_TEMPERATURE`          | `0.17`                                       |
/// | `search_context_size` | `PERPLEXITY_SEARCH_CONTEXT_SIZE`  | `low`                                        |
/// | `timeout_seconds`     | `PERPLEXITY_TIMEOUT_SECONDS`      | `30`                                         |
#[derive(Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f64,
    pub search_context_size: SearchContextSize,
    pub timeout_seconds: u64,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            search_context_size: SearchContextSize::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

// API key 不輸出到日誌
impl fmt::Debug for EnrichConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("search_context_size", &self.search_context_size)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl EnrichConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = get(ENV_API_KEY);

        if let Some(endpoint) = get(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(raw) = get(ENV_TEMPERATURE) {
            config.temperature =
                raw.trim()
                    .parse()
                    .map_err(|_| EnrichError::InvalidConfigValueError {
                        field: ENV_TEMPERATURE.to_string(),
                        value: raw.clone(),
                        reason: "Expected a decimal number".to_string(),
                    })?;
        }
        if let Some(raw) = get(ENV_SEARCH_CONTEXT_SIZE) {
            config.search_context_size = raw.parse()?;
        }
        if let Some(raw) = get(ENV_TIMEOUT_SECONDS) {
            config.timeout_seconds =
                raw.trim()
                    .parse()
                    .map_err(|_| EnrichError::InvalidConfigValueError {
                        field: ENV_TIMEOUT_SECONDS.to_string(),
                        value: raw.clone(),
                        reason: "Expected a whole number of seconds".to_string(),
                    })?;
        }

        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The API key, if set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Validate for EnrichConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_url("endpoint", &self.endpoint)?;
        validate_non_empty_string("model", &self.model)?;
        validate_range("temperature", self.temperature, 0.0, 2.0)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds, 1)?;

        Ok(())
    }
}
