use crate::config::{EnrichConfig, SearchContextSize};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional file-based configuration.
///
/// ```toml
/// [api]
/// api_key = "${PERPLEXITY_API_KEY}"
/// model = "sonar"
/// temperature = 0.17
/// search_context_size = "low"
///
/// [cache]
/// dir = "./.playground-cache"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: Option<ApiSection>,
    pub cache: Option<CacheSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub search_context_size: Option<SearchContextSize>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheSection {
    pub dir: Option<String>,
    pub enabled: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PERPLEXITY_API_KEY})，找不到的保留原字串
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env placeholder pattern is valid");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Layer the file's `[api]` values over `base`.
    pub fn apply_to(&self, mut base: EnrichConfig) -> EnrichConfig {
        let Some(api) = &self.api else {
            return base;
        };

        if let Some(key) = api.api_key.as_deref().filter(|k| is_resolved(k)) {
            base.api_key = Some(key.to_string());
        }
        if let Some(endpoint) = api.endpoint.as_deref().filter(|e| is_resolved(e)) {
            base.endpoint = endpoint.to_string();
        }
        if let Some(model) = api.model.as_deref().filter(|m| is_resolved(m)) {
            base.model = model.to_string();
        }
        if let Some(temperature) = api.temperature {
            base.temperature = temperature;
        }
        if let Some(size) = api.search_context_size {
            base.search_context_size = size;
        }
        if let Some(timeout) = api.timeout_seconds {
            base.timeout_seconds = timeout;
        }

        base
    }

    pub fn cache_dir(&self) -> Option<&str> {
        self.cache.as_ref().and_then(|c| c.dir.as_deref())
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.as_ref().and_then(|c| c.enabled).unwrap_or(true)
    }
}

/// Values still holding an unresolved `${VAR}` placeholder are ignored.
fn is_resolved(value: &str) -> bool {
    !value.trim().is_empty() && !(value.starts_with("${") && value.ends_with('}'))
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        if let Some(dir) = self.cache_dir() {
            validate_path("cache.dir", dir)?;
        }

        self.apply_to(EnrichConfig::default()).validate()
    }
}
