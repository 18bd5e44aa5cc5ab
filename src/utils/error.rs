use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Upstream request failed with status {status}: {status_text}")]
    UpstreamError { status: u16, status_text: String },

    #[error("Response parse error: {message}")]
    ParseError { message: String },

    #[error("Cache error: {message}")]
    CacheError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    Parsing,
    Cache,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EnrichError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EnrichError::ConfigError { .. } | EnrichError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            EnrichError::ApiError(_) | EnrichError::UpstreamError { .. } => {
                ErrorCategory::Upstream
            }
            EnrichError::ParseError { .. } | EnrichError::SerializationError(_) => {
                ErrorCategory::Parsing
            }
            EnrichError::CacheError { .. } => ErrorCategory::Cache,
            EnrichError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 上游暫時性錯誤，稍後重試通常可以解決
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Parsing | ErrorCategory::Cache => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EnrichError::ConfigError { message } => format!("Configuration problem: {}", message),
            EnrichError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            EnrichError::UpstreamError {
                status,
                status_text,
            } => format!("The search API answered {} {}", status, status_text),
            EnrichError::ApiError(e) if e.is_timeout() => {
                "The search API did not answer in time".to_string()
            }
            EnrichError::ApiError(_) => "Could not reach the search API".to_string(),
            EnrichError::ParseError { .. } | EnrichError::SerializationError(_) => {
                "The search API answer could not be understood".to_string()
            }
            EnrichError::CacheError { message } => format!("Cache failure: {}", message),
            EnrichError::IoError(e) => format!("File system error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EnrichError::ConfigError { .. } => {
                "Check PERPLEXITY_API_KEY and the config file, then try again"
            }
            EnrichError::InvalidConfigValueError { .. } => {
                "Check the PERPLEXITY_* environment variables and the config file values"
            }
            EnrichError::UpstreamError { status, .. } if *status == 401 || *status == 403 => {
                "Verify that the API key is valid and has access to the requested model"
            }
            EnrichError::UpstreamError { status, .. } if *status == 429 => {
                "Rate limited by the search API; wait a moment before retrying"
            }
            EnrichError::UpstreamError { .. } | EnrichError::ApiError(_) => {
                "Check network connectivity and the API endpoint, then retry"
            }
            EnrichError::ParseError { .. } | EnrichError::SerializationError(_) => {
                "Retry the request; the model may answer in the expected format next time"
            }
            EnrichError::CacheError { .. } => {
                "Remove the affected cache file or run with --no-cache"
            }
            EnrichError::IoError(_) => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_includes_status_text() {
        let err = EnrichError::UpstreamError {
            status: 503,
            status_text: "Service Unavailable".to_string(),
        };
        assert!(err.to_string().contains("Service Unavailable"));
        assert_eq!(err.category(), ErrorCategory::Upstream);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = EnrichError::ConfigError {
            message: "PERPLEXITY_API_KEY is not set".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_recovery_suggestion_for_auth_failure() {
        let err = EnrichError::UpstreamError {
            status: 401,
            status_text: "Unauthorized".to_string(),
        };
        assert!(err.recovery_suggestion().contains("API key"));
    }
}
