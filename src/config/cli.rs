use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "playground-enrich")]
#[command(about = "Look up playground details with an AI search API and cache them by address")]
pub struct CliConfig {
    #[arg(long, help = "Street address of the playground")]
    pub address: String,

    #[arg(long, help = "Playground or park name used to disambiguate the search")]
    pub name: Option<String>,

    #[arg(long, help = "Optional TOML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Directory for cached results (overrides the config file)")]
    pub cache_dir: Option<String>,

    #[arg(long, help = "Skip the cache and always query the API")]
    pub no_cache: bool,

    #[arg(long, help = "Pretty-print the JSON result")]
    pub pretty: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("address", &self.address)?;

        if let Some(dir) = &self.cache_dir {
            validate_path("cache_dir", dir)?;
        }
        if let Some(path) = &self.config {
            validate_path("config", path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let config = CliConfig::parse_from(["playground-enrich", "--address", "1 Elm St"]);
        assert_eq!(config.address, "1 Elm St");
        assert!(config.name.is_none());
        assert!(!config.no_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_address_fails_validation() {
        let config = CliConfig::parse_from(["playground-enrich", "--address", " "]);
        assert!(config.validate().is_err());
    }
}
