pub mod toml_config;

use crate::adapters::{requires_api_key, DEFAULT_ENDPOINT};
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
use serde::{Deserialize, Serialize};
use toml_config::TomlConfig;

pub const DEFAULT_BASE: &str = "USD";
pub const DEFAULT_TARGET: &str = "EUR";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "small-fx"))]
#[cfg_attr(feature = "cli", command(about = "Convert amounts between currencies using live exchange rates"))]
pub struct CliConfig {
    #[cfg_attr(feature = "cli", arg(long, help = "Rate API endpoint [default: freecurrencyapi v1]"))]
    pub endpoint: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, env = "FX_API_KEY", hide_env_values = true))]
    pub api_key: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Currency to convert from [default: USD]"))]
    pub base: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Currency to convert to [default: EUR]"))]
    pub target: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = "1", allow_hyphen_values = true))]
    pub amount: String,

    #[cfg_attr(feature = "cli", arg(long, help = "Swap base and target, converting the result back"))]
    pub swap: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "List available currencies instead of converting"))]
    pub list: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Filter the currency list by code or name"))]
    pub search: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub timeout_seconds: Option<u64>,

    #[cfg_attr(feature = "cli", arg(long, help = "Load settings from a TOML file"))]
    pub config: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Emit logs as JSON"))]
    pub json_logs: bool,
}

impl CliConfig {
    /// Command-line values win; the file fills whatever was left unset.
    pub fn merge_file(mut self, file: &TomlConfig) -> Self {
        if self.endpoint.is_none() {
            self.endpoint = Some(file.source.endpoint.clone());
        }
        if self.api_key.is_none() {
            self.api_key = file.source.api_key.clone();
        }
        if self.timeout_seconds.is_none() {
            self.timeout_seconds = file.source.timeout_seconds;
        }
        if let Some(defaults) = &file.defaults {
            if self.base.is_none() {
                self.base = defaults.base.clone();
            }
            if self.target.is_none() {
                self.target = defaults.target.clone();
            }
        }
        if file.json_logs() {
            self.json_logs = true;
        }
        self
    }
}

impl ConfigProvider for CliConfig {
    fn api_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn default_base(&self) -> &str {
        self.base.as_deref().unwrap_or(DEFAULT_BASE)
    }

    fn default_target(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", self.api_endpoint())?;
        validation::validate_positive_number("timeout_seconds", self.timeout_seconds(), 1)?;
        validation::validate_currency_code("base", self.default_base())?;
        validation::validate_currency_code("target", self.default_target())?;
        if requires_api_key(self.api_endpoint()) {
            validation::validate_required_field("api_key", &self.api_key)?;
        }
        if let Some(key) = &self.api_key {
            validation::validate_non_empty_string("api_key", key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::FxError;

    fn config() -> CliConfig {
        CliConfig {
            amount: "1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let mut config = config();
        config.api_key = Some("test-key".to_string());
        assert_eq!(config.api_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.default_base(), "USD");
        assert_eq!(config.default_target(), "EUR");
        assert_eq!(config.timeout_seconds(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_hosted_endpoint_requires_api_key() {
        let err = config().validate().unwrap_err();
        assert!(matches!(err, FxError::MissingConfigError { ref field } if field == "api_key"));

        let mut local = config();
        local.endpoint = Some("http://localhost:8080/v1".to_string());
        assert!(local.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut bad_base = config();
        bad_base.base = Some("".to_string());
        assert!(bad_base.validate().is_err());

        let mut bad_timeout = config();
        bad_timeout.timeout_seconds = Some(0);
        assert!(bad_timeout.validate().is_err());

        let mut bad_endpoint = config();
        bad_endpoint.endpoint = Some("not a url".to_string());
        assert!(bad_endpoint.validate().is_err());
    }

    #[test]
    fn test_merge_file_keeps_cli_values() {
        let file = TomlConfig::from_toml_str(
            r#"
[source]
endpoint = "https://rates.example.com/v1"
api_key = "file-key"
timeout_seconds = 3

[defaults]
base = "GBP"
target = "JPY"
"#,
        )
        .unwrap();

        let mut cli = config();
        cli.base = Some("CHF".to_string());
        let merged = cli.merge_file(&file);

        assert_eq!(merged.api_endpoint(), "https://rates.example.com/v1");
        assert_eq!(merged.api_key(), Some("file-key"));
        assert_eq!(merged.timeout_seconds(), 3);
        assert_eq!(merged.default_base(), "CHF");
        assert_eq!(merged.default_target(), "JPY");
    }
}
