use crate::errors::Result;
use crate::recovery::types::RuleSet;
use crate::tools::executor::ExecutionConfig;
use crate::tools::retry::RetryConfig;
use crate::tools::security::SanitizerConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Engine configuration, loaded from `~/.toolbuddy/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub sanitizer: SanitizerConfig,

    /// Override for the error-classification rule table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier_rules: Option<RuleSet>,
}

impl Config {
    /// Load configuration from file, creating the default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".toolbuddy").join("config.toml"))
    }

    /// Reject malformed configurations
    pub fn validate(&self) -> Result<()> {
        self.execution.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.execution.enable_fallbacks);
        assert!(config.classifier_rules.is_none());
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = Config::default();
        config.execution.timeout_seconds = 45;
        config.retry.jitter = false;

        let toml_string = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed.execution.timeout_seconds, 45);
        assert!(!parsed.retry.jitter);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [execution]
            max_retries = 5
            timeout_seconds = 10
            enable_fallbacks = false
            parallel = false
            "#,
        )
        .unwrap();

        assert_eq!(parsed.execution.max_retries, 5);
        assert!(!parsed.execution.enable_fallbacks);
        // Sections not present fall back to defaults
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(
            parsed.sanitizer.max_string_length,
            crate::tools::security::DEFAULT_MAX_STRING_LENGTH
        );
    }

    #[test]
    fn test_classifier_rules_section() {
        let parsed: Config = toml::from_str(
            r#"
            [classifier_rules]
            version = "site-1"

            [[classifier_rules.rules]]
            pattern = "quota exhausted"
            error_type = "rate_limit"
            message = "Daily quota used up"
            suggestion = "Wait for the quota to reset"
            can_retry = true
            "#,
        )
        .unwrap();

        let rules = parsed.classifier_rules.unwrap();
        assert_eq!(rules.version, "site-1");
        assert_eq!(rules.rules.len(), 1);
    }

    #[test]
    fn test_invalid_execution_section_rejected() {
        let mut config = Config::default();
        config.execution.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
