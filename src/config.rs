use crate::error::{Result, UniqueJobError};
use crate::unique::{RegistryWriteMode, UniqueJobsConfig};
use crate::utils::{get_env_with_prefix, parse_env_with_prefix};
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub unique: UniqueJobsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_unique_config(mut self, unique: UniqueJobsConfig) -> Self {
        self.config.unique = unique;
        self
    }

    pub fn with_write_mode(mut self, write_mode: RegistryWriteMode) -> Self {
        self.config.unique.write_mode = write_mode;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.unique.key_prefix = prefix.into();
        self
    }

    /// Load configuration from environment variables with TIDEWAY_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = parse_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json;
        }

        self.config.unique = UniqueJobsConfig::from_env();

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The log level is not one of trace, debug, info, warn, error
    /// - The key prefix is empty
    /// - Compare-and-swap is selected with zero attempts
    pub fn build(self) -> Result<Config> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(UniqueJobError::config(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.unique.key_prefix.is_empty() {
            return Err(UniqueJobError::config("Key prefix must not be empty"));
        }

        if self.config.unique.write_mode == RegistryWriteMode::CompareAndSwap
            && self.config.unique.max_cas_attempts == 0
        {
            return Err(UniqueJobError::config(
                "max_cas_attempts must be greater than 0 for compare_and_swap",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.unique.document_key(), "q:unique:jobs");
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_log_level("debug")
            .with_json_logging(true)
            .with_key_prefix("jobs")
            .with_write_mode(RegistryWriteMode::CompareAndSwap)
            .build()
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.unique.document_key(), "jobs:unique:jobs");
        assert_eq!(config.unique.write_mode, RegistryWriteMode::CompareAndSwap);
    }

    #[test]
    fn test_invalid_log_level() {
        let result = ConfigBuilder::new().with_log_level("loud").build();
        assert!(matches!(result, Err(UniqueJobError::Config(_))));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let result = ConfigBuilder::new().with_key_prefix("").build();
        assert!(matches!(result, Err(UniqueJobError::Config(_))));
    }

    #[test]
    fn test_zero_cas_attempts_rejected() {
        let unique = UniqueJobsConfig {
            write_mode: RegistryWriteMode::CompareAndSwap,
            max_cas_attempts: 0,
            ..Default::default()
        };
        let result = ConfigBuilder::new().with_unique_config(unique).build();
        assert!(matches!(result, Err(UniqueJobError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"unique": {"removal_cleanup": "on_success"}}"#).unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.unique.removal_cleanup,
            crate::unique::RemovalCleanup::OnSuccess
        );
    }
}
