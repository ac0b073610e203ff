//! Configuration for unique job submission

use crate::utils::{get_env_with_prefix, parse_env_with_prefix};
use serde::{Deserialize, Serialize};

/// Default key prefix shared with the queue engine's keys
pub const DEFAULT_KEY_PREFIX: &str = "q";

/// Storage backend for the registry document and the job queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UniqueBackend {
    /// In-memory store and queue (for development/testing)
    #[default]
    #[serde(alias = "memory")]
    InMemory,
    /// Redis store and queue (for production)
    #[cfg(feature = "redis")]
    Redis,
}

/// How mutations of the registry document are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryWriteMode {
    /// Plain read-modify-write; concurrent writers may lose updates
    #[default]
    BestEffort,
    /// Conditional writes retried on conflict; requires store support
    CompareAndSwap,
}

/// When a deleted job's registry entry is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalCleanup {
    /// Clean up concurrently with job removal, whatever its outcome
    #[default]
    Always,
    /// Clean up only after the job was removed from the queue
    OnSuccess,
}

/// Configuration for unique job submission
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniqueJobsConfig {
    /// Backend for the registry store and job queue
    #[serde(default)]
    pub backend: UniqueBackend,

    /// Redis connection URL (only used for Redis backend)
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Prefix for all keys written by this crate
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Registry write strategy
    #[serde(default)]
    pub write_mode: RegistryWriteMode,

    /// Attempts before a conditional write gives up with a conflict
    #[serde(default = "default_max_cas_attempts")]
    pub max_cas_attempts: u32,

    /// Registry cleanup policy on job deletion
    #[serde(default)]
    pub removal_cleanup: RemovalCleanup,
}

impl Default for UniqueJobsConfig {
    fn default() -> Self {
        Self {
            backend: UniqueBackend::default(),
            redis_url: None,
            key_prefix: default_key_prefix(),
            write_mode: RegistryWriteMode::default(),
            max_cas_attempts: default_max_cas_attempts(),
            removal_cleanup: RemovalCleanup::default(),
        }
    }
}

impl UniqueJobsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(backend) = get_env_with_prefix("UNIQUE_BACKEND") {
            config.backend = match backend.to_lowercase().as_str() {
                "redis" => {
                    #[cfg(feature = "redis")]
                    {
                        UniqueBackend::Redis
                    }
                    #[cfg(not(feature = "redis"))]
                    {
                        tracing::warn!("Redis backend requested but redis feature not enabled, using in-memory");
                        UniqueBackend::InMemory
                    }
                }
                _ => UniqueBackend::InMemory,
            };
        }

        if let Some(url) = get_env_with_prefix("UNIQUE_REDIS_URL") {
            config.redis_url = Some(url);
        }

        if let Some(prefix) = get_env_with_prefix("UNIQUE_KEY_PREFIX") {
            config.key_prefix = prefix;
        }

        if let Some(mode) = get_env_with_prefix("UNIQUE_WRITE_MODE") {
            config.write_mode = match mode.to_lowercase().as_str() {
                "compare_and_swap" | "cas" => RegistryWriteMode::CompareAndSwap,
                _ => RegistryWriteMode::BestEffort,
            };
        }

        if let Some(attempts) = parse_env_with_prefix("UNIQUE_MAX_CAS_ATTEMPTS") {
            config.max_cas_attempts = attempts;
        }

        if let Some(cleanup) = get_env_with_prefix("UNIQUE_REMOVAL_CLEANUP") {
            config.removal_cleanup = match cleanup.to_lowercase().as_str() {
                "on_success" => RemovalCleanup::OnSuccess,
                _ => RemovalCleanup::Always,
            };
        }

        config
    }

    /// Full store key of the registry document
    pub fn document_key(&self) -> String {
        format!("{}:unique:jobs", self.key_prefix)
    }
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

fn default_max_cas_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UniqueJobsConfig::default();
        assert_eq!(config.backend, UniqueBackend::InMemory);
        assert_eq!(config.write_mode, RegistryWriteMode::BestEffort);
        assert_eq!(config.removal_cleanup, RemovalCleanup::Always);
        assert_eq!(config.max_cas_attempts, 5);
        assert_eq!(config.document_key(), "q:unique:jobs");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: UniqueJobsConfig = serde_json::from_str(
            r#"{"key_prefix": "app", "write_mode": "compare_and_swap", "removal_cleanup": "on_success"}"#,
        )
        .unwrap();
        assert_eq!(config.document_key(), "app:unique:jobs");
        assert_eq!(config.write_mode, RegistryWriteMode::CompareAndSwap);
        assert_eq!(config.removal_cleanup, RemovalCleanup::OnSuccess);
        assert_eq!(config.max_cas_attempts, 5);
        assert_eq!(config.backend, UniqueBackend::InMemory);
    }

    #[test]
    fn test_from_env() {
        unsafe {
            std::env::set_var("TIDEWAY_UNIQUE_KEY_PREFIX", "envq");
            std::env::set_var("TIDEWAY_UNIQUE_WRITE_MODE", "CAS");
            std::env::set_var("TIDEWAY_UNIQUE_MAX_CAS_ATTEMPTS", "9");
            std::env::set_var("TIDEWAY_UNIQUE_REMOVAL_CLEANUP", "on_success");
        }

        let config = UniqueJobsConfig::from_env();
        assert_eq!(config.document_key(), "envq:unique:jobs");
        assert_eq!(config.write_mode, RegistryWriteMode::CompareAndSwap);
        assert_eq!(config.max_cas_attempts, 9);
        assert_eq!(config.removal_cleanup, RemovalCleanup::OnSuccess);

        unsafe {
            std::env::remove_var("TIDEWAY_UNIQUE_KEY_PREFIX");
            std::env::remove_var("TIDEWAY_UNIQUE_WRITE_MODE");
            std::env::remove_var("TIDEWAY_UNIQUE_MAX_CAS_ATTEMPTS");
            std::env::remove_var("TIDEWAY_UNIQUE_REMOVAL_CLEANUP");
        }
    }
}
