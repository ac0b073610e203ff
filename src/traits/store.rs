//! Key-value store trait
//!
//! The unique registry persists a single document through this trait,
//! so any backend offering get/set on byte values can host it.

use crate::error::{Result, UniqueJobError};
use async_trait::async_trait;

/// Byte-oriented key-value store
#[async_trait]
#[allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds
pub trait KeyValueStore: Send + Sync {
    /// Get the raw value stored under `key`
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any prior content
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Store `value` only if the current content equals `expected`
    ///
    /// `expected = None` means the key must be absent. Returns `Ok(false)`
    /// when the current content differs and nothing was written.
    async fn compare_and_set(
        &self,
        key: &str,
        _expected: Option<&[u8]>,
        _value: Vec<u8>,
    ) -> Result<bool> {
        Err(UniqueJobError::store(format!(
            "conditional writes are not supported by this store (key: {})",
            key
        )))
    }

    /// Whether `compare_and_set` is implemented
    fn supports_compare_and_set(&self) -> bool {
        false
    }

    /// Check if the store backend is healthy
    fn is_healthy(&self) -> bool;
}
