//! Redis-backed key-value store

use crate::error::{Result, UniqueJobError};
use crate::traits::store::KeyValueStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Compare-and-set in one round trip.
///
/// KEYS[1] = key, ARGV[1] = "1" if the key must be absent, ARGV[2] = expected
/// value, ARGV[3] = new value. Returns 1 when written, 0 on mismatch.
const COMPARE_AND_SET_SCRIPT: &str = r#"
local current = redis.call('GET', KEYS[1])
if ARGV[1] == '1' then
  if current then
    return 0
  end
elseif current ~= ARGV[2] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[3])
return 1
"#;

/// Redis key-value store
///
/// Uses plain `GET`/`SET` for reads and writes, and a Lua script for
/// conditional writes so the compare and the set happen atomically on
/// the server.
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    compare_and_set: Arc<redis::Script>,
    /// Cached health status (updated by ping operations)
    health_status: Arc<AtomicBool>,
}

impl RedisStore {
    /// Create a new Redis store from a connection URL
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| UniqueJobError::config(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            compare_and_set: Arc::new(redis::Script::new(COMPARE_AND_SET_SCRIPT)),
            health_status: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Ping Redis and update health status
    ///
    /// The synchronous `is_healthy()` trait method returns the cached status
    /// from the last ping.
    pub async fn ping(&self) -> bool {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: redis::RedisResult<String> =
                    redis::cmd("PING").query_async(&mut conn).await;
                let healthy = result.is_ok();
                self.health_status.store(healthy, Ordering::Release);
                healthy
            }
            Err(e) => {
                tracing::warn!("Redis store ping failed: {}", e);
                self.health_status.store(false, Ordering::Release);
                false
            }
        }
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| UniqueJobError::store(format!("Failed to get Redis connection: {}", e)))
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.get_connection().await?;

        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(|e| UniqueJobError::store(format!("Redis GET failed: {}", e)))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.get_connection().await?;

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| UniqueJobError::store(format!("Redis SET failed: {}", e)))
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: Vec<u8>,
    ) -> Result<bool> {
        let mut conn = self.get_connection().await?;

        let must_be_absent = if expected.is_none() { "1" } else { "0" };
        let written: i64 = self
            .compare_and_set
            .key(key)
            .arg(must_be_absent)
            .arg(expected.unwrap_or_default())
            .arg(value)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| UniqueJobError::store(format!("Redis compare-and-set failed: {}", e)))?;

        Ok(written == 1)
    }

    fn supports_compare_and_set(&self) -> bool {
        true
    }

    fn is_healthy(&self) -> bool {
        self.health_status.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            RedisStore::new("not a url"),
            Err(UniqueJobError::Config(_))
        ));
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_get_set() {
        let store = RedisStore::new("redis://127.0.0.1/").unwrap();
        store.set("tideway-unique:test:get_set", b"v".to_vec()).await.unwrap();
        assert_eq!(
            store.get("tideway-unique:test:get_set").await.unwrap(),
            Some(b"v".to_vec())
        );
    }

    #[tokio::test]
    #[ignore] // Requires Redis
    async fn test_redis_compare_and_set() {
        let store = RedisStore::new("redis://127.0.0.1/").unwrap();
        let key = "tideway-unique:test:cas";
        store.set(key, b"a".to_vec()).await.unwrap();

        assert!(!store.compare_and_set(key, None, b"x".to_vec()).await.unwrap());
        assert!(!store.compare_and_set(key, Some(&b"z"[..]), b"x".to_vec()).await.unwrap());
        assert!(store.compare_and_set(key, Some(&b"a"[..]), b"b".to_vec()).await.unwrap());
        assert_eq!(store.get(key).await.unwrap(), Some(b"b".to_vec()));
    }
}
