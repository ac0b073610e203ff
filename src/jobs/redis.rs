//! Redis-backed job queue implementation
//!
//! Stores each job as a JSON string and hands out integer ids from a
//! shared counter, so several processes can create jobs against the same
//! Redis instance.

use crate::error::{Result, UniqueJobError};
use crate::traits::job::{JobData, JobId, JobQueue};
use anyhow::Context;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Redis-backed job queue implementation
///
/// Uses Redis keys:
/// - `{prefix}:ids` - Counter incremented for each new job id
/// - `{prefix}:job:{id}` - JSON-encoded job
#[derive(Clone)]
pub struct RedisJobQueue {
    client: redis::Client,
    prefix: String,
    /// Cached health status (updated by ping operations)
    health_status: Arc<AtomicBool>,
}

impl RedisJobQueue {
    /// Create a new Redis job queue
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `prefix` - Key prefix (e.g., "q")
    pub fn new(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| UniqueJobError::config(format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            client,
            prefix: prefix.into(),
            health_status: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Ping Redis and update health status
    ///
    /// Call this periodically (e.g., every 30 seconds) to keep health status accurate.
    /// The synchronous `is_healthy()` trait method returns the cached status from the
    /// last ping.
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
                tracing::warn!("Redis job queue ping failed: {}", e);
                self.health_status.store(false, Ordering::Release);
                false
            }
        }
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| UniqueJobError::queue(format!("Failed to get Redis connection: {}", e)))
    }

    fn job_key(&self, id: &JobId) -> String {
        format!("{}:job:{}", self.prefix, id)
    }
}

/// Decode a job stored under `{prefix}:job:{id}`
fn decode_job(id: &JobId, job_json: &str) -> Result<JobData> {
    let job = serde_json::from_str(job_json)
        .with_context(|| format!("Failed to deserialize job {}", id))?;
    Ok(job)
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn create(&self, mut job: JobData) -> Result<JobData> {
        let mut conn = self.get_connection().await?;

        let id: u64 = redis::cmd("INCR")
            .arg(format!("{}:ids", self.prefix))
            .query_async(&mut conn)
            .await
            .map_err(|e| UniqueJobError::queue(format!("Failed to allocate job id: {}", e)))?;
        let id = JobId::Int(id);
        job.id = Some(id.clone());

        let job_json = serde_json::to_string(&job)?;
        redis::cmd("SET")
            .arg(self.job_key(&id))
            .arg(&job_json)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| UniqueJobError::queue(format!("Failed to save job: {}", e)))?;

        Ok(job)
    }

    async fn fetch(&self, id: &JobId) -> Result<JobData> {
        let mut conn = self.get_connection().await?;

        let job_json: Option<String> = redis::cmd("GET")
            .arg(self.job_key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e| UniqueJobError::queue(format!("Failed to fetch job: {}", e)))?;

        let job_json = job_json.ok_or_else(|| UniqueJobError::not_found(format!("job {}", id)))?;
        decode_job(id, &job_json)
    }

    async fn remove(&self, id: &JobId) -> Result<()> {
        let mut conn = self.get_connection().await?;

        let removed: u64 = redis::cmd("DEL")
            .arg(self.job_key(id))
            .query_async(&mut conn)
            .await
            .map_err(|e| UniqueJobError::queue(format!("Failed to remove job: {}", e)))?;

        if removed == 0 {
            return Err(UniqueJobError::not_found(format!("job {}", id)));
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        // Return cached health status from last ping() call
        self.health_status.load(Ordering::Acquire)
    }
}
