//! In-memory job queue implementation
//!
//! This implementation uses in-memory data structures and is suitable for
//! development, testing, and single-instance deployments.

use crate::error::{Result, UniqueJobError};
use crate::traits::job::{JobData, JobId, JobQueue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory job queue implementation
///
/// Jobs get sequential integer ids starting at 1, like a Redis `INCR`
/// counter would hand out. Clones share the same jobs.
#[derive(Clone)]
pub struct InMemoryJobQueue {
    jobs: Arc<Mutex<HashMap<JobId, JobData>>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryJobQueue {
    /// Create a new in-memory job queue
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of jobs currently in the queue
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Whether a job with this id exists
    pub async fn contains(&self, id: &JobId) -> bool {
        self.jobs.lock().await.contains_key(id)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn create(&self, mut job: JobData) -> Result<JobData> {
        let id = JobId::Int(self.next_id.fetch_add(1, Ordering::SeqCst));
        job.id = Some(id.clone());

        let mut jobs = self.jobs.lock().await;
        jobs.insert(id, job.clone());

        Ok(job)
    }

    async fn fetch(&self, id: &JobId) -> Result<JobData> {
        let jobs = self.jobs.lock().await;
        jobs.get(id)
            .cloned()
            .ok_or_else(|| UniqueJobError::not_found(format!("job {}", id)))
    }

    async fn remove(&self, id: &JobId) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        jobs.remove(id)
            .map(|_| ())
            .ok_or_else(|| UniqueJobError::not_found(format!("job {}", id)))
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}
