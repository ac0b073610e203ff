//! Unique job submission
//!
//! Lets callers tag a job with a uniqueness key so that at most one job
//! carrying that key exists in the queue. The key → job id mapping is
//! kept in one document in a shared key-value store, so several
//! processes pointing at the same store see the same registry.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tideway_unique::{InMemoryJobQueue, InMemoryStore, JobData, UniqueJobs};
//!
//! # async fn run() -> tideway_unique::Result<()> {
//! let jobs = UniqueJobs::new(Arc::new(InMemoryJobQueue::new()), Arc::new(InMemoryStore::new()));
//!
//! let first = jobs.submit(JobData::new("invoice").unique("order-42")).await?;
//! let second = jobs.submit(JobData::new("invoice").unique("order-42")).await?;
//! assert_eq!(first.id, second.id);
//! assert!(second.already_exists());
//!
//! jobs.delete(first.require_id()?).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod document;
mod registry;
mod removal;
mod submission;


pub use config::{
    DEFAULT_KEY_PREFIX, RegistryWriteMode, RemovalCleanup, UniqueBackend, UniqueJobsConfig,
};
pub use document::{UniqueDocument, UniqueDocumentStore};
pub use registry::{Claim, UniqueRegistry};
pub use removal::RemovalCoordinator;
pub use submission::SubmissionCoordinator;

use crate::error::Result;
use crate::jobs::InMemoryJobQueue;
use crate::store::InMemoryStore;
use crate::traits::job::{JobData, JobId, JobQueue};
use crate::traits::store::KeyValueStore;
use std::sync::Arc;

/// Caller-facing entry point for unique submission and deletion
///
/// The queue engine and the store are injected; this type never
/// creates or removes jobs except through the engine it was given.
#[derive(Clone)]
pub struct UniqueJobs {
    queue: Arc<dyn JobQueue>,
    registry: UniqueRegistry,
    submission: SubmissionCoordinator,
    removal: RemovalCoordinator,
}

impl UniqueJobs {
    /// Create with the default configuration (best-effort writes, `q:unique:jobs`)
    pub fn new(queue: Arc<dyn JobQueue>, store: Arc<dyn KeyValueStore>) -> Self {
        let config = UniqueJobsConfig::default();
        let documents = UniqueDocumentStore::new(store, config.document_key());
        Self::from_parts(queue, UniqueRegistry::new(documents), config.removal_cleanup)
    }

    /// Create with an explicit configuration
    ///
    /// The `backend` and `redis_url` fields are ignored; the given queue
    /// and store are used as-is.
    pub fn with_config(
        queue: Arc<dyn JobQueue>,
        store: Arc<dyn KeyValueStore>,
        config: &UniqueJobsConfig,
    ) -> Result<Self> {
        let registry = UniqueRegistry::from_config(store, config)?;
        Ok(Self::from_parts(queue, registry, config.removal_cleanup))
    }

    /// Create the queue and store named by `config.backend` and wire them up
    pub fn from_config(config: &UniqueJobsConfig) -> Result<Self> {
        let (queue, store): (Arc<dyn JobQueue>, Arc<dyn KeyValueStore>) = match config.backend {
            UniqueBackend::InMemory => (
                Arc::new(InMemoryJobQueue::new()),
                Arc::new(InMemoryStore::new()),
            ),
            #[cfg(feature = "redis")]
            UniqueBackend::Redis => {
                let url = config.redis_url.as_deref().ok_or_else(|| {
                    crate::error::UniqueJobError::config("redis_url is required for the redis backend")
                })?;
                (
                    Arc::new(crate::jobs::RedisJobQueue::new(url, config.key_prefix.clone())?),
                    Arc::new(crate::store::RedisStore::new(url)?),
                )
            }
        };

        tracing::info!(
            backend = ?config.backend,
            write_mode = ?config.write_mode,
            removal_cleanup = ?config.removal_cleanup,
            document_key = %config.document_key(),
            "Unique jobs configured"
        );

        Self::with_config(queue, store, config)
    }

    /// Build from an already configured registry
    pub fn from_parts(
        queue: Arc<dyn JobQueue>,
        registry: UniqueRegistry,
        cleanup: RemovalCleanup,
    ) -> Self {
        Self {
            submission: SubmissionCoordinator::new(queue.clone(), registry.clone()),
            removal: RemovalCoordinator::new(queue.clone(), registry.clone(), cleanup),
            queue,
            registry,
        }
    }

    /// Submit a job, returning the already registered one for its uniqueness key if any
    pub async fn submit(&self, job: JobData) -> Result<JobData> {
        self.submission.submit(job).await
    }

    /// Delete a job and its uniqueness key
    pub async fn delete(&self, id: &JobId) -> Result<()> {
        self.removal.delete(id).await
    }

    /// Job id currently registered for `key`
    pub async fn lookup(&self, key: &str) -> Result<Option<JobId>> {
        self.registry.lookup(key).await
    }

    pub fn registry(&self) -> &UniqueRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Check that both the queue and the registry store are healthy
    pub fn is_healthy(&self) -> bool {
        self.queue.is_healthy() && self.registry.documents().is_healthy()
    }
}
