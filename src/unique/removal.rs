//! Removal coordinator

use crate::error::Result;
use crate::traits::job::{JobId, JobQueue};
use crate::unique::config::RemovalCleanup;
use crate::unique::registry::UniqueRegistry;
use std::sync::Arc;

/// Removes a job from the queue together with its registry entry
///
/// Removal is not atomic: when one side fails the other may already have
/// been applied. The first error (queue before registry) is returned.
#[derive(Clone)]
pub struct RemovalCoordinator {
    queue: Arc<dyn JobQueue>,
    registry: UniqueRegistry,
    cleanup: RemovalCleanup,
}

impl RemovalCoordinator {
    pub fn new(queue: Arc<dyn JobQueue>, registry: UniqueRegistry, cleanup: RemovalCleanup) -> Self {
        Self {
            queue,
            registry,
            cleanup,
        }
    }

    pub fn cleanup(&self) -> RemovalCleanup {
        self.cleanup
    }

    /// Delete a job and any uniqueness key pointing at it
    pub async fn delete(&self, id: &JobId) -> Result<()> {
        match self.cleanup {
            RemovalCleanup::Always => {
                let (removed, cleaned) =
                    tokio::join!(self.queue.remove(id), self.registry.remove_by_job_id(id));

                match (removed, cleaned) {
                    (Ok(()), Ok(_)) => Ok(()),
                    (Err(e), Ok(_)) => {
                        tracing::warn!(job_id = %id, error = %e, "Job removal failed, registry entry cleaned up anyway");
                        Err(e)
                    }
                    (Ok(()), Err(e)) => {
                        tracing::warn!(job_id = %id, error = %e, "Registry cleanup failed after job removal");
                        Err(e)
                    }
                    (Err(e), Err(cleanup_error)) => {
                        tracing::warn!(
                            job_id = %id,
                            error = %e,
                            cleanup_error = %cleanup_error,
                            "Job removal and registry cleanup both failed"
                        );
                        Err(e)
                    }
                }
            }
            RemovalCleanup::OnSuccess => {
                self.queue.remove(id).await?;
                if let Err(e) = self.registry.remove_by_job_id(id).await {
                    tracing::warn!(job_id = %id, error = %e, "Registry cleanup failed after job removal");
                    return Err(e);
                }
                Ok(())
            }
        }
    }
}
