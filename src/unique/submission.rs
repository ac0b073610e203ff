//! Submission coordinator
//!
//! Creates a job unless its uniqueness key is already registered, in
//! which case the registered job is returned instead.

use crate::error::{Result, UniqueJobError};
use crate::traits::job::{JobData, JobId, JobQueue};
use crate::unique::config::RegistryWriteMode;
use crate::unique::registry::{Claim, UniqueRegistry};
use std::sync::Arc;

/// Coordinates job creation with the unique registry
///
/// Check, create and register are separate steps. With a best-effort
/// registry two concurrent submissions of the same key can both create a
/// job; the later registration wins. With a compare-and-swap registry the
/// later submission discards its own job and returns the winner's.
#[derive(Clone)]
pub struct SubmissionCoordinator {
    queue: Arc<dyn JobQueue>,
    registry: UniqueRegistry,
}

impl SubmissionCoordinator {
    pub fn new(queue: Arc<dyn JobQueue>, registry: UniqueRegistry) -> Self {
        Self { queue, registry }
    }

    /// Submit a job
    ///
    /// Jobs without a uniqueness key are created directly and never touch
    /// the registry. Otherwise the registered job is returned with
    /// `already_exists()` set, or a new job is created and registered.
    pub async fn submit(&self, job: JobData) -> Result<JobData> {
        let Some(key) = job.unique_key()?.map(str::to_owned) else {
            return self.queue.create(job).await;
        };

        if let Some(existing) = self.registry.lookup(&key).await? {
            tracing::debug!(unique_key = %key, job_id = %existing, "Unique job already registered");
            return self.existing(&key, existing).await;
        }

        let created = self.queue.create(job).await?;
        let id = created.require_id()?.clone();
        tracing::debug!(unique_key = %key, job_id = %id, "Created unique job");

        match self.registry.write_mode() {
            RegistryWriteMode::BestEffort => {
                if let Err(e) = self.registry.merge(&key, id.clone()).await {
                    tracing::warn!(
                        unique_key = %key,
                        job_id = %id,
                        error = %e,
                        "Job created but not registered as unique"
                    );
                    return Err(e);
                }
                Ok(created)
            }
            RegistryWriteMode::CompareAndSwap => match self.registry.claim(&key, id.clone()).await {
                Ok(Claim::Registered(_)) => Ok(created),
                Ok(Claim::Existing(winner)) => {
                    tracing::debug!(
                        unique_key = %key,
                        job_id = %id,
                        winner_job_id = %winner,
                        "Lost unique key race, discarding duplicate job"
                    );
                    if let Err(e) = self.queue.remove(&id).await {
                        tracing::warn!(
                            unique_key = %key,
                            job_id = %id,
                            winner_job_id = %winner,
                            error = %e,
                            "Failed to remove duplicate unique job"
                        );
                        return Err(UniqueJobError::queue(format!(
                            "duplicate job {} for unique key '{}' (registered to job {}) could not be removed: {}",
                            id, key, winner, e
                        )));
                    }
                    self.existing(&key, winner).await
                }
                Err(e) => {
                    tracing::warn!(
                        unique_key = %key,
                        job_id = %id,
                        error = %e,
                        "Job created but not registered as unique"
                    );
                    Err(e)
                }
            },
        }
    }

    /// Fetch the job registered for `key` and flag it as pre-existing
    async fn existing(&self, key: &str, id: JobId) -> Result<JobData> {
        match self.queue.fetch(&id).await {
            Ok(mut job) => {
                job.mark_already_exists();
                Ok(job)
            }
            Err(e) if e.is_not_found() => Err(UniqueJobError::DanglingReference {
                key: key.to_string(),
                job_id: id,
            }),
            Err(e) => Err(e),
        }
    }
}
