//! Unique registry
//!
//! Lookup and mutation of the uniqueness key → job id mapping. Each call
//! reads the shared document, applies its change locally and writes the
//! result back.

use crate::error::{Result, UniqueJobError};
use crate::traits::job::JobId;
use crate::traits::store::KeyValueStore;
use crate::unique::config::{RegistryWriteMode, UniqueJobsConfig};
use crate::unique::document::{UniqueDocument, UniqueDocumentStore};
use std::sync::Arc;

/// Outcome of [`UniqueRegistry::claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The key now points at the claiming job
    Registered(UniqueDocument),
    /// The key already belongs to another job
    Existing(JobId),
}

/// Registry of uniqueness keys backed by a single shared document
///
/// In [`RegistryWriteMode::BestEffort`] every mutation is a plain
/// read-modify-write: concurrent writers can overwrite each other. In
/// [`RegistryWriteMode::CompareAndSwap`] each write is conditional on the
/// document being unchanged since it was read, and is retried otherwise.
#[derive(Clone)]
pub struct UniqueRegistry {
    documents: UniqueDocumentStore,
    write_mode: RegistryWriteMode,
    max_cas_attempts: u32,
}

impl UniqueRegistry {
    /// Create a best-effort registry
    pub fn new(documents: UniqueDocumentStore) -> Self {
        Self {
            documents,
            write_mode: RegistryWriteMode::BestEffort,
            max_cas_attempts: 1,
        }
    }

    /// Create a registry with an explicit write mode
    ///
    /// Fails if compare-and-swap is requested on a store without
    /// conditional writes, or with zero attempts.
    pub fn with_write_mode(
        documents: UniqueDocumentStore,
        write_mode: RegistryWriteMode,
        max_cas_attempts: u32,
    ) -> Result<Self> {
        if write_mode == RegistryWriteMode::CompareAndSwap {
            if !documents.supports_conditional_writes() {
                return Err(UniqueJobError::config(
                    "compare_and_swap write mode requires a store with conditional writes",
                ));
            }
            if max_cas_attempts == 0 {
                return Err(UniqueJobError::config(
                    "max_cas_attempts must be greater than 0",
                ));
            }
        }

        Ok(Self {
            documents,
            write_mode,
            max_cas_attempts,
        })
    }

    /// Build a registry over `store` using the document key and write mode from `config`
    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &UniqueJobsConfig) -> Result<Self> {
        let documents = UniqueDocumentStore::new(store, config.document_key());
        Self::with_write_mode(documents, config.write_mode, config.max_cas_attempts)
    }

    pub fn write_mode(&self) -> RegistryWriteMode {
        self.write_mode
    }

    /// The document adapter this registry writes through
    pub fn documents(&self) -> &UniqueDocumentStore {
        &self.documents
    }

    /// The whole mapping as currently stored
    pub async fn snapshot(&self) -> Result<UniqueDocument> {
        self.documents.read().await
    }

    /// Job id registered for `key`, if any
    pub async fn lookup(&self, key: &str) -> Result<Option<JobId>> {
        let document = self.documents.read().await?;
        Ok(document.get(key).cloned())
    }

    /// Point `key` at `id`, overwriting any previous entry for that key
    pub async fn merge(&self, key: &str, id: JobId) -> Result<UniqueDocument> {
        let (document, previous) = self
            .update(|document| (true, document.insert(key, id.clone())))
            .await?;

        if let Some(previous) = previous.filter(|previous| *previous != id) {
            tracing::warn!(
                unique_key = %key,
                previous_job_id = %previous,
                job_id = %id,
                "Unique key overwritten by a different job"
            );
        }
        Ok(document)
    }

    /// Remove every entry pointing at `id`
    ///
    /// Nothing is written when no entry matched.
    pub async fn remove_by_job_id(&self, id: &JobId) -> Result<UniqueDocument> {
        let (document, removed) = self
            .update(|document| {
                let removed = document.remove_job(id);
                (removed > 0, removed)
            })
            .await?;

        tracing::debug!(job_id = %id, removed, "Removed unique registry entries");
        Ok(document)
    }

    /// Point `key` at `id` only if the key is free
    ///
    /// Claiming a key that already points at `id` succeeds without a write.
    pub async fn claim(&self, key: &str, id: JobId) -> Result<Claim> {
        let (document, existing) = self
            .update(|document| match document.get(key) {
                Some(current) if *current != id => (false, Some(current.clone())),
                Some(_) => (false, None),
                None => {
                    document.insert(key, id.clone());
                    (true, None)
                }
            })
            .await?;

        Ok(match existing {
            Some(existing) => Claim::Existing(existing),
            None => Claim::Registered(document),
        })
    }

    /// Read the document, apply `change` and write it back if it reports a change
    async fn update<T, F>(&self, mut change: F) -> Result<(UniqueDocument, T)>
    where
        F: FnMut(&mut UniqueDocument) -> (bool, T),
    {
        match self.write_mode {
            RegistryWriteMode::BestEffort => {
                let mut document = self.documents.read().await?;
                let (changed, output) = change(&mut document);
                if changed {
                    self.documents.write(&document).await?;
                }
                Ok((document, output))
            }
            RegistryWriteMode::CompareAndSwap => {
                for attempt in 1..=self.max_cas_attempts {
                    let (mut document, version) = self.documents.read_versioned().await?;
                    let (changed, output) = change(&mut document);
                    if !changed
                        || self
                            .documents
                            .write_if_unchanged(version.as_deref(), &document)
                            .await?
                    {
                        return Ok((document, output));
                    }

                    tracing::debug!(
                        key = %self.documents.key(),
                        attempt,
                        "Unique registry document changed concurrently, retrying"
                    );
                }

                Err(UniqueJobError::conflict(format!(
                    "unique registry document {} kept changing after {} attempts",
                    self.documents.key(),
                    self.max_cas_attempts
                )))
            }
        }
    }
}
