//! Registry document and its store adapter
//!
//! The whole key → job id mapping lives in one JSON object under a single
//! store key. Every mutation reads, modifies and rewrites that object.

use crate::error::Result;
use crate::traits::job::JobId;
use crate::traits::store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping from uniqueness key to the job currently holding it
///
/// Serialized as a plain JSON object, e.g. `{"order-42": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueDocument {
    entries: BTreeMap<String, JobId>,
}

impl UniqueDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Job id registered for `key`
    pub fn get(&self, key: &str) -> Option<&JobId> {
        self.entries.get(key)
    }

    /// Register `key` → `id`, returning the previous id for that key
    pub fn insert(&mut self, key: impl Into<String>, id: JobId) -> Option<JobId> {
        self.entries.insert(key.into(), id)
    }

    /// Drop every entry pointing at `id`, returning how many were removed
    pub fn remove_job(&mut self, id: &JobId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, value| value != id);
        before - self.entries.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JobId)> {
        self.entries.iter().map(|(key, id)| (key.as_str(), id))
    }

    /// Decode stored bytes, treating absent, `null` or malformed content
    /// as an empty document
    fn parse(key: &str, raw: Option<&[u8]>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match serde_json::from_slice::<Option<Self>>(raw) {
            Ok(document) => document.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Unreadable unique registry document, treating as empty"
                );
                Self::default()
            }
        }
    }
}

impl FromIterator<(String, JobId)> for UniqueDocument {
    fn from_iter<I: IntoIterator<Item = (String, JobId)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Reads and writes the registry document under one fixed store key
#[derive(Clone)]
pub struct UniqueDocumentStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl UniqueDocumentStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Store key holding the document
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the underlying store supports conditional writes
    pub fn supports_conditional_writes(&self) -> bool {
        self.store.supports_compare_and_set()
    }

    pub fn is_healthy(&self) -> bool {
        self.store.is_healthy()
    }

    /// Read the current document
    ///
    /// Store failures are returned; unparseable content is not.
    pub async fn read(&self) -> Result<UniqueDocument> {
        let (document, _) = self.read_versioned().await?;
        Ok(document)
    }

    /// Read the current document along with the raw bytes it was decoded from
    ///
    /// The raw bytes are the version token for [`write_if_unchanged`](Self::write_if_unchanged).
    pub async fn read_versioned(&self) -> Result<(UniqueDocument, Option<Vec<u8>>)> {
        let raw = self.store.get(&self.key).await?;
        let document = UniqueDocument::parse(&self.key, raw.as_deref());
        Ok((document, raw))
    }

    /// Replace the stored document
    pub async fn write(&self, document: &UniqueDocument) -> Result<()> {
        let bytes = serde_json::to_vec(document)?;
        self.store.set(&self.key, bytes).await
    }

    /// Replace the stored document only if it still holds `expected`
    ///
    /// Returns `Ok(false)` if someone else wrote in between.
    pub async fn write_if_unchanged(
        &self,
        expected: Option<&[u8]>,
        document: &UniqueDocument,
    ) -> Result<bool> {
        let bytes = serde_json::to_vec(document)?;
        self.store.compare_and_set(&self.key, expected, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn documents() -> (InMemoryStore, UniqueDocumentStore) {
        let store = InMemoryStore::new();
        let documents = UniqueDocumentStore::new(Arc::new(store.clone()), "q:unique:jobs");
        (store, documents)
    }

    #[test]
    fn test_document_serializes_as_plain_object() {
        let mut document = UniqueDocument::new();
        document.insert("order-42", JobId::Int(1));
        document.insert("invoice-7", JobId::from("abc"));

        let json = serde_json::to_string(&document).unwrap();
        assert_eq!(json, r#"{"invoice-7":"abc","order-42":1}"#);
    }

    #[test]
    fn test_remove_job_removes_all_matches() {
        let mut document: UniqueDocument = [
            ("a".to_string(), JobId::Int(1)),
            ("b".to_string(), JobId::Int(2)),
            ("c".to_string(), JobId::Int(1)),
        ]
        .into_iter()
        .collect();

        assert_eq!(document.remove_job(&JobId::Int(1)), 2);
        assert_eq!(document.len(), 1);
        assert_eq!(document.get("b"), Some(&JobId::Int(2)));
        assert_eq!(document.remove_job(&JobId::Int(1)), 0);
    }

    #[tokio::test]
    async fn test_read_absent_is_empty() {
        let (_, documents) = documents();
        assert!(documents.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_tolerates_bad_content() {
        let (store, documents) = documents();

        for raw in [&b"null"[..], b"not json", b"[1,2,3]", b"{\"k\": 1.5}", b""] {
            store.set("q:unique:jobs", raw.to_vec()).await.unwrap();
            let document = documents.read().await.unwrap();
            assert!(document.is_empty(), "content {:?} should read as empty", raw);
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let (store, documents) = documents();

        let mut document = UniqueDocument::new();
        document.insert("order-42", JobId::Int(1));
        documents.write(&document).await.unwrap();

        assert_eq!(
            store.get("q:unique:jobs").await.unwrap(),
            Some(br#"{"order-42":1}"#.to_vec())
        );
        assert_eq!(documents.read().await.unwrap(), document);
    }

    #[tokio::test]
    async fn test_write_if_unchanged() {
        let (_, documents) = documents();
        assert!(documents.supports_conditional_writes());

        let (mut document, raw) = documents.read_versioned().await.unwrap();
        assert!(raw.is_none());
        document.insert("a", JobId::Int(1));
        assert!(documents.write_if_unchanged(None, &document).await.unwrap());

        // Stale version token
        document.insert("b", JobId::Int(2));
        assert!(!documents.write_if_unchanged(None, &document).await.unwrap());

        let (_, raw) = documents.read_versioned().await.unwrap();
        assert!(documents.write_if_unchanged(raw.as_deref(), &document).await.unwrap());
        assert_eq!(documents.read().await.unwrap().len(), 2);
    }
}
