//! Job queue traits
//!
//! This module defines the job reference passed through the unique
//! submission layer and the narrow queue engine contract it relies on.

use crate::error::{Result, UniqueJobError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Field of the job data payload holding the uniqueness key
pub const UNIQUE_FIELD: &str = "unique";

/// Identifier assigned to a job by the queue engine
///
/// Engines hand out either integers (e.g. Redis `INCR`) or strings.
/// Serialized untagged, so `Int(1)` is the JSON number `1` and
/// `Str("a")` is the JSON string `"a"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Int(u64),
    Str(String),
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => f.write_str(id),
        }
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self::Int(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

/// A typed job payload
///
/// Implement this for application job structs and turn them into
/// [`JobData`] with [`JobData::from_job`].
pub trait Job: Send + Sync + Debug {
    /// Identifier for this job type (e.g., "send_email", "generate_report")
    fn job_type(&self) -> &str;

    /// Serialize the job payload to JSON
    fn serialize(&self) -> Result<serde_json::Value>;
}

/// Job reference as seen by callers and queue engines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobData {
    /// Identifier assigned by the queue engine (None until created)
    #[serde(default)]
    pub id: Option<JobId>,
    /// Job type identifier
    pub job_type: String,
    /// Job payload; the uniqueness key lives under `"unique"`
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Timestamp when the job was built
    pub created_at: DateTime<Utc>,
    /// Set when submission returned an existing job instead of creating one
    #[serde(skip)]
    already_exists: bool,
}

impl JobData {
    /// Create a new job with an empty payload
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            id: None,
            job_type: job_type.into(),
            data: serde_json::Map::new(),
            created_at: Utc::now(),
            already_exists: false,
        }
    }

    /// Build job data from a typed job
    ///
    /// Object payloads become the job's data map. Any other JSON value is
    /// stored under the `"payload"` field.
    pub fn from_job(job: &dyn Job) -> Result<Self> {
        let mut data = Self::new(job.job_type());
        match job.serialize()? {
            serde_json::Value::Object(map) => data.data = map,
            serde_json::Value::Null => {}
            other => {
                data.data.insert("payload".to_string(), other);
            }
        }
        Ok(data)
    }

    /// Set a payload field
    pub fn with(mut self, field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// Attach a uniqueness key to this job
    pub fn unique(mut self, key: impl Into<String>) -> Self {
        self.data
            .insert(UNIQUE_FIELD.to_string(), serde_json::Value::String(key.into()));
        self
    }

    /// Read the uniqueness key, if any
    ///
    /// Fails when the `"unique"` field is present but is not a non-empty string.
    pub fn unique_key(&self) -> Result<Option<&str>> {
        match self.data.get(UNIQUE_FIELD) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(key)) if key.is_empty() => Err(
                UniqueJobError::invalid_unique_key("unique key must not be empty"),
            ),
            Some(serde_json::Value::String(key)) => Ok(Some(key.as_str())),
            Some(other) => Err(UniqueJobError::invalid_unique_key(format!(
                "unique key must be a string, got {}",
                other
            ))),
        }
    }

    /// Whether submission returned a job that already existed
    pub fn already_exists(&self) -> bool {
        self.already_exists
    }

    pub(crate) fn mark_already_exists(&mut self) {
        self.already_exists = true;
    }

    /// The engine-assigned id, or an error if the job was never created
    pub fn require_id(&self) -> Result<&JobId> {
        self.id
            .as_ref()
            .ok_or_else(|| UniqueJobError::queue(format!("{} job has no id", self.job_type)))
    }
}

/// Queue engine used by the unique submission layer
///
/// Only job creation, lookup and removal are needed here; worker
/// scheduling and state transitions stay inside the engine.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Persist a new job and return it with its assigned id
    async fn create(&self, job: JobData) -> Result<JobData>;

    /// Fetch a job by id
    ///
    /// Returns `UniqueJobError::NotFound` if the job does not exist.
    async fn fetch(&self, id: &JobId) -> Result<JobData>;

    /// Remove a job by id
    ///
    /// Returns `UniqueJobError::NotFound` if the job does not exist.
    async fn remove(&self, id: &JobId) -> Result<()>;

    /// Check if the queue is healthy and operational
    fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Serialize)]
    struct SendEmail {
        to: String,
    }

    impl Job for SendEmail {
        fn job_type(&self) -> &str {
            "send_email"
        }

        fn serialize(&self) -> Result<serde_json::Value> {
            Ok(serde_json::to_value(self)?)
        }
    }

    #[test]
    fn test_job_id_serializes_untagged() {
        assert_eq!(serde_json::to_string(&JobId::Int(1)).unwrap(), "1");
        assert_eq!(serde_json::to_string(&JobId::from("abc")).unwrap(), "\"abc\"");

        let id: JobId = serde_json::from_str("42").unwrap();
        assert_eq!(id, JobId::Int(42));
        let id: JobId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id, JobId::Str("42".to_string()));
        assert_ne!(JobId::Int(42), JobId::from("42"));
    }

    #[test]
    fn test_unique_key_roundtrip() {
        let job = JobData::new("email").with("to", "a@b.c").unique("order-42");
        assert_eq!(job.unique_key().unwrap(), Some("order-42"));
        assert_eq!(job.data["to"], "a@b.c");
    }

    #[test]
    fn test_unique_key_absent() {
        let job = JobData::new("email");
        assert_eq!(job.unique_key().unwrap(), None);

        let job = JobData::new("email").with(UNIQUE_FIELD, serde_json::Value::Null);
        assert_eq!(job.unique_key().unwrap(), None);
    }

    #[test]
    fn test_unique_key_invalid() {
        let job = JobData::new("email").unique("");
        assert!(matches!(job.unique_key(), Err(UniqueJobError::InvalidUniqueKey(_))));

        let job = JobData::new("email").with(UNIQUE_FIELD, 7);
        assert!(matches!(job.unique_key(), Err(UniqueJobError::InvalidUniqueKey(_))));
    }

    #[test]
    fn test_already_exists_is_not_serialized() {
        let mut job = JobData::new("email");
        job.mark_already_exists();
        assert!(job.already_exists());

        let json = serde_json::to_string(&job).unwrap();
        assert!(!json.contains("already_exists"));
        let back: JobData = serde_json::from_str(&json).unwrap();
        assert!(!back.already_exists());
    }

    #[test]
    fn test_from_job() {
        let job = JobData::from_job(&SendEmail {
            to: "a@b.c".to_string(),
        })
        .unwrap();
        assert_eq!(job.job_type, "send_email");
        assert_eq!(job.data["to"], "a@b.c");
        assert!(job.id.is_none());
        assert!(job.require_id().is_err());
    }
}
