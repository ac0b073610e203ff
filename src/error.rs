use crate::traits::job::JobId;

/// The main error type for unique job submission
#[derive(Debug, thiserror::Error)]
pub enum UniqueJobError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A registry entry points at a job the queue no longer knows about
    #[error("Dangling unique key '{key}': job {job_id} no longer exists")]
    DanglingReference { key: String, job_id: JobId },

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Invalid unique key: {0}")]
    InvalidUniqueKey(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl UniqueJobError {
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue(msg.into())
    }

    pub fn invalid_unique_key(msg: impl Into<String>) -> Self {
        Self::InvalidUniqueKey(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true for errors that mean "the job does not exist"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DanglingReference { .. })
    }

    /// Returns true for failures of the backing key-value store
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type alias for unique job operations
pub type Result<T> = std::result::Result<T, UniqueJobError>;

impl From<serde_json::Error> for UniqueJobError {
    fn from(err: serde_json::Error) -> Self {
        UniqueJobError::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for UniqueJobError {
    fn from(err: redis::RedisError) -> Self {
        UniqueJobError::Store(format!("Redis error: {}", err))
    }
}
