//! Tideway Unique - idempotent job submission
//!
//! Tag a job with an application-chosen uniqueness key and submit it
//! through [`UniqueJobs`]: the first submission creates the job, later
//! submissions with the same key get the existing job back, flagged with
//! [`JobData::already_exists`]. Deleting the job frees the key.
//!
//! # Features
//!
//! - **Registry**: one JSON document mapping uniqueness keys to job ids,
//!   shared by every process using the same store
//! - **Pluggable backends**: [`JobQueue`] and [`KeyValueStore`] traits with
//!   in-memory and Redis implementations
//! - **Write modes**: best-effort read-modify-write, or compare-and-swap
//!   for stores with conditional writes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tideway_unique::{ConfigBuilder, JobData, UniqueJobs};
//!
//! #[tokio::main]
//! async fn main() -> tideway_unique::Result<()> {
//!     let config = ConfigBuilder::new().from_env().build()?;
//!     tideway_unique::init_tracing_with_config(&config);
//!
//!     let jobs = UniqueJobs::from_config(&config.unique)?;
//!     let job = jobs.submit(JobData::new("invoice").unique("order-42")).await?;
//!     println!("job {:?} (existing: {})", job.id, job.already_exists());
//!     Ok(())
//! }
//! ```

#![allow(async_fn_in_trait)] // async_trait macro handles Send/Sync bounds properly

mod config;
mod error;
pub mod jobs;
pub mod store;
pub mod traits;
pub mod unique;
mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, LoggingConfig};
pub use error::{Result, UniqueJobError};
pub use jobs::InMemoryJobQueue;
#[cfg(feature = "redis")]
pub use jobs::RedisJobQueue;
pub use store::InMemoryStore;
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use traits::job::{Job, JobData, JobId, JobQueue};
pub use traits::store::KeyValueStore;
pub use unique::{
    Claim, RegistryWriteMode, RemovalCleanup, RemovalCoordinator, SubmissionCoordinator,
    UniqueBackend, UniqueDocument, UniqueDocumentStore, UniqueJobs, UniqueJobsConfig,
    UniqueRegistry,
};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use utils::{get_env_with_prefix, parse_env_with_prefix};

/// Initialize tracing/logging from the environment
///
/// # Environment Variables
///
/// - `RUST_LOG`: Full filter directives (e.g., "tideway_unique=debug"), wins when set
/// - `TIDEWAY_LOG_LEVEL` / `LOG_LEVEL`: Level used when `RUST_LOG` is unset (default "info")
/// - `TIDEWAY_LOG_JSON` / `LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        filter_for_level(&get_env_with_prefix("LOG_LEVEL").unwrap_or_else(|| "info".to_string()))
    });
    let json = parse_env_with_prefix("LOG_JSON").unwrap_or(false);

    install_subscriber(env_filter, json);
}

/// Initialize tracing from a [`Config`]
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing_with_config(config: &Config) {
    install_subscriber(filter_for_level(&config.logging.level), config.logging.json);
}

/// Filter for a level or directive string, falling back to "info"
fn filter_for_level(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|e| {
        eprintln!("Invalid log filter '{}' ({}), using info", level, e);
        EnvFilter::new("info")
    })
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed, keeping it");
    }
}
