//! Key-value store backends for the unique registry document.
//!
//! Provides an in-memory store by default, with Redis support via the
//! `redis` feature.

mod in_memory;

#[cfg(feature = "redis")]
mod redis;

pub use in_memory::InMemoryStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
