//! Job queue engines
//!
//! Reference implementations of [`JobQueue`](crate::traits::job::JobQueue)
//! used underneath the unique submission layer: an in-memory queue and,
//! with the `redis` feature, a Redis-backed one.

mod in_memory;

#[cfg(feature = "redis")]
mod redis;

pub use in_memory::InMemoryJobQueue;

#[cfg(feature = "redis")]
pub use self::redis::RedisJobQueue;
