//! Trait definitions for extensible components
//!
//! These traits let users plug in their own queue engine and key-value
//! store underneath the unique job registry.

pub mod job;
pub mod store;
