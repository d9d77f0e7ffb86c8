//! # storage-adapters
//!
//! Implementations of the `domains` storage ports.
//! - [`memory`]: process-local stores, always compiled.
//! - [`rate_limit`]: the in-process post throttle.
//! - `postgres`: sqlx-backed stores behind the `db-postgres` feature.

pub mod memory;
pub mod rate_limit;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::{InMemoryPostStore, InMemoryRoleStore};
pub use rate_limit::InMemoryRateLimiter;

#[cfg(feature = "db-postgres")]
pub use postgres::{PgPostStore, PgRoleStore};
