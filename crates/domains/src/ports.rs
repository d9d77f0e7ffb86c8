//! # Ports
//!
//! Any storage or policy adapter must implement these traits to be wired
//! into the board service.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Identity, Post, PostPredicate, Role, RoleAssignment};

/// Persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert(&self, post: Post) -> Result<()>;

    /// Every post, newest first.
    async fn list_all(&self) -> Result<Vec<Post>>;

    /// Topic of the most recently created post, if any post exists.
    async fn latest_topic(&self) -> Result<Option<String>>;

    async fn count(&self) -> Result<u64>;

    /// Returns the number of rows removed.
    async fn delete_all(&self) -> Result<u64>;

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64>;

    async fn delete_where(&self, predicate: &PostPredicate) -> Result<u64>;

    /// Overwrites the topic column of every stored post.
    async fn update_topic(&self, topic: &str) -> Result<u64>;
}

/// Read-only role lookup. Assignments are written by an administrative
/// process outside the request path.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// `None` when the identity has no stored assignment.
    async fn get(&self, identity: &Identity) -> Result<Option<Role>>;

    async fn list(&self) -> Result<Vec<RoleAssignment>>;
}

/// Per-key post throttle.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait RateLimiter: Send + Sync {
    /// Returns `true` and records `now_ms` when the key may post; returns
    /// `false` and leaves the ledger untouched otherwise. Never blocks.
    fn allow(&self, key: &str, now_ms: i64) -> bool;
}

/// Static banned-word check applied to ordinary posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait BannedWordFilter: Send + Sync {
    fn contains_banned(&self, text: &str) -> bool;
}
