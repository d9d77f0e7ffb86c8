//! # Domain Models
//!
//! These structs represent the core entities of the board.
//! Post ids are UUID v7, so they are time-ordered and never derived from
//! the author's seed.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public pseudonym derived from a secret seed (e.g. `@e0e0a1b`).
///
/// Only this value is ever stored; the seed never leaves the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps an already-derived identity string (read back from storage or a
    /// verified cookie). Use `services::identity::derive` to build one from a seed.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Privilege tier. Declaration order is rank order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Implicit role of every identity without a stored assignment.
    #[default]
    Blue,
    Speaker,
    Manager,
    Moderator,
    Summit,
    Admin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Blue,
        Role::Speaker,
        Role::Manager,
        Role::Moderator,
        Role::Summit,
        Role::Admin,
    ];

    /// Numeric rank; higher outranks lower.
    pub const fn rank(self) -> u8 {
        match self {
            Role::Blue => 0,
            Role::Speaker => 10,
            Role::Manager => 20,
            Role::Moderator => 30,
            Role::Summit => 40,
            Role::Admin => 50,
        }
    }

    /// `true` when `self` meets or exceeds `required`.
    pub const fn meets(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Blue => "blue",
            Role::Speaker => "speaker",
            Role::Manager => "manager",
            Role::Moderator => "moderator",
            Role::Summit => "summit",
            Role::Admin => "admin",
        }
    }

    /// Strict parse; `None` for names outside the fixed set.
    pub fn parse(name: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Parse used when reading stored rows: unknown names rank as BLUE
    /// instead of failing the read.
    pub fn from_stored(name: &str) -> Role {
        Role::parse(name).unwrap_or(Role::Blue)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored Identity → Role mapping. At most one per identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub identity: Identity,
    pub role: Role,
}

/// The fundamental unit of conversation. Immutable once created, except for
/// the board-wide topic rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    /// Display name typed by the poster
    pub name: String,
    pub content: String,
    /// Derived identity of the author
    pub author: Identity,
    /// Human-readable creation time
    pub timestamp: String,
    /// Topic active when the post was made (or rewritten since)
    pub topic: String,
    /// Ordering key; listings are newest first
    pub created_at: DateTime<Utc>,
}

/// Row filter for bulk deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostPredicate {
    /// Content or author identity contains the pattern as a substring.
    ContentOrAuthorContains(String),
}

impl PostPredicate {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostPredicate::ContentOrAuthorContains(pattern) => {
                post.content.contains(pattern.as_str())
                    || post.author.as_str().contains(pattern.as_str())
            }
        }
    }
}
