//! # In-memory stores
//!
//! Process-local `PostStore` and `RoleStore`. Used when no database is
//! configured and by the test suites.

use async_trait::async_trait;
use dashmap::DashMap;
use domains::{Identity, Post, PostPredicate, PostStore, Result, Role, RoleAssignment, RoleStore};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Posts kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, post: Post) -> Result<()> {
        self.posts.write().await.push(post);
        Ok(())
    }

    /// Latest insertion first. `created_at` is not consulted, so a wall clock
    /// stepping backwards cannot reorder the board.
    async fn list_all(&self) -> Result<Vec<Post>> {
        Ok(self.posts.read().await.iter().rev().cloned().collect())
    }

    async fn latest_topic(&self) -> Result<Option<String>> {
        Ok(self.posts.read().await.last().map(|p| p.topic.clone()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.posts.read().await.len() as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let deleted = posts.len() as u64;
        posts.clear();
        Ok(deleted)
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| !ids.contains(&p.id));
        Ok((before - posts.len()) as u64)
    }

    async fn delete_where(&self, predicate: &PostPredicate) -> Result<u64> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| !predicate.matches(p));
        Ok((before - posts.len()) as u64)
    }

    async fn update_topic(&self, topic: &str) -> Result<u64> {
        let mut posts = self.posts.write().await;
        for post in posts.iter_mut() {
            post.topic = topic.to_string();
        }
        Ok(posts.len() as u64)
    }
}

/// Role assignments keyed by identity.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: DashMap<Identity, Role>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative write; replaces any existing assignment.
    pub fn assign(&self, identity: Identity, role: Role) {
        self.roles.insert(identity, role);
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn get(&self, identity: &Identity) -> Result<Option<Role>> {
        Ok(self.roles.get(identity).map(|entry| *entry.value()))
    }

    async fn list(&self) -> Result<Vec<RoleAssignment>> {
        let mut all: Vec<RoleAssignment> = self
            .roles
            .iter()
            .map(|entry| RoleAssignment {
                identity: entry.key().clone(),
                role: *entry.value(),
            })
            .collect();
        all.sort_by(|a, b| {
            b.role
                .rank()
                .cmp(&a.role.rank())
                .then_with(|| a.identity.cmp(&b.identity))
        });
        Ok(all)
    }
}
