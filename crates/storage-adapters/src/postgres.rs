//! # Postgres stores
//!
//! Maps the `posts` and `user_roles` tables to the domain models. Every
//! statement runs on a pooled connection that is returned to the pool when
//! the query future completes or is dropped, including on error paths.

use async_trait::async_trait;
use domains::{
    DomainError, Identity, Post, PostPredicate, PostStore, Result, Role, RoleAssignment, RoleStore,
};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::error;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id          UUID PRIMARY KEY,
        name        TEXT NOT NULL,
        content     TEXT NOT NULL,
        hashed_id   TEXT NOT NULL,
        timestamp   TEXT NOT NULL,
        topic       TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS posts_created_at_idx ON posts (created_at DESC)",
    "CREATE TABLE IF NOT EXISTS user_roles (
        hashed_id   TEXT PRIMARY KEY,
        role        TEXT NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
];

fn storage_err(err: sqlx::Error) -> DomainError {
    error!(error = %err, "postgres query failed");
    DomainError::storage(err.to_string())
}

/// Opens a bounded pool; acquiring a connection fails after `acquire_timeout`
/// rather than waiting forever.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await
        .map_err(storage_err)
}

/// Creates the tables if they do not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(storage_err)?;
    }
    Ok(())
}

fn row_to_post(row: &PgRow) -> std::result::Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        content: row.try_get("content")?,
        author: Identity::new(row.try_get::<String, _>("hashed_id")?),
        timestamp: row.try_get("timestamp")?,
        topic: row.try_get("topic")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: Post) -> Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, name, content, hashed_id, timestamp, topic, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(post.id)
        .bind(post.name)
        .bind(post.content)
        .bind(post.author.as_str())
        .bind(post.timestamp)
        .bind(post.topic)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, name, content, hashed_id, timestamp, topic, created_at
             FROM posts ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter()
            .map(row_to_post)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage_err)
    }

    async fn latest_topic(&self) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT topic FROM posts ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(count.max(0) as u64)
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM posts")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected())
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM posts WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected())
    }

    /// `strpos` keeps the pattern literal; `%` and `_` are not wildcards.
    async fn delete_where(&self, predicate: &PostPredicate) -> Result<u64> {
        let PostPredicate::ContentOrAuthorContains(pattern) = predicate;
        let result = sqlx::query(
            "DELETE FROM posts WHERE strpos(content, $1) > 0 OR strpos(hashed_id, $1) > 0",
        )
        .bind(pattern.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(result.rows_affected())
    }

    async fn update_topic(&self, topic: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE posts SET topic = $1")
            .bind(topic)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Administrative upsert used by the `seed` tool. Not reachable from
    /// request handlers.
    pub async fn assign(&self, identity: &Identity, role: Role) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_roles (hashed_id, role) VALUES ($1, $2)
             ON CONFLICT (hashed_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(identity.as_str())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    /// Unknown role names in the table rank as BLUE.
    async fn get(&self, identity: &Identity) -> Result<Option<Role>> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM user_roles WHERE hashed_id = $1")
                .bind(identity.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_err)?;
        Ok(role.as_deref().map(Role::from_stored))
    }

    async fn list(&self) -> Result<Vec<RoleAssignment>> {
        let rows = sqlx::query("SELECT hashed_id, role FROM user_roles ORDER BY hashed_id")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        let mut all = rows
            .iter()
            .map(|row| {
                Ok(RoleAssignment {
                    identity: Identity::new(row.try_get::<String, _>("hashed_id")?),
                    role: Role::from_stored(row.try_get::<&str, _>("role")?),
                })
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(storage_err)?;
        all.sort_by(|a, b| b.role.rank().cmp(&a.role.rank()));
        Ok(all)
    }
}
