//! Shared fixtures for the cross-crate test suites.

use std::sync::Arc;

use chrono::{Duration, Utc};
use domains::{Identity, Post, PostStore, Role};
use services::{identity, BoardService, BoardSettings, SubmitPost, WordListFilter, MIN_POST_INTERVAL_MS};
use storage_adapters::{InMemoryPostStore, InMemoryRateLimiter, InMemoryRoleStore};
use uuid::Uuid;

pub const ADMIN_SEED: &str = "admin-seed";
pub const MODERATOR_SEED: &str = "moderator-seed";
pub const MANAGER_SEED: &str = "manager-seed";
pub const SPEAKER_SEED: &str = "speaker-seed";

/// A board over in-memory adapters with one identity per role.
pub struct TestBoard {
    pub service: Arc<BoardService>,
    pub posts: Arc<InMemoryPostStore>,
    pub roles: Arc<InMemoryRoleStore>,
}

impl TestBoard {
    pub fn new() -> Self {
        let posts = Arc::new(InMemoryPostStore::new());
        let roles = Arc::new(InMemoryRoleStore::new());
        for (seed, role) in [
            (ADMIN_SEED, Role::Admin),
            (MODERATOR_SEED, Role::Moderator),
            (MANAGER_SEED, Role::Manager),
            (SPEAKER_SEED, Role::Speaker),
        ] {
            roles.assign(identity::derive(seed), role);
        }

        let service = Arc::new(BoardService::new(
            posts.clone(),
            roles.clone(),
            Arc::new(InMemoryRateLimiter::new(MIN_POST_INTERVAL_MS)),
            Arc::new(WordListFilter::default()),
            BoardSettings::default(),
        ));

        Self {
            service,
            posts,
            roles,
        }
    }

    /// Inserts `n` posts directly into the store, oldest first, bypassing
    /// the rate limiter. Post `i` has content `"seeded {i}"`.
    pub async fn seed_posts(&self, n: usize) {
        let base = Utc::now() - Duration::hours(1);
        for i in 0..n {
            let post = Post {
                id: Uuid::now_v7(),
                name: "seeded".into(),
                content: format!("seeded {i}"),
                author: Identity::new("@0000000"),
                timestamp: String::new(),
                topic: "old topic".into(),
                created_at: base + Duration::milliseconds(i as i64),
            };
            self.posts.insert(post).await.expect("in-memory insert");
        }
    }

    pub async fn contents(&self) -> Vec<String> {
        self.posts
            .list_all()
            .await
            .expect("in-memory list")
            .into_iter()
            .map(|p| p.content)
            .collect()
    }
}

impl Default for TestBoard {
    fn default() -> Self {
        Self::new()
    }
}

pub fn submission(seed: &str, content: &str) -> SubmitPost {
    SubmitPost {
        name: "X".into(),
        seed: seed.into(),
        content: content.into(),
    }
}

#[cfg(feature = "web-axum")]
pub mod http {
    use api_adapters::{build_router, AppState};
    use auth_adapters::IdentityCookieCodec;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use secrecy::SecretString;
    use serde_json::Value;

    use super::TestBoard;

    pub fn router(board: &TestBoard) -> Router {
        let codec = IdentityCookieCodec::new(SecretString::from("integration".to_string()));
        build_router(AppState::new(board.service.clone(), codec, false))
    }

    pub fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request")
    }

    pub async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    /// `name=value` part of the response's `Set-Cookie` header.
    pub fn cookie_pair(response: &Response) -> Option<String> {
        response
            .headers()
            .get(header::SET_COOKIE)?
            .to_str()
            .ok()?
            .split(';')
            .next()
            .map(str::to_string)
    }
}
