//! # BoardService
//!
//! Orchestrates a submission: rate limit → identity → command dispatch or
//! ordinary post → retention check. Also owns the topic update and the
//! public read projections.
//!
//! Every mutation runs under `writer`, so each read-then-write pair (resolve
//! `/del` positions then delete, compute the retained set then prune) sees
//! no interleaved writer. Reads never take the lock.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    BannedWordFilter, DomainError, Identity, Post, PostPredicate, PostStore, RateLimiter,
    Result, Role, RoleAssignment, RoleStore,
};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::commands::{Command, COLOR_PATTERN_PREFIX};
use crate::identity;
use crate::retention::{self, PRUNE_KEEP};
use crate::roles::RoleResolver;

/// Posts from the same seed must be at least this far apart.
pub const MIN_POST_INTERVAL_MS: i64 = 1000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Tunables that are product copy rather than policy.
#[derive(Debug, Clone)]
pub struct BoardSettings {
    /// Topic attached to posts while the board is empty.
    pub default_topic: String,
    pub max_name_len: usize,
    pub max_content_len: usize,
    pub max_topic_len: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            default_topic: "No topic yet".to_string(),
            max_name_len: 25,
            max_content_len: 100,
            max_topic_len: 100,
        }
    }
}

/// Raw submission as received from the transport.
#[derive(Debug, Clone, Default)]
pub struct SubmitPost {
    pub name: String,
    pub seed: String,
    pub content: String,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    /// Identity derived from the submitted seed; the transport remembers it.
    pub identity: Identity,
    pub outcome: Dispatched,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// Ordinary post stored. `pruned` counts posts removed by retention.
    Posted { post: Post, pruned: u64 },
    Command(CommandOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Cleared { deleted: u64 },
    /// `unresolved` lists requested positions beyond the current listing.
    Deleted { positions: Vec<usize>, unresolved: Vec<usize> },
    Destroyed { pattern: String, deleted: u64 },
}

impl CommandOutcome {
    pub fn command(&self) -> &'static str {
        match self {
            CommandOutcome::Cleared { .. } => "clear",
            CommandOutcome::Deleted { .. } => "del",
            CommandOutcome::Destroyed { .. } => "destroy",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CommandOutcome::Cleared { deleted } => format!("cleared {deleted} posts"),
            CommandOutcome::Deleted { positions, .. } => {
                let list: Vec<String> = positions.iter().map(ToString::to_string).collect();
                format!("deleted posts {}", list.join(", "))
            }
            CommandOutcome::Destroyed { pattern, deleted } => {
                format!("destroyed {deleted} posts matching \"{pattern}\"")
            }
        }
    }
}

/// Who is asking for a topic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    /// Explicit seed; identity is re-derived.
    Seed(String),
    /// Identity remembered from an earlier successful post.
    Remembered(Identity),
}

impl Requester {
    /// An explicit, non-blank seed wins over a remembered identity.
    pub fn resolve(seed: Option<String>, remembered: Option<Identity>) -> Option<Requester> {
        match seed {
            Some(seed) if !seed.trim().is_empty() => Some(Requester::Seed(seed)),
            _ => remembered.map(Requester::Remembered),
        }
    }

    fn identity(&self) -> Identity {
        match self {
            Requester::Seed(seed) => identity::derive(seed),
            Requester::Remembered(id) => id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicUpdated {
    pub identity: Identity,
    pub topic: String,
    /// Posts whose topic field was rewritten.
    pub rewritten: u64,
}

pub struct BoardService {
    posts: Arc<dyn PostStore>,
    role_store: Arc<dyn RoleStore>,
    roles: RoleResolver,
    limiter: Arc<dyn RateLimiter>,
    filter: Arc<dyn BannedWordFilter>,
    settings: BoardSettings,
    writer: Mutex<()>,
}

impl BoardService {
    pub fn new(
        posts: Arc<dyn PostStore>,
        role_store: Arc<dyn RoleStore>,
        limiter: Arc<dyn RateLimiter>,
        filter: Arc<dyn BannedWordFilter>,
        settings: BoardSettings,
    ) -> Self {
        Self {
            posts,
            roles: RoleResolver::new(role_store.clone()),
            role_store,
            limiter,
            filter,
            settings,
            writer: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    /// Handles one submission end to end.
    ///
    /// The rate-limit ledger is keyed on the raw seed, not the derived identity.
    #[instrument(skip_all, fields(name = %req.name))]
    pub async fn submit(&self, req: SubmitPost) -> Result<Submitted> {
        self.validate_submission(&req)?;

        let now_ms = Utc::now().timestamp_millis();
        if !self.limiter.allow(&req.seed, now_ms) {
            debug!("submission rate limited");
            return Err(DomainError::RateLimited(
                "wait a moment before posting again".to_string(),
            ));
        }

        let identity = identity::derive(&req.seed);
        let outcome = self.dispatch(&identity, &req.name, &req.content).await?;
        Ok(Submitted { identity, outcome })
    }

    /// Runs `text` as a moderation command when it starts with the command
    /// marker, otherwise stores it as an ordinary post by `identity`.
    pub async fn dispatch(&self, identity: &Identity, name: &str, text: &str) -> Result<Dispatched> {
        match Command::parse(text) {
            Some(command) => self
                .run_command(identity, command)
                .await
                .map(Dispatched::Command),
            None => self.create_post(identity, name, text).await,
        }
    }

    async fn run_command(&self, identity: &Identity, command: Command) -> Result<CommandOutcome> {
        let Some(required) = command.required_role() else {
            return Err(DomainError::UnknownCommand(command.name().to_string()));
        };

        let role = self.roles.role_of(identity).await;
        if !role.meets(required) {
            info!(%identity, %role, command = command.name(), "moderation command refused");
            return Err(DomainError::Forbidden(format!(
                "/{} requires {required} or above",
                command.name()
            )));
        }

        let outcome = match command {
            Command::Clear => self.clear().await?,
            Command::Del(positions) => self.delete_positions(&positions).await?,
            Command::Destroy(pattern) => self.destroy(pattern).await?,
            Command::Unknown(word) => return Err(DomainError::UnknownCommand(word)),
        };

        info!(%identity, %role, command = outcome.command(), "{}", outcome.message());
        Ok(outcome)
    }

    async fn clear(&self) -> Result<CommandOutcome> {
        let _guard = self.writer.lock().await;
        let deleted = self.posts.delete_all().await?;
        Ok(CommandOutcome::Cleared { deleted })
    }

    /// Positions are resolved against a fresh newest-first listing taken
    /// under the writer lock; they are never cached across requests.
    async fn delete_positions(&self, positions: &[usize]) -> Result<CommandOutcome> {
        if positions.is_empty() {
            return Err(DomainError::validation("/del needs at least one post number"));
        }

        let _guard = self.writer.lock().await;
        let listing = self.posts.list_all().await?;

        let mut ids = Vec::new();
        let mut resolved = Vec::new();
        let mut unresolved = Vec::new();
        for &n in positions {
            match n.checked_sub(1).and_then(|i| listing.get(i)) {
                Some(post) => {
                    ids.push(post.id);
                    resolved.push(n);
                }
                None => unresolved.push(n),
            }
        }

        if ids.is_empty() {
            return Err(DomainError::NotFound(format!(
                "no post at positions {positions:?}"
            )));
        }

        self.posts.delete_by_ids(&ids).await?;
        Ok(CommandOutcome::Deleted {
            positions: resolved,
            unresolved,
        })
    }

    async fn destroy(&self, pattern: String) -> Result<CommandOutcome> {
        if pattern.is_empty() {
            return Err(DomainError::validation("/destroy needs a pattern"));
        }
        if pattern.starts_with(COLOR_PATTERN_PREFIX) {
            return Err(DomainError::validation(
                "colour patterns are not implemented",
            ));
        }

        let _guard = self.writer.lock().await;
        let deleted = self
            .posts
            .delete_where(&PostPredicate::ContentOrAuthorContains(pattern.clone()))
            .await?;
        Ok(CommandOutcome::Destroyed { pattern, deleted })
    }

    /// Inserts an ordinary post, then prunes synchronously when the board
    /// has grown past the retention threshold.
    async fn create_post(&self, identity: &Identity, name: &str, content: &str) -> Result<Dispatched> {
        if self.filter.contains_banned(name) || self.filter.contains_banned(content) {
            return Err(DomainError::validation("message contains a banned word"));
        }

        let _guard = self.writer.lock().await;
        let topic = self.current_topic().await?;
        let now = Utc::now();
        let post = Post {
            id: Uuid::now_v7(),
            name: name.to_string(),
            content: content.to_string(),
            author: identity.clone(),
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            topic,
            created_at: now,
        };
        self.posts.insert(post.clone()).await?;

        // The post is stored; retention failures are logged, not returned.
        let pruned = match self.enforce_retention().await {
            Ok(pruned) => pruned,
            Err(err) => {
                warn!(error = %err, "retention pass failed; post kept");
                0
            }
        };

        Ok(Dispatched::Posted { post, pruned })
    }

    async fn enforce_retention(&self) -> Result<u64> {
        let count = self.posts.count().await?;
        if retention::needs_pruning(count) {
            retention::prune(self.posts.as_ref(), PRUNE_KEEP).await
        } else {
            Ok(0)
        }
    }

    /// Rewrites the topic field of every stored post. Historical posts
    /// change too; an empty board stays on the default topic.
    #[instrument(skip_all)]
    pub async fn update_topic(&self, requester: Option<Requester>, topic: &str) -> Result<TopicUpdated> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(DomainError::validation("topic is required"));
        }
        if topic.chars().count() > self.settings.max_topic_len {
            return Err(DomainError::validation(format!(
                "topic must be at most {} characters",
                self.settings.max_topic_len
            )));
        }
        let Some(requester) = requester else {
            return Err(DomainError::validation(
                "seed is required when no identity is remembered",
            ));
        };

        let identity = requester.identity();
        let role = self.roles.role_of(&identity).await;
        if !role.meets(Role::Manager) {
            return Err(DomainError::Forbidden(format!(
                "changing the topic requires {} or above",
                Role::Manager
            )));
        }

        let _guard = self.writer.lock().await;
        let rewritten = self.posts.update_topic(topic).await?;
        info!(%identity, %role, rewritten, "topic updated");
        Ok(TopicUpdated {
            identity,
            topic: topic.to_string(),
            rewritten,
        })
    }

    /// Topic of the newest post, or the default while the board is empty.
    pub async fn current_topic(&self) -> Result<String> {
        Ok(self
            .posts
            .latest_topic()
            .await?
            .unwrap_or_else(|| self.settings.default_topic.clone()))
    }

    /// Newest first; index `i` is display position `i + 1`.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        self.posts.list_all().await
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleAssignment>> {
        self.role_store.list().await
    }

    pub async fn list_admins(&self) -> Result<Vec<Identity>> {
        Ok(self
            .role_store
            .list()
            .await?
            .into_iter()
            .filter(|a| a.role == Role::Admin)
            .map(|a| a.identity)
            .collect())
    }

    fn validate_submission(&self, req: &SubmitPost) -> Result<()> {
        for (field, value) in [("name", &req.name), ("seed", &req.seed), ("content", &req.content)] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!("{field} is required")));
            }
        }
        if req.name.chars().count() > self.settings.max_name_len {
            return Err(DomainError::validation(format!(
                "name must be at most {} characters",
                self.settings.max_name_len
            )));
        }
        if req.content.chars().count() > self.settings.max_content_len {
            return Err(DomainError::validation(format!(
                "content must be at most {} characters",
                self.settings.max_content_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockBannedWordFilter, MockPostStore, MockRateLimiter, MockRoleStore};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    struct Mocks {
        posts: MockPostStore,
        roles: MockRoleStore,
        limiter: MockRateLimiter,
        filter: MockBannedWordFilter,
    }

    impl Mocks {
        fn new() -> Self {
            let mut limiter = MockRateLimiter::new();
            limiter.expect_allow().returning(|_, _| true);
            let mut filter = MockBannedWordFilter::new();
            filter.expect_contains_banned().returning(|_| false);
            Self {
                posts: MockPostStore::new(),
                roles: MockRoleStore::new(),
                limiter,
                filter,
            }
        }

        fn with_role(mut self, role: Option<Role>) -> Self {
            self.roles.expect_get().returning(move |_| Ok(role));
            self
        }

        fn build(self) -> BoardService {
            BoardService::new(
                Arc::new(self.posts),
                Arc::new(self.roles),
                Arc::new(self.limiter),
                Arc::new(self.filter),
                BoardSettings::default(),
            )
        }
    }

    fn submit(content: &str) -> SubmitPost {
        SubmitPost {
            name: "X".into(),
            seed: "abc".into(),
            content: content.into(),
        }
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_rate_limiting() {
        let mut mocks = Mocks::new();
        mocks.limiter = MockRateLimiter::new();
        mocks.limiter.expect_allow().never();
        let service = mocks.build();

        let mut req = submit("hello");
        req.seed = "   ".into();
        let err = assert_err!(service.submit(req).await);
        assert_eq!(err, DomainError::validation("seed is required"));
    }

    #[tokio::test]
    async fn over_long_content_is_rejected() {
        let service = Mocks::new().build();
        let err = assert_err!(service.submit(submit(&"a".repeat(101))).await);
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn rate_limiter_is_keyed_on_raw_seed() {
        let mut mocks = Mocks::new();
        mocks.limiter = MockRateLimiter::new();
        mocks
            .limiter
            .expect_allow()
            .withf(|key, _| key == "abc")
            .return_const(false);
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("hello")).await);
        assert!(matches!(err, DomainError::RateLimited(_)));
    }

    #[tokio::test]
    async fn speaker_cannot_clear() {
        let mut mocks = Mocks::new().with_role(Some(Role::Speaker));
        mocks.posts.expect_delete_all().never();
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("/clear")).await);
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn moderator_clears_everything() {
        let mut mocks = Mocks::new().with_role(Some(Role::Moderator));
        mocks.posts.expect_delete_all().times(1).returning(|| Ok(7));
        let service = mocks.build();

        let submitted = assert_ok!(service.submit(submit("/clear")).await);
        assert_eq!(
            submitted.outcome,
            Dispatched::Command(CommandOutcome::Cleared { deleted: 7 })
        );
    }

    #[tokio::test]
    async fn unknown_command_is_rejected_for_any_role() {
        let mut mocks = Mocks::new().with_role(Some(Role::Admin));
        mocks.posts.expect_delete_all().never();
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("/ban @1234567")).await);
        assert_eq!(err, DomainError::UnknownCommand("ban".into()));
    }

    #[tokio::test]
    async fn del_without_numbers_is_a_validation_error() {
        let service = Mocks::new().with_role(Some(Role::Manager)).build();
        let err = assert_err!(service.submit(submit("/del first")).await);
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn destroy_rejects_color_patterns() {
        let mut mocks = Mocks::new().with_role(Some(Role::Moderator));
        mocks.posts.expect_delete_where().never();
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("/destroy (color) red")).await);
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn destroy_passes_rejoined_pattern() {
        let mut mocks = Mocks::new().with_role(Some(Role::Admin));
        mocks
            .posts
            .expect_delete_where()
            .with(eq(PostPredicate::ContentOrAuthorContains("buy now".into())))
            .returning(|_| Ok(2));
        let service = mocks.build();

        let submitted = assert_ok!(service.submit(submit("/destroy buy   now")).await);
        assert_eq!(
            submitted.outcome,
            Dispatched::Command(CommandOutcome::Destroyed {
                pattern: "buy now".into(),
                deleted: 2
            })
        );
    }

    #[tokio::test]
    async fn role_store_failure_means_blue() {
        let mut mocks = Mocks::new();
        mocks
            .roles
            .expect_get()
            .returning(|_| Err(DomainError::storage("down")));
        mocks.posts.expect_delete_all().never();
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("/clear")).await);
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn storage_failure_surfaces_on_insert() {
        let mut mocks = Mocks::new();
        mocks.posts.expect_latest_topic().returning(|| Ok(None));
        mocks
            .posts
            .expect_insert()
            .returning(|_| Err(DomainError::storage("disk full")));
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("hello")).await);
        assert_eq!(err, DomainError::storage("disk full"));
    }

    #[tokio::test]
    async fn retention_failure_after_insert_still_reports_the_post() {
        let mut mocks = Mocks::new();
        mocks.posts.expect_latest_topic().returning(|| Ok(None));
        mocks.posts.expect_insert().times(1).returning(|_| Ok(()));
        mocks
            .posts
            .expect_count()
            .returning(|| Err(DomainError::storage("timeout")));
        mocks.posts.expect_delete_by_ids().never();
        let service = mocks.build();

        let submitted = assert_ok!(service.submit(submit("hello")).await);
        match submitted.outcome {
            Dispatched::Posted { post, pruned } => {
                assert_eq!(post.content, "hello");
                assert_eq!(pruned, 0);
            }
            other => panic!("expected a post, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn banned_words_block_ordinary_posts() {
        let mut mocks = Mocks::new();
        mocks.filter = MockBannedWordFilter::new();
        mocks
            .filter
            .expect_contains_banned()
            .returning(|text| text.contains("spam"));
        mocks.posts.expect_insert().never();
        let service = mocks.build();

        let err = assert_err!(service.submit(submit("spam spam")).await);
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn topic_update_requires_manager() {
        let mut mocks = Mocks::new().with_role(Some(Role::Speaker));
        mocks.posts.expect_update_topic().never();
        let service = mocks.build();

        let err = assert_err!(
            service
                .update_topic(Some(Requester::Seed("abc".into())), "news")
                .await
        );
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn topic_update_without_requester_is_rejected() {
        let service = Mocks::new().build();
        let err = assert_err!(service.update_topic(None, "news").await);
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn explicit_seed_wins_over_remembered_identity() {
        let remembered = Identity::new("@1111111");
        assert_eq!(
            Requester::resolve(Some("abc".into()), Some(remembered.clone())),
            Some(Requester::Seed("abc".into()))
        );
        assert_eq!(
            Requester::resolve(Some("  ".into()), Some(remembered.clone())),
            Some(Requester::Remembered(remembered))
        );
        assert_eq!(Requester::resolve(None, None), None);
    }
}
