//! Request and response bodies.

use domains::{Identity, Post, Role, RoleAssignment};
use serde::{Deserialize, Serialize};
use services::{CommandOutcome, Dispatched, TopicUpdated};
use uuid::Uuid;

/// Missing fields deserialize as empty and are rejected by validation, so
/// the caller gets a 400 with a field name instead of a parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRequest {
    pub name: String,
    pub seed: String,
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopicRequest {
    pub topic: String,
    pub seed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostView {
    /// 1-based display position, as addressed by `/del`.
    pub number: usize,
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub identity: Identity,
    pub timestamp: String,
    pub topic: String,
}

impl PostView {
    pub fn listing(posts: Vec<Post>) -> Vec<PostView> {
        posts
            .into_iter()
            .enumerate()
            .map(|(i, post)| PostView::at(i + 1, post))
            .collect()
    }

    fn at(number: usize, post: Post) -> Self {
        Self {
            number,
            id: post.id,
            name: post.name,
            content: post.content,
            identity: post.author,
            timestamp: post.timestamp,
            topic: post.topic,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmitResponse {
    Post {
        message: String,
        identity: Identity,
        post: PostView,
        pruned: u64,
    },
    Command {
        command: &'static str,
        message: String,
        identity: Identity,
        #[serde(skip_serializing_if = "Option::is_none")]
        deleted: Option<u64>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        positions: Vec<usize>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        unresolved: Vec<usize>,
    },
}

impl SubmitResponse {
    pub fn new(identity: Identity, outcome: Dispatched) -> Self {
        match outcome {
            Dispatched::Posted { post, pruned } => SubmitResponse::Post {
                message: "posted".to_string(),
                identity,
                post: PostView::at(1, post),
                pruned,
            },
            Dispatched::Command(outcome) => {
                let command = outcome.command();
                let message = outcome.message();
                let (deleted, positions, unresolved) = match outcome {
                    CommandOutcome::Cleared { deleted } => (Some(deleted), vec![], vec![]),
                    CommandOutcome::Deleted {
                        positions,
                        unresolved,
                    } => (None, positions, unresolved),
                    CommandOutcome::Destroyed { deleted, .. } => (Some(deleted), vec![], vec![]),
                };
                SubmitResponse::Command {
                    command,
                    message,
                    identity,
                    deleted,
                    positions,
                    unresolved,
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewritten: Option<u64>,
}

impl From<TopicUpdated> for TopicResponse {
    fn from(updated: TopicUpdated) -> Self {
        Self {
            topic: updated.topic,
            rewritten: Some(updated.rewritten),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleView {
    pub identity: Identity,
    pub role: Role,
    pub rank: u8,
}

impl From<RoleAssignment> for RoleView {
    fn from(a: RoleAssignment) -> Self {
        Self {
            rank: a.role.rank(),
            identity: a.identity,
            role: a.role,
        }
    }
}
