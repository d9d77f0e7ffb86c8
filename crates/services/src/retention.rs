//! Bounded retention: once the board holds more than [`PRUNE_THRESHOLD`]
//! posts, everything but the newest [`PRUNE_KEEP`] is deleted in one step.

use domains::{PostStore, Result};
use tracing::info;
use uuid::Uuid;

/// Post count above which an insert triggers pruning.
pub const PRUNE_THRESHOLD: u64 = 200;

/// Posts retained by a pruning pass.
pub const PRUNE_KEEP: usize = 3;

pub fn needs_pruning(count: u64) -> bool {
    count > PRUNE_THRESHOLD
}

/// Deletes every post except the `keep` most recent. Returns the number of
/// posts removed; a board already at or below `keep` is left untouched.
///
/// Callers must hold the board's writer lock across this call.
pub async fn prune(store: &dyn PostStore, keep: usize) -> Result<u64> {
    let doomed: Vec<Uuid> = store
        .list_all()
        .await?
        .into_iter()
        .skip(keep)
        .map(|post| post.id)
        .collect();

    if doomed.is_empty() {
        return Ok(0);
    }

    let deleted = store.delete_by_ids(&doomed).await?;
    info!(deleted, keep, "pruned old posts");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domains::{Identity, MockPostStore, Post};

    fn posts(n: usize) -> Vec<Post> {
        let now = Utc::now();
        (0..n)
            .map(|i| Post {
                id: Uuid::now_v7(),
                name: "anon".into(),
                content: format!("post {i}"),
                author: Identity::new("@abcdef0"),
                timestamp: String::new(),
                topic: String::new(),
                created_at: now - Duration::seconds(i as i64),
            })
            .collect()
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!needs_pruning(200));
        assert!(needs_pruning(201));
    }

    #[tokio::test]
    async fn deletes_everything_but_the_newest() {
        let listing = posts(201);
        let expected: Vec<Uuid> = listing[PRUNE_KEEP..].iter().map(|p| p.id).collect();

        let mut store = MockPostStore::new();
        store.expect_list_all().return_once(move || Ok(listing));
        store
            .expect_delete_by_ids()
            .withf(move |ids| ids == expected.as_slice())
            .return_once(|ids| Ok(ids.len() as u64));

        assert_eq!(prune(&store, PRUNE_KEEP).await, Ok(198));
    }

    #[tokio::test]
    async fn small_board_is_a_no_op() {
        let listing = posts(3);
        let mut store = MockPostStore::new();
        store.expect_list_all().return_once(move || Ok(listing));
        store.expect_delete_by_ids().never();

        assert_eq!(prune(&store, PRUNE_KEEP).await, Ok(0));
    }
}
