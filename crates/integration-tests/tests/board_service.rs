use domains::{DomainError, Role};
use integration_tests::{
    submission, TestBoard, ADMIN_SEED, MANAGER_SEED, MODERATOR_SEED, SPEAKER_SEED,
};
use services::{identity, CommandOutcome, Dispatched, Requester};

#[tokio::test]
async fn first_post_gets_default_topic_and_repeat_is_rate_limited() {
    let board = TestBoard::new();

    let submitted = board
        .service
        .submit(submission("abc", "hello"))
        .await
        .expect("first post");
    assert_eq!(submitted.identity, identity::derive("abc"));
    match submitted.outcome {
        Dispatched::Posted { post, pruned } => {
            assert_eq!(post.topic, "No topic yet");
            assert_eq!(post.name, "X");
            assert_eq!(post.author.as_str(), "@ba7816b");
            assert_eq!(pruned, 0);
        }
        other => panic!("expected a post, got {other:?}"),
    }

    let again = board.service.submit(submission("abc", "hello again")).await;
    assert!(matches!(again, Err(DomainError::RateLimited(_))));
    assert_eq!(board.contents().await, vec!["hello"]);
}

#[tokio::test]
async fn different_seeds_are_throttled_independently() {
    let board = TestBoard::new();
    board.service.submit(submission("a", "one")).await.unwrap();
    board.service.submit(submission("b", "two")).await.unwrap();
    assert_eq!(board.contents().await, vec!["two", "one"]);
}

#[tokio::test]
async fn new_posts_inherit_the_latest_topic() {
    let board = TestBoard::new();
    board.seed_posts(2).await;

    let submitted = board.service.submit(submission("abc", "hi")).await.unwrap();
    let Dispatched::Posted { post, .. } = submitted.outcome else {
        panic!("expected a post");
    };
    assert_eq!(post.topic, "old topic");
}

#[tokio::test]
async fn speaker_clear_is_forbidden_and_leaves_posts() {
    let board = TestBoard::new();
    board.seed_posts(3).await;

    let result = board.service.submit(submission(SPEAKER_SEED, "/clear")).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert_eq!(board.contents().await.len(), 3);
}

#[tokio::test]
async fn moderator_clear_deletes_everything() {
    let board = TestBoard::new();
    board.seed_posts(3).await;

    let submitted = board
        .service
        .submit(submission(MODERATOR_SEED, "/clear"))
        .await
        .unwrap();
    assert_eq!(
        submitted.outcome,
        Dispatched::Command(CommandOutcome::Cleared { deleted: 3 })
    );
    assert!(board.contents().await.is_empty());
}

#[tokio::test]
async fn del_skips_unresolved_positions_when_one_resolves() {
    let board = TestBoard::new();
    board.seed_posts(3).await;

    let submitted = board
        .service
        .submit(submission(MANAGER_SEED, "/del 1 5"))
        .await
        .unwrap();
    assert_eq!(
        submitted.outcome,
        Dispatched::Command(CommandOutcome::Deleted {
            positions: vec![1],
            unresolved: vec![5],
        })
    );
    assert_eq!(board.contents().await, vec!["seeded 1", "seeded 0"]);
}

#[tokio::test]
async fn del_positions_are_recomputed_per_request() {
    let board = TestBoard::new();
    board.seed_posts(3).await;
    let manager = identity::derive(MANAGER_SEED);

    board.service.dispatch(&manager, "X", "/del 1").await.unwrap();
    board.service.dispatch(&manager, "X", "/del 1").await.unwrap();
    assert_eq!(board.contents().await, vec!["seeded 0"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_dels_each_remove_a_distinct_post() {
    let board = TestBoard::new();
    board.seed_posts(3).await;
    let manager = identity::derive(MANAGER_SEED);

    let (a, b) = {
        let (first, second) = (board.service.clone(), board.service.clone());
        let (m1, m2) = (manager.clone(), manager.clone());
        tokio::join!(
            tokio::spawn(async move { first.dispatch(&m1, "X", "/del 1").await }),
            tokio::spawn(async move { second.dispatch(&m2, "X", "/del 1").await }),
        )
    };
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    assert_eq!(board.contents().await, vec!["seeded 0"]);
}

#[tokio::test]
async fn del_with_nothing_resolvable_is_not_found() {
    let board = TestBoard::new();
    board.seed_posts(2).await;

    let result = board
        .service
        .submit(submission(MANAGER_SEED, "/del 0 3 9"))
        .await;
    assert!(matches!(result, Err(DomainError::NotFound(_))));
    assert_eq!(board.contents().await.len(), 2);
}

#[tokio::test]
async fn del_requires_manager() {
    let board = TestBoard::new();
    board.seed_posts(1).await;

    let result = board.service.submit(submission(SPEAKER_SEED, "/del 1")).await;
    assert!(matches!(result, Err(DomainError::Forbidden(_))));
    assert_eq!(board.contents().await.len(), 1);
}

#[tokio::test]
async fn destroy_matches_content_and_author() {
    let board = TestBoard::new();
    board.seed_posts(3).await;
    board.service.submit(submission("troll", "nothing to see")).await.unwrap();
    let troll = identity::derive("troll");
    let moderator = identity::derive(MODERATOR_SEED);

    let outcome = board
        .service
        .dispatch(&moderator, "X", "/destroy seeded 2")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        Dispatched::Command(CommandOutcome::Destroyed {
            pattern: "seeded 2".into(),
            deleted: 1,
        })
    );

    let by_author = format!("/destroy {troll}");
    board.service.dispatch(&moderator, "X", &by_author).await.unwrap();
    assert_eq!(board.contents().await, vec!["seeded 1", "seeded 0"]);
}

#[tokio::test]
async fn destroy_without_pattern_is_validation_error() {
    let board = TestBoard::new();
    let result = board.service.submit(submission(ADMIN_SEED, "/destroy   ")).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn manager_topic_update_rewrites_history() {
    let board = TestBoard::new();
    board.seed_posts(4).await;

    let updated = board
        .service
        .update_topic(Some(Requester::Seed(MANAGER_SEED.into())), "  fresh news ")
        .await
        .unwrap();
    assert_eq!(updated.rewritten, 4);
    assert_eq!(updated.topic, "fresh news");

    let posts = board.service.list_posts().await.unwrap();
    assert!(posts.iter().all(|p| p.topic == "fresh news"));
    assert_eq!(board.service.current_topic().await.unwrap(), "fresh news");

    let submitted = board.service.submit(submission("abc", "after")).await.unwrap();
    let Dispatched::Posted { post, .. } = submitted.outcome else {
        panic!("expected a post");
    };
    assert_eq!(post.topic, "fresh news");
}

#[tokio::test]
async fn remembered_identity_can_update_topic() {
    let board = TestBoard::new();
    board.seed_posts(1).await;
    let remembered = identity::derive(ADMIN_SEED);

    let requester = Requester::resolve(None, Some(remembered.clone()));
    let updated = board.service.update_topic(requester, "by cookie").await.unwrap();
    assert_eq!(updated.identity, remembered);
}

#[tokio::test]
async fn admins_listing_only_has_admins() {
    let board = TestBoard::new();
    let admins = board.service.list_admins().await.unwrap();
    assert_eq!(admins, vec![identity::derive(ADMIN_SEED)]);

    let roles = board.service.list_roles().await.unwrap();
    assert_eq!(roles.len(), 4);
    assert_eq!(roles[0].role, Role::Admin);
}
