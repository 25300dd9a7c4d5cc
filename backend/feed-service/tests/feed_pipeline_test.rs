//! End-to-end feed assembly against in-memory and failing collaborators.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use feed_service::config::FeedConfig;
use feed_service::models::{
    Candidate, ContextFilter, FeedContext, FeedRequest, FeedType, PageOptions, PageSource,
    UserProfile,
};
use feed_service::services::weights::EVENT_WEIGHTS;
use feed_service::sources::{
    CandidateSource, InMemoryCandidateStore, InMemoryProfileStore, UserProfileStore,
};
use feed_service::{BatchRanker, FeedAssembler, FeedError, ScoringEngine, WeightRegistry};

fn ranker() -> Arc<BatchRanker> {
    let engine = ScoringEngine::new(Arc::new(WeightRegistry::builtin()));
    Arc::new(BatchRanker::new(Arc::new(engine)))
}

fn assembler_with(
    profiles: Arc<dyn UserProfileStore>,
    candidates: Arc<dyn CandidateSource>,
    settings: FeedConfig,
) -> FeedAssembler {
    FeedAssembler::new(profiles, candidates, ranker(), settings)
}

fn assembler(users: Vec<UserProfile>, posts: Vec<Candidate>) -> FeedAssembler {
    assembler_with(
        Arc::new(InMemoryProfileStore::new(users)),
        Arc::new(InMemoryCandidateStore::new(posts)),
        FeedConfig::default(),
    )
}

fn post(id: &str, author: &str, created_at: DateTime<Utc>) -> Candidate {
    Candidate {
        id: id.to_string(),
        author_id: author.to_string(),
        created_at: Some(created_at),
        ..Default::default()
    }
}

fn ids(page: &feed_service::models::FeedPage) -> Vec<String> {
    page.posts.iter().map(|p| p.id().to_string()).collect()
}

/// Candidate source with a fixed filtered result and global pool.
struct ScriptedSource {
    filtered: Vec<Candidate>,
    global: Vec<Candidate>,
    global_calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(filtered: Vec<Candidate>, global: Vec<Candidate>) -> Self {
        Self {
            filtered,
            global,
            global_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CandidateSource for ScriptedSource {
    async fn fetch(
        &self,
        _filter: Option<&ContextFilter>,
        limit: usize,
        _cursor: Option<&str>,
    ) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.filtered.iter().take(limit).cloned().collect())
    }

    async fn fetch_global_recent(&self, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        self.global_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.global.iter().take(limit).cloned().collect())
    }
}

struct FailingSource;

#[async_trait]
impl CandidateSource for FailingSource {
    async fn fetch(
        &self,
        _filter: Option<&ContextFilter>,
        _limit: usize,
        _cursor: Option<&str>,
    ) -> anyhow::Result<Vec<Candidate>> {
        Err(anyhow!("document store unavailable"))
    }

    async fn fetch_global_recent(&self, _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        Err(anyhow!("document store unavailable"))
    }
}

struct FailingProfiles;

#[async_trait]
impl UserProfileStore for FailingProfiles {
    async fn get(&self, _user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        Err(anyhow!("profile store timeout"))
    }
}

#[tokio::test]
async fn test_first_page_falls_back_to_global_recent() {
    let now = Utc::now();
    let global: Vec<Candidate> = (0..5)
        .map(|i| post(&format!("g{}", i), &format!("a{}", i), now - Duration::hours(i)))
        .collect();
    let source = Arc::new(ScriptedSource::new(Vec::new(), global));
    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        source.clone(),
        FeedConfig::default(),
    );

    let request = FeedRequest {
        limit: 3,
        feed_type: FeedType::Park,
        context: FeedContext::park("empty-park"),
        ..Default::default()
    };
    let page = feed.get_personalized_feed_at("u1", request, now).await.unwrap();

    assert_eq!(source.global_calls.load(Ordering::SeqCst), 1);
    assert_eq!(page.source, PageSource::GlobalRecent);
    assert_eq!(ids(&page), vec!["g0", "g1", "g2"]);
    assert_eq!(page.cursor.as_deref(), Some("g2"));
}

#[tokio::test]
async fn test_global_recent_fallback_is_ranked_by_score() {
    let now = Utc::now();
    let fresh = post("fresh", "a1", now);
    let mut popular = post("popular", "a2", now - Duration::days(2));
    popular.like_count = 500;
    let source = Arc::new(ScriptedSource::new(Vec::new(), vec![fresh, popular]));
    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        source,
        FeedConfig::default(),
    );

    let request = FeedRequest::park("empty-park", PageOptions::default());
    let page = feed.get_personalized_feed_at("u1", request, now).await.unwrap();

    assert_eq!(page.source, PageSource::GlobalRecent);
    assert_eq!(ids(&page), vec!["popular", "fresh"]);
    assert!(page.posts[0].score > page.posts[1].score);
}

#[tokio::test]
async fn test_first_page_with_empty_corpus_is_empty() {
    let source = Arc::new(ScriptedSource::new(Vec::new(), Vec::new()));
    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        source,
        FeedConfig::default(),
    );
    let page = feed
        .get_personalized_feed("u1", FeedRequest::default())
        .await
        .unwrap();
    assert!(page.posts.is_empty());
    assert!(page.cursor.is_none());
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_later_page_with_empty_fetch_ends_without_fallback() {
    let now = Utc::now();
    let source = Arc::new(ScriptedSource::new(
        Vec::new(),
        vec![post("g0", "a", now)],
    ));
    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        source.clone(),
        FeedConfig::default(),
    );

    let request = FeedRequest {
        cursor: Some("p99".into()),
        ..Default::default()
    };
    let page = feed.get_personalized_feed("u1", request).await.unwrap();

    assert_eq!(source.global_calls.load(Ordering::SeqCst), 0);
    assert!(page.posts.is_empty());
    assert!(page.cursor.is_none());
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_removed_and_draft_posts_never_appear() {
    let now = Utc::now();
    let mut removed = post("removed", "a1", now);
    removed.moderation_status = Some("removed".into());
    let mut draft = post("draft", "a2", now - Duration::minutes(1));
    draft.status = Some("draft".into());
    let legacy = post("legacy", "a3", now - Duration::minutes(2));
    let mut published = post("published", "a4", now - Duration::minutes(3));
    published.status = Some("published".into());
    published.moderation_status = Some("approved".into());

    let feed = assembler(Vec::new(), vec![removed, draft, legacy, published]);
    let page = feed
        .get_personalized_feed_at("u1", FeedRequest::default(), now)
        .await
        .unwrap();

    let ids = ids(&page);
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"legacy".to_string()));
    assert!(ids.contains(&"published".to_string()));
}

#[tokio::test]
async fn test_tag_affinity_orders_feed() {
    let now = Utc::now();
    let mut user = UserProfile::anonymous("u1");
    user.preferences.tags.insert("sunset".into(), 5.0);

    let mut ocean = post("ocean", "a1", now);
    ocean.tags = vec!["ocean".into()];
    let mut sunset = post("sunset-ocean", "a2", now);
    sunset.tags = vec!["sunset".into(), "ocean".into()];

    let feed = assembler(vec![user], vec![ocean, sunset]);
    let page = feed
        .get_personalized_feed_at("u1", FeedRequest::default(), now)
        .await
        .unwrap();

    assert_eq!(ids(&page), vec!["sunset-ocean", "ocean"]);
    assert!(page.posts[0].score > page.posts[1].score);
}

#[tokio::test]
async fn test_event_feed_context_match_difference() {
    let now = Utc::now();
    let mut matching = post("at-event", "a1", now);
    matching.event_id = Some("e1".into());
    let other = post("elsewhere", "a2", now);

    let source = Arc::new(ScriptedSource::new(vec![other, matching], Vec::new()));
    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        source,
        FeedConfig::default(),
    );

    let page = feed
        .get_personalized_feed_at("u1", FeedRequest::event("e1", PageOptions::default()), now)
        .await
        .unwrap();

    assert_eq!(ids(&page), vec!["at-event", "elsewhere"]);
    let difference = page.posts[0].score - page.posts[1].score;
    assert!((difference - EVENT_WEIGHTS.context_match).abs() < 1e-9);
}

#[tokio::test]
async fn test_unranked_safety_net_returns_min_of_limit_and_survivors() {
    let now = Utc::now();
    let posts: Vec<Candidate> = (0..7)
        .map(|i| post(&format!("p{}", i), &format!("a{}", i), now - Duration::minutes(i)))
        .collect();
    let settings = FeedConfig {
        min_score: 1_000.0,
        ..FeedConfig::default()
    };
    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        Arc::new(InMemoryCandidateStore::new(posts)),
        settings,
    );

    let request = FeedRequest {
        limit: 4,
        ..Default::default()
    };
    let page = feed
        .get_personalized_feed_at("u1", request.clone(), now)
        .await
        .unwrap();
    assert_eq!(page.source, PageSource::Unranked);
    assert_eq!(ids(&page), vec!["p0", "p1", "p2", "p3"]);
    assert!(page.has_more);

    let small = FeedRequest {
        limit: 20,
        ..request.clone()
    };
    let page = feed.get_personalized_feed_at("u1", small, now).await.unwrap();
    assert_eq!(page.posts.len(), 7);
    assert!(!page.has_more);

    let later = FeedRequest {
        cursor: Some("p3".into()),
        ..request
    };
    let page = feed.get_personalized_feed_at("u1", later, now).await.unwrap();
    assert!(page.posts.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_cursor_walks_through_feed() {
    let now = Utc::now();
    let posts: Vec<Candidate> = (0..5)
        .map(|i| post(&format!("p{}", i), &format!("a{}", i), now - Duration::hours(i)))
        .collect();
    let feed = assembler(Vec::new(), posts);

    let first = feed
        .get_personalized_feed_at(
            "u1",
            FeedRequest {
                limit: 2,
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(ids(&first), vec!["p0", "p1"]);
    assert!(first.has_more);

    let second = feed
        .get_personalized_feed_at(
            "u1",
            FeedRequest {
                limit: 2,
                cursor: first.cursor.clone(),
                ..Default::default()
            },
            now,
        )
        .await
        .unwrap();
    assert_eq!(ids(&second), vec!["p2", "p3"]);
}

#[tokio::test]
async fn test_followed_author_ranks_first_on_home() {
    let now = Utc::now();
    let mut user = UserProfile::anonymous("u1");
    user.followed_users.insert("friend".into());

    let feed = assembler(
        vec![user],
        vec![
            post("stranger-new", "stranger", now),
            post("friend-old", "friend", now - Duration::days(2)),
        ],
    );
    let page = feed
        .get_personalized_feed_at("u1", FeedRequest::default(), now)
        .await
        .unwrap();
    assert_eq!(page.posts[0].id(), "friend-old");

    let anonymous = feed
        .get_personalized_feed_at("someone-else", FeedRequest::default(), now)
        .await
        .unwrap();
    assert_eq!(anonymous.posts[0].id(), "stranger-new");
}

#[tokio::test]
async fn test_collaborator_failures_propagate() {
    let feed = assembler_with(
        Arc::new(FailingProfiles),
        Arc::new(InMemoryCandidateStore::default()),
        FeedConfig::default(),
    );
    let err = feed
        .get_personalized_feed("u1", FeedRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::ProfileStore(_)));

    let feed = assembler_with(
        Arc::new(InMemoryProfileStore::default()),
        Arc::new(FailingSource),
        FeedConfig::default(),
    );
    let err = feed
        .get_personalized_feed("u1", FeedRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::CandidateSource(_)));
}

#[tokio::test]
async fn test_scores_stay_in_bounds() {
    let now = Utc::now();
    let mut viral = post("viral", "a1", now);
    viral.like_count = u64::MAX;
    viral.contest_wins = 1_000;
    viral.boost_level = Some(u32::MAX);
    viral.boost_expires_at = Some(now + Duration::days(1));
    let ancient = post("ancient", "a2", now - Duration::days(20_000));
    let future = post("future", "a3", now + Duration::days(3));

    let feed = assembler(Vec::new(), vec![viral, ancient, future]);
    for feed_type in FeedType::ALL {
        let request = FeedRequest {
            feed_type,
            ..Default::default()
        };
        let page = feed.get_personalized_feed_at("u1", request, now).await.unwrap();
        assert_eq!(page.posts.len(), 3);
        assert!(page
            .posts
            .iter()
            .all(|p| (0.0..=100.0).contains(&p.score)));
    }
}
