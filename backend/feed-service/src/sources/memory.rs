use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::cmp::Ordering;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{CandidateSource, UserProfileStore};
use crate::models::{Candidate, ContextFilter, UserProfile};

/// Seed file contents: `{ "users": [...], "posts": [...] }`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub users: Vec<UserProfile>,
    pub posts: Vec<Candidate>,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse seed data")
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read seed data from {}", path.display()))?;
        let seed = Self::from_json(&raw)?;
        info!(
            users = seed.users.len(),
            posts = seed.posts.len(),
            path = %path.display(),
            "Loaded seed data"
        );
        Ok(seed)
    }
}

/// Newest first; posts without a creation time go last; ties by id.
fn newest_first(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Candidate store held in memory, kept in creation-descending order.
#[derive(Default)]
pub struct InMemoryCandidateStore {
    posts: RwLock<Vec<Candidate>>,
}

impl InMemoryCandidateStore {
    pub fn new(mut posts: Vec<Candidate>) -> Self {
        posts.sort_by(newest_first);
        Self {
            posts: RwLock::new(posts),
        }
    }

    /// Inserts or replaces a post by id.
    pub async fn upsert(&self, post: Candidate) {
        let mut posts = self.posts.write().await;
        posts.retain(|p| p.id != post.id);
        let at = posts
            .binary_search_by(|p| newest_first(p, &post))
            .unwrap_or_else(|i| i);
        posts.insert(at, post);
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl CandidateSource for InMemoryCandidateStore {
    async fn fetch(
        &self,
        filter: Option<&ContextFilter>,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Vec<Candidate>> {
        let posts = self.posts.read().await;

        // Unknown cursor ids restart from the top.
        let start = cursor
            .and_then(|id| posts.iter().position(|p| p.id == id))
            .map(|i| i + 1)
            .unwrap_or(0);

        let fetched: Vec<Candidate> = posts[start..]
            .iter()
            .filter(|p| filter.map_or(true, |f| f.matches(p)))
            .take(limit)
            .cloned()
            .collect();

        debug!(
            filter = ?filter,
            start,
            fetched = fetched.len(),
            "In-memory candidate fetch"
        );
        Ok(fetched)
    }

    async fn fetch_global_recent(&self, limit: usize) -> Result<Vec<Candidate>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().take(limit).cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, UserProfile>,
}

impl InMemoryProfileStore {
    pub fn new(users: Vec<UserProfile>) -> Self {
        let store = Self::default();
        for user in users {
            store.upsert(user);
        }
        store
    }

    pub fn upsert(&self, profile: UserProfile) {
        self.profiles.insert(profile.id.clone(), profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl UserProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.profiles.get(user_id).map(|entry| entry.value().clone()))
    }
}
