//! Collaborators consumed by the feed assembler.
//!
//! The document store and the preference learner live outside this service;
//! the assembler only sees these two traits.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Candidate, ContextFilter, UserProfile};

pub mod memory;

pub use memory::{InMemoryCandidateStore, InMemoryProfileStore, SeedData};

/// Source of candidate posts.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Posts matching `filter` (or all posts when `None`), newest first,
    /// starting after the post with id `cursor`.
    async fn fetch(
        &self,
        filter: Option<&ContextFilter>,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<Vec<Candidate>>;

    /// Newest posts regardless of context.
    async fn fetch_global_recent(&self, limit: usize) -> Result<Vec<Candidate>>;
}

#[async_trait]
pub trait UserProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>>;
}
