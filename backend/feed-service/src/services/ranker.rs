use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::trace;

use super::scoring::{ScoringContext, ScoringEngine};
use crate::models::{Candidate, FeedContext, FeedType, ScoredCandidate, UserProfile};

/// Number of preceding candidates considered for the author diversity penalty.
pub const DIVERSITY_WINDOW: usize = 10;

/// Scores a batch of candidates in input order and sorts them by score.
pub struct BatchRanker {
    engine: Arc<ScoringEngine>,
}

impl BatchRanker {
    pub fn new(engine: Arc<ScoringEngine>) -> Self {
        Self { engine }
    }

    /// Score every candidate. Output keeps the input order.
    ///
    /// The diversity window for candidate `i` is the authors of candidates
    /// `i-10..i` in input order, regardless of their scores.
    pub fn score_batch(
        &self,
        user: &UserProfile,
        candidates: Vec<Candidate>,
        feed_type: FeedType,
        context: &FeedContext,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let authors: Vec<String> = candidates.iter().map(|c| c.author_id.clone()).collect();
        let author_refs: Vec<&str> = authors.iter().map(String::as_str).collect();

        candidates
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| {
                let window = &author_refs[i.saturating_sub(DIVERSITY_WINDOW)..i];
                let ctx = ScoringContext::new(feed_type, now, context).with_recent_authors(window);
                let breakdown = self.engine.score_breakdown(user, &candidate, &ctx);
                trace!(
                    post_id = %candidate.id,
                    feed_type = %feed_type,
                    breakdown = ?breakdown,
                    "Scored candidate"
                );
                ScoredCandidate::new(candidate, breakdown.score(), now)
            })
            .collect()
    }

    /// Score and sort descending. Ties keep their input order.
    pub fn rank(
        &self,
        user: &UserProfile,
        candidates: Vec<Candidate>,
        feed_type: FeedType,
        context: &FeedContext,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let mut scored = self.score_batch(user, candidates, feed_type, context, now);
        sort_by_score(&mut scored);
        scored
    }
}

/// Stable descending sort on score.
pub fn sort_by_score(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}
