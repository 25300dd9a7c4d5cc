//! Feed pipeline stages
//!
//! The emptiness fallback chain, broken into pure stage functions so each
//! decision can be tested without collaborators:
//!
//! 1. `after_filtered_fetch`: first page with an empty filtered fetch falls
//!    back to the global recent pool; later pages just end.
//! 2. `after_global_fetch`: an empty global pool ends with an empty page.
//! 3. `retain_active`: drop removed and draft posts.
//! 4. `split_by_floor`: keep candidates scoring at or above the relevance floor.
//! 5. `apply_safety_net`: first page with nothing ranked but survivors present
//!    serves the survivors unranked.
//! 6. `paginate`: cut the page, derive cursor and `has_more`.

use chrono::{DateTime, Utc};

use crate::models::{Candidate, FeedPage, PageSource, ScoredCandidate};

/// What the assembler does next after a retrieval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalStage {
    Proceed,
    FetchGlobalRecent,
    ReturnEmpty,
}

pub fn after_filtered_fetch(fetched: usize, cursor: Option<&str>) -> RetrievalStage {
    match (fetched, cursor) {
        (0, None) => RetrievalStage::FetchGlobalRecent,
        (0, Some(_)) => RetrievalStage::ReturnEmpty,
        _ => RetrievalStage::Proceed,
    }
}

pub fn after_global_fetch(fetched: usize) -> RetrievalStage {
    if fetched == 0 {
        RetrievalStage::ReturnEmpty
    } else {
        RetrievalStage::Proceed
    }
}

/// Drops posts that are removed by moderation or still drafts. Order is kept.
pub fn retain_active(candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.into_iter().filter(Candidate::is_active).collect()
}

/// Splits scored candidates into (ranked, below floor). Both keep input order.
pub fn split_by_floor(
    scored: Vec<ScoredCandidate>,
    min_score: f64,
) -> (Vec<ScoredCandidate>, Vec<ScoredCandidate>) {
    scored.into_iter().partition(|s| s.score >= min_score)
}

/// Returns the pool to paginate and where it came from.
///
/// `ranked` is expected sorted; `rejected` holds every other survivor in
/// retrieval order. The safety net only applies on the first page.
pub fn apply_safety_net(
    ranked: Vec<ScoredCandidate>,
    rejected: Vec<ScoredCandidate>,
    first_page: bool,
    source: PageSource,
    now: DateTime<Utc>,
) -> (Vec<ScoredCandidate>, PageSource) {
    if ranked.is_empty() && !rejected.is_empty() && first_page {
        let unranked = rejected
            .into_iter()
            .map(|s| ScoredCandidate::unranked(s.candidate, now))
            .collect();
        (unranked, PageSource::Unranked)
    } else {
        (ranked, source)
    }
}

/// Cuts the first `limit` items of `pool` into a page.
///
/// `survivors` is the number of candidates that passed the active filter.
pub fn paginate(
    mut pool: Vec<ScoredCandidate>,
    limit: usize,
    survivors: usize,
    source: PageSource,
) -> FeedPage {
    let pool_len = pool.len();
    pool.truncate(limit);

    let has_more = pool_len > limit || (!pool.is_empty() && survivors > pool.len());
    let cursor = pool.last().map(|s| s.id().to_string());

    if pool.is_empty() {
        return FeedPage {
            has_more,
            ..FeedPage::empty()
        };
    }

    FeedPage {
        posts: pool,
        cursor,
        has_more,
        source,
    }
}
