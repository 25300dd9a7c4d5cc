//! Candidate Scoring Module
//!
//! Computes the composite relevance score of one post for one user. The score
//! is an additive blend of engagement, recency, personal affinity, social,
//! context, momentum and monetization signals, clamped to [0, 100].
//!
//! Several terms are unbounded or stack (context match, contest record, paid
//! boosts), so totals frequently saturate at the clamp bounds. Ranking relies
//! on that behavior; do not rescale.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::weights::{WeightProfile, WeightRegistry};
use crate::models::{Candidate, FeedContext, FeedType, MomentumEntry, UserProfile};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Tag affinity average is capped before weighting.
const TAG_AFFINITY_CAP: f64 = 10.0;
const TAG_MOMENTUM_CAP: f64 = 20.0;
const PARK_MOMENTUM_CAP: f64 = 30.0;
const CITY_MOMENTUM_CAP: f64 = 20.0;
const PAID_BOOST_CAP: f64 = 50.0;

/// Date stamp style reserved for the house signature look.
pub const SIGNATURE_DATE_STAMP_STYLE: &str = "panospace";

/// Momentum entries older than this are ignored.
pub fn momentum_window() -> Duration {
    Duration::minutes(30)
}

/// Per-request inputs that are not part of the user or the candidate.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub feed_type: FeedType,
    pub now: DateTime<Utc>,
    pub context: &'a FeedContext,
    /// Author ids of the posts scored just before this one.
    pub recent_authors: &'a [&'a str],
}

impl<'a> ScoringContext<'a> {
    pub fn new(feed_type: FeedType, now: DateTime<Utc>, context: &'a FeedContext) -> Self {
        Self {
            feed_type,
            now,
            context,
            recent_authors: &[],
        }
    }

    pub fn with_recent_authors(mut self, recent_authors: &'a [&'a str]) -> Self {
        self.recent_authors = recent_authors;
        self
    }
}

/// Individual score contributions, before clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub engagement: f64,
    pub recency: f64,
    pub tag_affinity: f64,
    pub film_match: f64,
    pub subject_match: f64,
    pub follow: f64,
    pub context_match: f64,
    pub contest: f64,
    pub diversity: f64,
    pub date_stamp: f64,
    pub signature_style: f64,
    pub tag_momentum: f64,
    pub park_momentum: f64,
    pub city_momentum: f64,
    pub ultra: f64,
    pub paid_boost: f64,
}

impl ScoreBreakdown {
    pub fn raw_total(&self) -> f64 {
        self.engagement
            + self.recency
            + self.tag_affinity
            + self.film_match
            + self.subject_match
            + self.follow
            + self.context_match
            + self.contest
            + self.diversity
            + self.date_stamp
            + self.signature_style
            + self.tag_momentum
            + self.park_momentum
            + self.city_momentum
            + self.ultra
            + self.paid_boost
    }

    pub fn score(&self) -> f64 {
        clamp_score(self.raw_total())
    }
}

/// Clamp to [0, 100]; NaN maps to 0.
pub fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        MIN_SCORE
    } else {
        raw.clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Average weight of the post tags the user has a non-zero weight for,
/// capped at 10. Zero when either side is empty.
pub fn calculate_tag_affinity(user_tags: &HashMap<String, f64>, post_tags: &[String]) -> f64 {
    if post_tags.is_empty() || user_tags.is_empty() {
        return 0.0;
    }

    let (total, matches) = post_tags
        .iter()
        .filter_map(|tag| user_tags.get(tag).copied())
        .filter(|weight| *weight != 0.0 && !weight.is_nan())
        .fold((0.0, 0usize), |(total, count), weight| (total + weight, count + 1));

    if matches == 0 {
        0.0
    } else {
        (total / matches as f64).min(TAG_AFFINITY_CAP)
    }
}

/// Exponential decay: `exp(-age_days / half_life) * multiplier`.
pub fn calculate_recency_boost(
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    half_life_days: f64,
    multiplier: f64,
) -> f64 {
    let age_days = (now - created_at).num_milliseconds() as f64 / MILLIS_PER_DAY;
    (-age_days / half_life_days).exp() * multiplier
}

/// Negative penalty proportional to how often the author appears in the window.
pub fn calculate_diversity_penalty(author_id: &str, recent_authors: &[&str], penalty: f64) -> f64 {
    let occurrences = recent_authors.iter().filter(|a| **a == author_id).count();
    -(occurrences as f64) * penalty
}

/// Streak count if the entry is still inside the momentum window.
pub fn fresh_momentum(entry: Option<&MomentumEntry>, now: DateTime<Utc>) -> u32 {
    match entry {
        Some(m) if m.count > 0 && now - m.last_interaction < momentum_window() => m.count,
        _ => 0,
    }
}

fn log_count(count: u64) -> f64 {
    (count as f64).ln_1p()
}

pub struct ScoringEngine {
    registry: Arc<WeightRegistry>,
}

impl ScoringEngine {
    pub fn new(registry: Arc<WeightRegistry>) -> Self {
        Self { registry }
    }

    /// Final score in [0, 100].
    pub fn score_candidate(
        &self,
        user: &UserProfile,
        candidate: &Candidate,
        ctx: &ScoringContext<'_>,
    ) -> f64 {
        self.score_breakdown(user, candidate, ctx).score()
    }

    pub fn score_breakdown(
        &self,
        user: &UserProfile,
        candidate: &Candidate,
        ctx: &ScoringContext<'_>,
    ) -> ScoreBreakdown {
        let w = self.registry.get_weights(ctx.feed_type);
        let prefs = &user.preferences;
        let now = ctx.now;

        ScoreBreakdown {
            engagement: engagement_score(candidate, w),
            recency: calculate_recency_boost(
                candidate.created_at.unwrap_or(now),
                now,
                w.recency_half_life,
                w.recency_multiplier,
            ),
            tag_affinity: calculate_tag_affinity(&prefs.tags, &candidate.tags) * w.tag_affinity,
            film_match: match &candidate.film_type {
                Some(film) if candidate.is_film && prefs.film_types.contains(film) => w.film_match,
                _ => 0.0,
            },
            subject_match: match &candidate.subject {
                Some(subject) if prefs.subjects.contains(subject) => w.subject_match,
                _ => 0.0,
            },
            follow: if user.followed_users.contains(&candidate.author_id) {
                w.follow_boost
            } else {
                0.0
            },
            context_match: ctx.context.match_count(candidate) as f64 * w.context_match,
            contest: candidate.contest_wins as f64 * w.contest_win
                + candidate.contest_entries as f64 * w.contest_entry,
            diversity: calculate_diversity_penalty(
                &candidate.author_id,
                ctx.recent_authors,
                w.diversity_penalty,
            ),
            date_stamp: candidate
                .date_stamp_style
                .as_ref()
                .and_then(|style| prefs.date_stamp_styles.get(style))
                .filter(|pref| **pref != 0.0)
                .map(|pref| pref.ln_1p() * w.date_stamp_match)
                .unwrap_or(0.0),
            signature_style: if candidate.date_stamp_style.as_deref()
                == Some(SIGNATURE_DATE_STAMP_STYLE)
            {
                w.signature_style_boost
            } else {
                0.0
            },
            tag_momentum: {
                let streak: u32 = candidate
                    .tags
                    .iter()
                    .map(|tag| fresh_momentum(prefs.momentum.tags.get(tag), now))
                    .sum();
                (streak as f64).min(TAG_MOMENTUM_CAP) * w.momentum_boost
            },
            park_momentum: candidate
                .park_id
                .as_ref()
                .map(|park| fresh_momentum(prefs.momentum.parks.get(park), now))
                .map(|count| (count as f64).min(PARK_MOMENTUM_CAP) * w.park_momentum)
                .unwrap_or(0.0),
            city_momentum: candidate
                .location_city()
                .map(|city| fresh_momentum(prefs.momentum.cities.get(city), now))
                .map(|count| (count as f64).min(CITY_MOMENTUM_CAP) * w.city_affinity)
                .unwrap_or(0.0),
            ultra: if candidate.author_is_ultra {
                w.ultra_boost
            } else {
                0.0
            },
            paid_boost: paid_boost_score(candidate, now, w),
        }
    }
}

fn engagement_score(candidate: &Candidate, w: &WeightProfile) -> f64 {
    log_count(candidate.like_count) * w.likes
        + log_count(candidate.save_count) * w.saves
        + log_count(candidate.comment_count) * w.comments
        + log_count(candidate.print_sale_count) * w.print_sales
        + log_count(candidate.view_count) * w.views
}

fn paid_boost_score(candidate: &Candidate, now: DateTime<Utc>, w: &WeightProfile) -> f64 {
    match (candidate.boost_level, candidate.boost_expires_at) {
        (Some(level), Some(expires_at)) if level > 0 && expires_at > now => {
            (level as f64 * w.boost_weight).min(PAID_BOOST_CAP)
        }
        _ => 0.0,
    }
}
