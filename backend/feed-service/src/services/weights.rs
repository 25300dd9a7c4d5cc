//! Scoring weight profiles
//!
//! One profile per feed type, each tuned toward a different ranking goal:
//! - HOME: followed authors and recent posts
//! - EXPLORE: tag affinity and engagement quality, weaker follow signal
//! - PARK / CITY / CAMPUS / EVENT: heavy bonus for the matching context
//!
//! Profiles that leave a coefficient untuned inherit it from DEFAULT.
//! The registry is built once at startup and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::models::FeedType;

/// Flat set of scoring coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightProfile {
    // Engagement (multiplied by ln(1 + count))
    pub likes: f64,
    pub saves: f64,
    pub comments: f64,
    pub print_sales: f64,
    pub views: f64,

    // Recency
    /// Days for the recency boost to decay by a factor of e.
    pub recency_half_life: f64,
    pub recency_multiplier: f64,

    // Affinity
    pub tag_affinity: f64,
    pub film_match: f64,
    pub subject_match: f64,

    pub follow_boost: f64,

    // Context and momentum
    pub context_match: f64,
    pub momentum_boost: f64,
    pub park_momentum: f64,
    pub city_affinity: f64,

    // Quality
    pub contest_win: f64,
    pub contest_entry: f64,
    pub signature_style_boost: f64,
    pub date_stamp_match: f64,

    pub diversity_penalty: f64,

    // Monetization
    pub ultra_boost: f64,
    pub boost_weight: f64,
}

pub const DEFAULT_WEIGHTS: WeightProfile = WeightProfile {
    likes: 2.0,
    saves: 3.0,
    comments: 1.5,
    print_sales: 4.0,
    views: 0.5,
    recency_half_life: 7.0,
    recency_multiplier: 10.0,
    tag_affinity: 5.0,
    film_match: 3.0,
    subject_match: 2.0,
    follow_boost: 15.0,
    context_match: 20.0,
    momentum_boost: 5.0,
    park_momentum: 8.0,
    city_affinity: 6.0,
    contest_win: 5.0,
    contest_entry: 1.0,
    signature_style_boost: 2.0,
    date_stamp_match: 3.0,
    diversity_penalty: 0.1,
    ultra_boost: 5.0,
    boost_weight: 10.0,
};

pub const HOME_WEIGHTS: WeightProfile = WeightProfile {
    recency_half_life: 5.0,
    recency_multiplier: 12.0,
    tag_affinity: 4.0,
    follow_boost: 25.0,
    context_match: 15.0,
    diversity_penalty: 0.15,
    ..DEFAULT_WEIGHTS
};

pub const EXPLORE_WEIGHTS: WeightProfile = WeightProfile {
    likes: 3.0,
    saves: 4.0,
    comments: 2.0,
    print_sales: 5.0,
    views: 0.8,
    recency_half_life: 10.0,
    recency_multiplier: 8.0,
    tag_affinity: 8.0,
    film_match: 4.0,
    subject_match: 3.0,
    follow_boost: 5.0,
    context_match: 10.0,
    contest_win: 8.0,
    contest_entry: 2.0,
    signature_style_boost: 4.0,
    diversity_penalty: 0.2,
    ..DEFAULT_WEIGHTS
};

pub const PARK_WEIGHTS: WeightProfile = WeightProfile {
    print_sales: 3.0,
    recency_half_life: 14.0,
    recency_multiplier: 6.0,
    tag_affinity: 3.0,
    film_match: 2.0,
    follow_boost: 10.0,
    context_match: 40.0,
    contest_win: 6.0,
    ..DEFAULT_WEIGHTS
};

pub const CITY_WEIGHTS: WeightProfile = PARK_WEIGHTS;

pub const CAMPUS_WEIGHTS: WeightProfile = WeightProfile {
    likes: 2.5,
    saves: 3.5,
    comments: 2.0,
    print_sales: 3.0,
    tag_affinity: 4.0,
    film_match: 2.0,
    context_match: 35.0,
    contest_win: 7.0,
    contest_entry: 2.0,
    diversity_penalty: 0.12,
    ..DEFAULT_WEIGHTS
};

pub const EVENT_WEIGHTS: WeightProfile = WeightProfile {
    likes: 3.0,
    saves: 4.0,
    comments: 2.5,
    print_sales: 2.0,
    views: 1.0,
    recency_half_life: 3.0,
    recency_multiplier: 15.0,
    tag_affinity: 3.0,
    film_match: 2.0,
    follow_boost: 8.0,
    context_match: 50.0,
    contest_win: 10.0,
    contest_entry: 3.0,
    diversity_penalty: 0.05,
    ..DEFAULT_WEIGHTS
};

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("unknown feed type in weight overrides: {0}")]
    UnknownFeedType(String),

    #[error("unknown weight coefficient in overrides: {0}")]
    UnknownCoefficient(String),

    #[error("invalid weight overrides: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("recency half-life for {0} must be positive")]
    NonPositiveHalfLife(FeedType),
}

/// Immutable table of weight profiles keyed by feed type.
#[derive(Debug, Clone)]
pub struct WeightRegistry {
    profiles: HashMap<FeedType, WeightProfile>,
}

impl Default for WeightRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WeightRegistry {
    pub fn builtin() -> Self {
        let profiles = FeedType::ALL
            .into_iter()
            .map(|feed_type| (feed_type, builtin_profile(feed_type)))
            .collect();
        Self { profiles }
    }

    /// Built-in profiles with per-coefficient overrides applied.
    ///
    /// Expected shape: `{ "EXPLORE": { "tagAffinity": 9.5 }, ... }`.
    pub fn with_overrides(json: &str) -> Result<Self, WeightsError> {
        let overrides: HashMap<String, serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(json)?;
        let mut registry = Self::builtin();

        for (name, fields) in overrides {
            let feed_type =
                FeedType::lookup(&name).ok_or_else(|| WeightsError::UnknownFeedType(name.clone()))?;

            let mut merged = serde_json::to_value(registry.get_weights(feed_type))?;
            if let Some(object) = merged.as_object_mut() {
                if let Some(unknown) = fields.keys().find(|key| !object.contains_key(*key)) {
                    return Err(WeightsError::UnknownCoefficient(format!("{}.{}", name, unknown)));
                }
                object.extend(fields);
            }
            let profile: WeightProfile = serde_json::from_value(merged)?;
            if profile.recency_half_life <= 0.0 {
                return Err(WeightsError::NonPositiveHalfLife(feed_type));
            }
            registry.profiles.insert(feed_type, profile);
        }

        Ok(registry)
    }

    pub fn get_weights(&self, feed_type: FeedType) -> &WeightProfile {
        self.profiles.get(&feed_type).unwrap_or(&DEFAULT_WEIGHTS)
    }

    /// Lookup by raw feed type name; unknown names get the DEFAULT profile.
    pub fn get_weights_by_name(&self, name: &str) -> &WeightProfile {
        self.get_weights(FeedType::parse(name))
    }
}

fn builtin_profile(feed_type: FeedType) -> WeightProfile {
    match feed_type {
        FeedType::Home => HOME_WEIGHTS,
        FeedType::Explore => EXPLORE_WEIGHTS,
        FeedType::Park => PARK_WEIGHTS,
        FeedType::City => CITY_WEIGHTS,
        FeedType::Campus => CAMPUS_WEIGHTS,
        FeedType::Event => EVENT_WEIGHTS,
        FeedType::Default => DEFAULT_WEIGHTS,
    }
}
