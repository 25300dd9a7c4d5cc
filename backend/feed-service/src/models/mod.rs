use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub mod context;

pub use context::{ContextFilter, FeedContext, FeedType};

/// Moderation status that hides a post from every feed.
pub const MODERATION_REMOVED: &str = "removed";

/// Publication status of posts that have not been published yet.
pub const STATUS_DRAFT: &str = "draft";

/// User document as written by the preference learner.
///
/// Every field is optional on the wire; absent values deserialize to empty
/// collections so legacy documents never fail to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub followed_users: HashSet<String>,
}

impl UserProfile {
    /// Profile used when the user document does not exist.
    pub fn anonymous(user_id: impl Into<String>) -> Self {
        Self {
            id: user_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub tags: HashMap<String, f64>,
    pub film_types: Vec<String>,
    pub subjects: Vec<String>,
    pub parks: Vec<String>,
    pub cities: Vec<String>,
    pub aesthetics: Vec<String>,
    pub date_stamp_styles: HashMap<String, f64>,
    pub momentum: Momentum,
}

/// Short-lived interaction streaks keyed by tag, park id and city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Momentum {
    pub tags: HashMap<String, MomentumEntry>,
    pub parks: HashMap<String, MomentumEntry>,
    pub cities: HashMap<String, MomentumEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentumEntry {
    #[serde(default)]
    pub count: u32,
    /// Epoch milliseconds on the wire.
    #[serde(default = "unix_epoch", with = "chrono::serde::ts_milliseconds")]
    pub last_interaction: DateTime<Utc>,
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
}

/// A post eligible for a feed page. Owned by the content store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    #[serde(default, alias = "uid")]
    pub author_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    // Engagement counters
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub save_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub print_sale_count: u64,
    #[serde(default)]
    pub view_count: u64,

    // Context dimensions
    #[serde(default)]
    pub park_id: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub campus_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub contest_id: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,

    #[serde(default)]
    pub contest_wins: u64,
    #[serde(default)]
    pub contest_entries: u64,

    #[serde(default)]
    pub is_film: bool,
    #[serde(default)]
    pub film_type: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub date_stamp_style: Option<String>,

    // Monetization
    #[serde(default)]
    pub author_is_ultra: bool,
    #[serde(default)]
    pub boost_level: Option<u32>,
    #[serde(default)]
    pub boost_expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub moderation_status: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Candidate {
    /// Whether the post may be shown. Posts without a moderation status
    /// predate moderation and count as active.
    pub fn is_active(&self) -> bool {
        self.moderation_status.as_deref() != Some(MODERATION_REMOVED)
            && self.status.as_deref() != Some(STATUS_DRAFT)
    }

    pub fn location_city(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.city.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score: f64,
    pub scored_at: DateTime<Utc>,
}

impl ScoredCandidate {
    pub fn new(candidate: Candidate, score: f64, scored_at: DateTime<Utc>) -> Self {
        Self {
            candidate,
            score,
            scored_at,
        }
    }

    /// Wraps a candidate that bypassed scoring.
    pub fn unranked(candidate: Candidate, at: DateTime<Utc>) -> Self {
        Self::new(candidate, 0.0, at)
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }
}

/// Which stage of the pipeline produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Ranked,
    GlobalRecent,
    Unranked,
    Empty,
}

impl PageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSource::Ranked => "ranked",
            PageSource::GlobalRecent => "global_recent",
            PageSource::Unranked => "unranked",
            PageSource::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub posts: Vec<ScoredCandidate>,
    pub cursor: Option<String>,
    pub has_more: bool,
    pub source: PageSource,
}

impl FeedPage {
    pub fn empty() -> Self {
        Self {
            posts: Vec::new(),
            cursor: None,
            has_more: false,
            source: PageSource::Empty,
        }
    }
}

/// Options accepted by the feed assembler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedRequest {
    pub limit: usize,
    pub cursor: Option<String>,
    pub feed_type: FeedType,
    pub context: FeedContext,
}

impl Default for FeedRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            cursor: None,
            feed_type: FeedType::Home,
            context: FeedContext::default(),
        }
    }
}

impl FeedRequest {
    fn preset(feed_type: FeedType, options: PageOptions, context: FeedContext) -> Self {
        Self {
            limit: options.limit,
            cursor: options.cursor,
            feed_type,
            context,
        }
    }

    /// EXPLORE profile; the caller's context is kept.
    pub fn explore(options: PageOptions, context: FeedContext) -> Self {
        Self::preset(FeedType::Explore, options, context)
    }

    pub fn park(park_id: impl Into<String>, options: PageOptions) -> Self {
        Self::preset(FeedType::Park, options, FeedContext::park(park_id))
    }

    pub fn city(city_name: impl Into<String>, options: PageOptions) -> Self {
        Self::preset(FeedType::City, options, FeedContext::city(city_name))
    }

    pub fn campus(campus_id: impl Into<String>, options: PageOptions) -> Self {
        Self::preset(FeedType::Campus, options, FeedContext::campus(campus_id))
    }

    pub fn event(event_id: impl Into<String>, options: PageOptions) -> Self {
        Self::preset(FeedType::Event, options, FeedContext::event(event_id))
    }
}

/// Pagination options for the preset feeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageOptions {
    pub limit: usize,
    pub cursor: Option<String>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            cursor: None,
        }
    }
}
