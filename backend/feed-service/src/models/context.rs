use serde::{Deserialize, Serialize};
use std::fmt;

use super::Candidate;

/// Ranking profile selector. Unrecognised names resolve to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeedType {
    Home,
    Explore,
    Park,
    City,
    Campus,
    Event,
    Default,
}

impl FeedType {
    pub const ALL: [FeedType; 7] = [
        FeedType::Home,
        FeedType::Explore,
        FeedType::Park,
        FeedType::City,
        FeedType::Campus,
        FeedType::Event,
        FeedType::Default,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Home => "HOME",
            FeedType::Explore => "EXPLORE",
            FeedType::Park => "PARK",
            FeedType::City => "CITY",
            FeedType::Campus => "CAMPUS",
            FeedType::Event => "EVENT",
            FeedType::Default => "DEFAULT",
        }
    }

    /// Exact (case-insensitive) lookup; `None` for unknown names.
    pub fn lookup(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|feed_type| feed_type.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn parse(name: &str) -> Self {
        Self::lookup(name).unwrap_or(FeedType::Default)
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FeedType {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for FeedType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<FeedType> for String {
    fn from(feed_type: FeedType) -> Self {
        feed_type.as_str().to_string()
    }
}

/// Context attached to a feed request.
///
/// Every populated dimension earns a context-match bonus during scoring, but
/// only one of them (see [`FeedContext::primary_filter`]) scopes retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedContext {
    pub park_id: Option<String>,
    pub city_name: Option<String>,
    pub campus_id: Option<String>,
    pub event_id: Option<String>,
    pub contest_id: Option<String>,
}

impl FeedContext {
    pub fn park(park_id: impl Into<String>) -> Self {
        Self {
            park_id: Some(park_id.into()),
            ..Default::default()
        }
    }

    pub fn city(city_name: impl Into<String>) -> Self {
        Self {
            city_name: Some(city_name.into()),
            ..Default::default()
        }
    }

    pub fn campus(campus_id: impl Into<String>) -> Self {
        Self {
            campus_id: Some(campus_id.into()),
            ..Default::default()
        }
    }

    pub fn event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Default::default()
        }
    }

    pub fn contest(contest_id: impl Into<String>) -> Self {
        Self {
            contest_id: Some(contest_id.into()),
            ..Default::default()
        }
    }

    /// Retrieval filter in priority order park > city > campus > event > contest.
    pub fn primary_filter(&self) -> Option<ContextFilter> {
        match (
            &self.park_id,
            &self.city_name,
            &self.campus_id,
            &self.event_id,
            &self.contest_id,
        ) {
            (Some(park), ..) => Some(ContextFilter::Park(park.clone())),
            (None, Some(city), ..) => Some(ContextFilter::City(city.clone())),
            (None, None, Some(campus), ..) => Some(ContextFilter::Campus(campus.clone())),
            (None, None, None, Some(event), _) => Some(ContextFilter::Event(event.clone())),
            (None, None, None, None, Some(contest)) => {
                Some(ContextFilter::Contest(contest.clone()))
            }
            (None, None, None, None, None) => None,
        }
    }

    /// Number of populated dimensions the candidate matches.
    pub fn match_count(&self, candidate: &Candidate) -> usize {
        [
            (&self.park_id, &candidate.park_id),
            (&self.city_name, &candidate.city_name),
            (&self.campus_id, &candidate.campus_id),
            (&self.event_id, &candidate.event_id),
            (&self.contest_id, &candidate.contest_id),
        ]
        .into_iter()
        .filter(|(wanted, actual)| wanted.is_some() && wanted == actual)
        .count()
    }

    /// Stable textual form used in cache keys. Values are JSON-quoted so
    /// separators inside an id cannot alias another context.
    pub fn cache_fragment(&self) -> String {
        let parts: Vec<String> = [
            ("park", &self.park_id),
            ("city", &self.city_name),
            ("campus", &self.campus_id),
            ("event", &self.event_id),
            ("contest", &self.contest_id),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(|v| format!("{}={}", name, serde_json::Value::from(v)))
        })
        .collect();

        if parts.is_empty() {
            "-".to_string()
        } else {
            parts.join(",")
        }
    }
}

/// The single context dimension used to scope candidate retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextFilter {
    Park(String),
    City(String),
    Campus(String),
    Event(String),
    Contest(String),
}

impl ContextFilter {
    pub fn dimension(&self) -> &'static str {
        match self {
            ContextFilter::Park(_) => "park",
            ContextFilter::City(_) => "city",
            ContextFilter::Campus(_) => "campus",
            ContextFilter::Event(_) => "event",
            ContextFilter::Contest(_) => "contest",
        }
    }

    pub fn matches(&self, candidate: &Candidate) -> bool {
        let (wanted, actual) = match self {
            ContextFilter::Park(id) => (id, &candidate.park_id),
            ContextFilter::City(name) => (name, &candidate.city_name),
            ContextFilter::Campus(id) => (id, &candidate.campus_id),
            ContextFilter::Event(id) => (id, &candidate.event_id),
            ContextFilter::Contest(id) => (id, &candidate.contest_id),
        };
        actual.as_deref() == Some(wanted.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_type_parse() {
        assert_eq!(FeedType::parse("HOME"), FeedType::Home);
        assert_eq!(FeedType::parse("explore"), FeedType::Explore);
        assert_eq!(FeedType::parse("TRENDING"), FeedType::Default);
        assert_eq!(FeedType::lookup("TRENDING"), None);

        let parsed: FeedType = serde_json::from_str(r#""EVENT""#).unwrap();
        assert_eq!(parsed, FeedType::Event);
        let unknown: FeedType = serde_json::from_str(r#""nope""#).unwrap();
        assert_eq!(unknown, FeedType::Default);
        assert_eq!(serde_json::to_string(&FeedType::Campus).unwrap(), r#""CAMPUS""#);
    }

    #[test]
    fn test_primary_filter_priority() {
        let context = FeedContext {
            park_id: None,
            city_name: Some("Denver".into()),
            campus_id: Some("cu".into()),
            event_id: Some("e1".into()),
            contest_id: Some("c1".into()),
        };
        assert_eq!(
            context.primary_filter(),
            Some(ContextFilter::City("Denver".into()))
        );

        let context = FeedContext {
            park_id: Some("yosemite".into()),
            ..context
        };
        assert_eq!(
            context.primary_filter(),
            Some(ContextFilter::Park("yosemite".into()))
        );

        assert_eq!(
            FeedContext::contest("c9").primary_filter(),
            Some(ContextFilter::Contest("c9".into()))
        );
        assert!(FeedContext::default().primary_filter().is_none());
    }

    #[test]
    fn test_match_count_stacks_dimensions() {
        let candidate = Candidate {
            id: "p1".into(),
            author_id: "a1".into(),
            park_id: Some("zion".into()),
            event_id: Some("e1".into()),
            ..Default::default()
        };
        let context = FeedContext {
            park_id: Some("zion".into()),
            event_id: Some("e1".into()),
            city_name: Some("Springdale".into()),
            ..Default::default()
        };
        assert_eq!(context.match_count(&candidate), 2);
        assert_eq!(FeedContext::default().match_count(&candidate), 0);
    }

    #[test]
    fn test_filter_matches() {
        let candidate = Candidate {
            id: "p1".into(),
            author_id: "a1".into(),
            city_name: Some("Boise".into()),
            ..Default::default()
        };
        assert!(ContextFilter::City("Boise".into()).matches(&candidate));
        assert!(!ContextFilter::City("Reno".into()).matches(&candidate));
        assert!(!ContextFilter::Park("Boise".into()).matches(&candidate));
    }

    #[test]
    fn test_filter_dimension_follows_priority() {
        let context = FeedContext {
            city_name: Some("Moab".into()),
            event_id: Some("e1".into()),
            ..Default::default()
        };
        let filter = context.primary_filter();
        assert_eq!(filter.as_ref().map(ContextFilter::dimension), Some("city"));
        assert_eq!(ContextFilter::Contest("c".into()).dimension(), "contest");
    }

    #[test]
    fn test_cache_fragment() {
        assert_eq!(FeedContext::default().cache_fragment(), "-");
        let context = FeedContext {
            park_id: Some("p".into()),
            event_id: Some("e".into()),
            ..Default::default()
        };
        assert_eq!(context.cache_fragment(), r#"park="p",event="e""#);
    }

    #[test]
    fn test_cache_fragment_separators_in_values_do_not_alias() {
        let smuggled = FeedContext::park("zion,city=Moab");
        let combined = FeedContext {
            park_id: Some("zion".into()),
            city_name: Some("Moab".into()),
            ..Default::default()
        };
        assert_ne!(smuggled.cache_fragment(), combined.cache_fragment());
        assert_eq!(smuggled.cache_fragment(), r#"park="zion,city=Moab""#);
    }
}
