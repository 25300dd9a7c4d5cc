use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub feed: FeedConfig,
    pub cache: CacheConfig,
}

/// `APP_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// `FEED_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Candidates fetched per requested item.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
    /// Relevance floor; ranked candidates below it are dropped.
    #[serde(default)]
    pub min_score: f64,
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
}

/// `REDIS_*` variables. The page cache is off without a URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_feed_ttl_secs")]
    pub feed_ttl_secs: u64,
}

fn default_env() -> String {
    "development".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_limit() -> usize {
    20
}

fn default_max_limit() -> usize {
    100
}

fn default_candidate_multiplier() -> usize {
    5
}

fn default_candidate_cap() -> usize {
    100
}

fn default_feed_ttl_secs() -> u64 {
    60
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            candidate_multiplier: default_candidate_multiplier(),
            candidate_cap: default_candidate_cap(),
            min_score: 0.0,
            seed_path: None,
            weights_path: None,
        }
    }
}

impl FeedConfig {
    /// Number of candidates to fetch for a page of `limit` items.
    pub fn fetch_size(&self, limit: usize) -> usize {
        limit
            .saturating_mul(self.candidate_multiplier)
            .min(self.candidate_cap)
    }

    fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            bail!("FEED_MAX_LIMIT must be at least 1");
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            bail!(
                "FEED_DEFAULT_LIMIT must be between 1 and {} (got {})",
                self.max_limit,
                self.default_limit
            );
        }
        if self.candidate_multiplier == 0 || self.candidate_cap == 0 {
            bail!("FEED_CANDIDATE_MULTIPLIER and FEED_CANDIDATE_CAP must be positive");
        }
        if self.min_score.is_nan() {
            bail!("FEED_MIN_SCORE must be a number");
        }
        Ok(())
    }
}

impl Config {
    /// Load `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: Vec<(String, String)> = vars.into_iter().collect();

        let app: AppConfig = envy::prefixed("APP_")
            .from_iter(vars.clone())
            .context("invalid APP_* configuration")?;
        let feed: FeedConfig = envy::prefixed("FEED_")
            .from_iter(vars.clone())
            .context("invalid FEED_* configuration")?;
        let cache: CacheConfig = envy::prefixed("REDIS_")
            .from_iter(vars)
            .context("invalid REDIS_* configuration")?;

        feed.validate()?;

        Ok(Config { app, feed, cache })
    }
}
