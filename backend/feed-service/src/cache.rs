//! Redis page cache for assembled feed pages
//!
//! Keys: `feed:{user_id}:{feed_type}:{cursor|-}:{context}:{limit}` → serialized
//! FeedPage. The user id, cursor and context values are JSON-quoted.
//! The cache sits in front of the assembler; callers treat every error as a
//! miss.

use crate::error::{AppError, Result};
use crate::models::{FeedPage, FeedRequest};
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache key for one page request.
pub fn cache_key(user_id: &str, request: &FeedRequest) -> String {
    let cursor = request
        .cursor
        .as_deref()
        .map(|c| serde_json::Value::from(c).to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "feed:{}:{}:{}:{}:{}",
        serde_json::Value::from(user_id),
        request.feed_type,
        cursor,
        request.context.cache_fragment(),
        request.limit
    )
}

/// Feed page cache layer using Redis
#[derive(Clone)]
pub struct FeedCache {
    client: Arc<ConnectionManager>,
    ttl_secs: u64,
}

impl FeedCache {
    pub async fn new(redis_url: &str, ttl_secs: u64) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create Redis connection: {}", e)))?;

        Ok(Self {
            client: Arc::new(manager),
            ttl_secs,
        })
    }

    pub async fn get_page(&self, key: &str) -> Result<Option<FeedPage>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.client.as_ref().clone())
            .await
            .map_err(|e| {
                warn!("Redis GET failed for {}: {}", key, e);
                AppError::Internal(format!("Redis error: {}", e))
            })?;

        match value {
            Some(json) => {
                let page = serde_json::from_str::<FeedPage>(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization failed: {}", e))
                })?;
                debug!("Cache hit for {}", key);
                Ok(Some(page))
            }
            None => {
                debug!("Cache miss for {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set_page(&self, key: &str, page: &FeedPage) -> Result<()> {
        let json = serde_json::to_string(page)
            .map_err(|e| AppError::Internal(format!("Cache serialization failed: {}", e)))?;

        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(&json)
            .query_async::<_, ()>(&mut self.client.as_ref().clone())
            .await
            .map_err(|e| {
                warn!("Redis SETEX failed for {}: {}", key, e);
                AppError::Internal(format!("Redis error: {}", e))
            })?;

        debug!("Cached page {} with TTL={}s", key, self.ttl_secs);
        Ok(())
    }
}
