//! Feed assembly
//!
//! Turns a user and a feed request into one page:
//! retrieval → emptiness fallback → active filter → scoring → floor →
//! safety net → pagination. Stage decisions live in [`super::fallback`].

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::fallback::{self, RetrievalStage};
use super::ranker::{sort_by_score, BatchRanker};
use crate::config::FeedConfig;
use crate::error::FeedError;
use crate::metrics::feed::{
    FEED_CANDIDATE_COUNT, FEED_COLLABORATOR_ERRORS, FEED_FALLBACK_TOTAL,
    FEED_REQUEST_DURATION_SECONDS, FEED_REQUEST_TOTAL,
};
use crate::models::{
    ContextFilter, FeedContext, FeedPage, FeedRequest, PageOptions, PageSource, UserProfile,
};
use crate::sources::{CandidateSource, UserProfileStore};

pub struct FeedAssembler {
    profiles: Arc<dyn UserProfileStore>,
    candidates: Arc<dyn CandidateSource>,
    ranker: Arc<BatchRanker>,
    settings: FeedConfig,
}

impl FeedAssembler {
    pub fn new(
        profiles: Arc<dyn UserProfileStore>,
        candidates: Arc<dyn CandidateSource>,
        ranker: Arc<BatchRanker>,
        settings: FeedConfig,
    ) -> Self {
        Self {
            profiles,
            candidates,
            ranker,
            settings,
        }
    }

    pub fn settings(&self) -> &FeedConfig {
        &self.settings
    }

    pub async fn get_personalized_feed(
        &self,
        user_id: &str,
        request: FeedRequest,
    ) -> Result<FeedPage, FeedError> {
        self.get_personalized_feed_at(user_id, request, Utc::now()).await
    }

    /// Same as [`get_personalized_feed`](Self::get_personalized_feed) with an
    /// explicit clock.
    pub async fn get_personalized_feed_at(
        &self,
        user_id: &str,
        request: FeedRequest,
        now: DateTime<Utc>,
    ) -> Result<FeedPage, FeedError> {
        let started = Instant::now();
        let feed_type = request.feed_type;

        let result = self.assemble(user_id, request, now).await;

        FEED_REQUEST_DURATION_SECONDS
            .with_label_values(&[feed_type.as_str()])
            .observe(started.elapsed().as_secs_f64());
        if let Ok(page) = &result {
            FEED_REQUEST_TOTAL
                .with_label_values(&[feed_type.as_str(), page.source.as_str()])
                .inc();
            info!(
                user_id = %user_id,
                feed_type = %feed_type,
                posts = page.posts.len(),
                has_more = page.has_more,
                source = page.source.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Feed page assembled"
            );
        }

        result
    }

    async fn assemble(
        &self,
        user_id: &str,
        request: FeedRequest,
        now: DateTime<Utc>,
    ) -> Result<FeedPage, FeedError> {
        let FeedRequest {
            limit,
            cursor,
            feed_type,
            context,
        } = request;
        let limit = limit.max(1);
        let cursor = cursor.as_deref();

        let user = self.load_profile(user_id).await?;

        let filter = context.primary_filter();
        let fetch_size = self.settings.fetch_size(limit);
        let mut source = PageSource::Ranked;

        let mut fetched = self
            .candidates
            .fetch(filter.as_ref(), fetch_size, cursor)
            .await
            .map_err(|e| candidate_error(e, "fetch"))?;

        debug!(
            user_id = %user_id,
            filter = filter.as_ref().map_or("none", ContextFilter::dimension),
            fetch_size,
            fetched = fetched.len(),
            "Fetched candidates"
        );

        match fallback::after_filtered_fetch(fetched.len(), cursor) {
            RetrievalStage::Proceed => {}
            RetrievalStage::ReturnEmpty => {
                debug!(user_id = %user_id, "No candidates after cursor");
                return Ok(FeedPage::empty());
            }
            RetrievalStage::FetchGlobalRecent => {
                warn!(
                    user_id = %user_id,
                    feed_type = %feed_type,
                    filter = ?filter,
                    "Filtered fetch empty, falling back to global recent posts"
                );
                FEED_FALLBACK_TOTAL.with_label_values(&["global_recent"]).inc();

                fetched = self
                    .candidates
                    .fetch_global_recent(limit)
                    .await
                    .map_err(|e| candidate_error(e, "fetch_global_recent"))?;

                if fallback::after_global_fetch(fetched.len()) == RetrievalStage::ReturnEmpty {
                    FEED_FALLBACK_TOTAL.with_label_values(&["empty"]).inc();
                    return Ok(FeedPage::empty());
                }
                source = PageSource::GlobalRecent;
            }
        }

        let survivors = fallback::retain_active(fetched);
        let survivor_count = survivors.len();
        FEED_CANDIDATE_COUNT
            .with_label_values(&[feed_type.as_str()])
            .observe(survivor_count as f64);

        let scored = self
            .ranker
            .score_batch(&user, survivors, feed_type, &context, now);
        let (mut ranked, rejected) = fallback::split_by_floor(scored, self.settings.min_score);
        sort_by_score(&mut ranked);

        debug!(
            user_id = %user_id,
            survivors = survivor_count,
            ranked = ranked.len(),
            below_floor = rejected.len(),
            "Scored candidates"
        );

        let (pool, source) =
            fallback::apply_safety_net(ranked, rejected, cursor.is_none(), source, now);
        if source == PageSource::Unranked {
            warn!(
                user_id = %user_id,
                feed_type = %feed_type,
                survivors = survivor_count,
                "Nothing ranked, serving unranked candidates"
            );
            FEED_FALLBACK_TOTAL.with_label_values(&["unranked"]).inc();
        }

        Ok(fallback::paginate(pool, limit, survivor_count, source))
    }

    async fn load_profile(&self, user_id: &str) -> Result<UserProfile, FeedError> {
        let profile = self.profiles.get(user_id).await.map_err(|e| {
            FEED_COLLABORATOR_ERRORS
                .with_label_values(&["profile_store"])
                .inc();
            FeedError::ProfileStore(e)
        })?;

        Ok(profile.unwrap_or_else(|| {
            debug!(user_id = %user_id, "No profile found, using anonymous profile");
            UserProfile::anonymous(user_id)
        }))
    }

    pub async fn get_explore_feed(
        &self,
        user_id: &str,
        options: PageOptions,
        context: FeedContext,
    ) -> Result<FeedPage, FeedError> {
        self.get_personalized_feed(user_id, FeedRequest::explore(options, context))
            .await
    }

    pub async fn get_park_feed(
        &self,
        user_id: &str,
        park_id: &str,
        options: PageOptions,
    ) -> Result<FeedPage, FeedError> {
        self.get_personalized_feed(user_id, FeedRequest::park(park_id, options))
            .await
    }

    pub async fn get_city_feed(
        &self,
        user_id: &str,
        city_name: &str,
        options: PageOptions,
    ) -> Result<FeedPage, FeedError> {
        self.get_personalized_feed(user_id, FeedRequest::city(city_name, options))
            .await
    }

    pub async fn get_campus_feed(
        &self,
        user_id: &str,
        campus_id: &str,
        options: PageOptions,
    ) -> Result<FeedPage, FeedError> {
        self.get_personalized_feed(user_id, FeedRequest::campus(campus_id, options))
            .await
    }

    pub async fn get_event_feed(
        &self,
        user_id: &str,
        event_id: &str,
        options: PageOptions,
    ) -> Result<FeedPage, FeedError> {
        self.get_personalized_feed(user_id, FeedRequest::event(event_id, options))
            .await
    }
}

fn candidate_error(err: anyhow::Error, operation: &str) -> FeedError {
    FEED_COLLABORATOR_ERRORS
        .with_label_values(&["candidate_source"])
        .inc();
    debug!(operation, "Candidate source call failed");
    FeedError::CandidateSource(err)
}
