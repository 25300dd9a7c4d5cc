use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    /// Duration of feed assembly by feed type.
    pub static ref FEED_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "feed_request_duration_seconds",
        "Feed assembly duration segmented by feed type",
        &["feed_type"]
    )
    .expect("failed to register feed_request_duration_seconds");

    /// Pages served, by feed type and the pipeline stage that produced them.
    pub static ref FEED_REQUEST_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_request_total",
        "Feed pages served segmented by feed type and page source",
        &["feed_type", "source"]
    )
    .expect("failed to register feed_request_total");

    /// Active candidates scored per request.
    pub static ref FEED_CANDIDATE_COUNT: HistogramVec = register_histogram_vec!(
        "feed_candidate_count",
        "Number of active feed candidates scored segmented by feed type",
        &["feed_type"],
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0]
    )
    .expect("failed to register feed_candidate_count");

    /// Fallback stages taken (global_recent, empty, unranked).
    pub static ref FEED_FALLBACK_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_fallback_total",
        "Feed fallback stages taken segmented by stage",
        &["stage"]
    )
    .expect("failed to register feed_fallback_total");

    /// Feed collaborator failures (profile_store, candidate_source).
    pub static ref FEED_COLLABORATOR_ERRORS: IntCounterVec = register_int_counter_vec!(
        "feed_collaborator_errors_total",
        "Feed collaborator failures segmented by collaborator",
        &["collaborator"]
    )
    .expect("failed to register feed_collaborator_errors_total");

    /// Page cache events (hit/miss/error).
    pub static ref FEED_CACHE_EVENTS: IntCounterVec = register_int_counter_vec!(
        "feed_cache_events_total",
        "Feed page cache events segmented by outcome",
        &["event"]
    )
    .expect("failed to register feed_cache_events_total");

    /// Page cache write results (success/error).
    pub static ref FEED_CACHE_WRITE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "feed_cache_write_total",
        "Feed page cache write attempts segmented by outcome",
        &["result"]
    )
    .expect("failed to register feed_cache_write_total");
}
