//! Ranking pipeline for feed-service
//!
//! - weights: per-feed-type scoring coefficients
//! - scoring: composite relevance score for one candidate
//! - ranker: batch scoring with the author diversity window
//! - fallback: emptiness fallback and pagination stages
//! - feed: feed assembly and presets

pub mod fallback;
pub mod feed;
pub mod ranker;
pub mod scoring;
pub mod weights;

pub use feed::FeedAssembler;
pub use ranker::BatchRanker;
pub use scoring::{ScoreBreakdown, ScoringContext, ScoringEngine};
pub use weights::{WeightProfile, WeightRegistry, WeightsError};
