pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;
pub mod sources;

pub use cache::FeedCache;
pub use config::Config;
pub use error::{AppError, FeedError, Result};
pub use services::{BatchRanker, FeedAssembler, ScoringEngine, WeightRegistry};
