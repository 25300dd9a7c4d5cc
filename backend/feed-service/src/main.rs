use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feed_service::config::Config;
use feed_service::handlers::{configure, FeedHandlerState};
use feed_service::sources::{InMemoryCandidateStore, InMemoryProfileStore, SeedData};
use feed_service::{BatchRanker, FeedAssembler, FeedCache, ScoringEngine, WeightRegistry};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();
}

async fn load_registry(config: &Config) -> anyhow::Result<WeightRegistry> {
    match &config.feed.weights_path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read weight overrides {}", path.display()))?;
            let registry = WeightRegistry::with_overrides(&raw)?;
            info!(path = %path.display(), "Applied weight overrides");
            Ok(registry)
        }
        None => Ok(WeightRegistry::builtin()),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration loading failed: {:#}", e);
            return Err(e);
        }
    };

    info!("Starting feed-service v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.env);

    let registry = Arc::new(load_registry(&config).await?);
    let ranker = Arc::new(BatchRanker::new(Arc::new(ScoringEngine::new(registry))));

    let seed = match &config.feed.seed_path {
        Some(path) => SeedData::load(path).await?,
        None => {
            warn!("FEED_SEED_PATH not set, starting with empty stores");
            SeedData::default()
        }
    };
    let profiles = Arc::new(InMemoryProfileStore::new(seed.users));
    let candidates = Arc::new(InMemoryCandidateStore::new(seed.posts));

    let assembler = Arc::new(FeedAssembler::new(
        profiles,
        candidates,
        ranker,
        config.feed.clone(),
    ));

    let cache = match &config.cache.url {
        Some(url) => match FeedCache::new(url, config.cache.feed_ttl_secs).await {
            Ok(cache) => {
                info!("Page cache enabled (TTL={}s)", config.cache.feed_ttl_secs);
                Some(cache)
            }
            Err(e) => {
                warn!("Page cache disabled - failed to connect to Redis: {}", e);
                None
            }
        },
        None => {
            info!("Page cache disabled by configuration");
            None
        }
    };

    let state = web::Data::new(FeedHandlerState { assembler, cache });

    let bind_addr = format!("{}:{}", config.app.host, config.app.port);
    info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
