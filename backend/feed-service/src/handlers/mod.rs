use actix_web::{get, web, HttpResponse};

pub mod feed;

pub use feed::{
    get_campus_feed, get_city_feed, get_event_feed, get_explore_feed, get_feed, get_park_feed,
    FeedHandlerState, USER_ID_HEADER,
};

#[get("/api/v1/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Registers every feed-service route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .route("/metrics", web::get().to(crate::metrics::serve_metrics))
        .service(
            web::scope("/api/v1/feed")
                .service(get_feed)
                .service(get_explore_feed)
                .service(get_park_feed)
                .service(get_city_feed)
                .service(get_campus_feed)
                .service(get_event_feed),
        );
}
