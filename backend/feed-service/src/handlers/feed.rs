use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::{cache_key, FeedCache};
use crate::error::{AppError, Result};
use crate::metrics::feed::{FEED_CACHE_EVENTS, FEED_CACHE_WRITE_TOTAL};
use crate::models::{FeedContext, FeedRequest, FeedType, PageOptions};
use crate::services::FeedAssembler;

/// Header set by the gateway after authentication.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQueryParams {
    pub feed_type: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
    pub park_id: Option<String>,
    pub city_name: Option<String>,
    pub campus_id: Option<String>,
    pub event_id: Option<String>,
    pub contest_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQueryParams {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

pub struct FeedHandlerState {
    pub assembler: Arc<FeedAssembler>,
    pub cache: Option<FeedCache>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FeedQueryParams {
    fn context(&self) -> FeedContext {
        FeedContext {
            park_id: non_empty(self.park_id.clone()),
            city_name: non_empty(self.city_name.clone()),
            campus_id: non_empty(self.campus_id.clone()),
            event_id: non_empty(self.event_id.clone()),
            contest_id: non_empty(self.contest_id.clone()),
        }
    }
}

fn caller_id(req: &HttpRequest) -> Result<String> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Missing user context".into()))
}

fn page_options(
    state: &FeedHandlerState,
    limit: Option<usize>,
    cursor: Option<String>,
) -> Result<PageOptions> {
    let settings = state.assembler.settings();
    let limit = limit.unwrap_or(settings.default_limit);
    if limit == 0 || limit > settings.max_limit {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            settings.max_limit
        )));
    }
    Ok(PageOptions {
        limit,
        cursor: non_empty(cursor),
    })
}

fn path_id(raw: String, name: &str) -> Result<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", name)));
    }
    Ok(id.to_string())
}

/// Serves a page through the cache when one is configured.
async fn serve_page(
    state: &FeedHandlerState,
    user_id: &str,
    request: FeedRequest,
) -> Result<HttpResponse> {
    let key = cache_key(user_id, &request);

    if let Some(cache) = &state.cache {
        match cache.get_page(&key).await {
            Ok(Some(page)) => {
                FEED_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                return Ok(HttpResponse::Ok().json(page));
            }
            Ok(None) => {
                FEED_CACHE_EVENTS.with_label_values(&["miss"]).inc();
            }
            Err(e) => {
                FEED_CACHE_EVENTS.with_label_values(&["error"]).inc();
                warn!(error = %e, key = %key, "Page cache read failed, assembling fresh page");
            }
        }
    }

    let page = state.assembler.get_personalized_feed(user_id, request).await?;

    if let Some(cache) = &state.cache {
        match cache.set_page(&key, &page).await {
            Ok(()) => FEED_CACHE_WRITE_TOTAL.with_label_values(&["success"]).inc(),
            Err(e) => {
                FEED_CACHE_WRITE_TOTAL.with_label_values(&["error"]).inc();
                warn!(error = %e, key = %key, "Page cache write failed");
            }
        }
    }

    Ok(HttpResponse::Ok().json(page))
}

#[get("")]
pub async fn get_feed(
    query: web::Query<FeedQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&http_req)?;
    let query = query.into_inner();

    let feed_type = query
        .feed_type
        .as_deref()
        .map(FeedType::parse)
        .unwrap_or(FeedType::Home);
    let context = query.context();
    let options = page_options(&state, query.limit, query.cursor)?;

    debug!(
        user_id = %user_id,
        feed_type = %feed_type,
        limit = options.limit,
        "Getting personalized feed"
    );

    let request = FeedRequest {
        limit: options.limit,
        cursor: options.cursor,
        feed_type,
        context,
    };
    serve_page(&state, &user_id, request).await
}

/// Context parameters are honoured; `feedType` is ignored.
#[get("/explore")]
pub async fn get_explore_feed(
    query: web::Query<FeedQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&http_req)?;
    let query = query.into_inner();
    let context = query.context();
    let options = page_options(&state, query.limit, query.cursor)?;
    serve_page(&state, &user_id, FeedRequest::explore(options, context)).await
}

#[get("/parks/{park_id}")]
pub async fn get_park_feed(
    path: web::Path<String>,
    query: web::Query<PageQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&http_req)?;
    let park_id = path_id(path.into_inner(), "parkId")?;
    let query = query.into_inner();
    let options = page_options(&state, query.limit, query.cursor)?;
    serve_page(&state, &user_id, FeedRequest::park(park_id, options)).await
}

#[get("/cities/{city_name}")]
pub async fn get_city_feed(
    path: web::Path<String>,
    query: web::Query<PageQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&http_req)?;
    let city_name = path_id(path.into_inner(), "cityName")?;
    let query = query.into_inner();
    let options = page_options(&state, query.limit, query.cursor)?;
    serve_page(&state, &user_id, FeedRequest::city(city_name, options)).await
}

#[get("/campuses/{campus_id}")]
pub async fn get_campus_feed(
    path: web::Path<String>,
    query: web::Query<PageQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&http_req)?;
    let campus_id = path_id(path.into_inner(), "campusId")?;
    let query = query.into_inner();
    let options = page_options(&state, query.limit, query.cursor)?;
    serve_page(&state, &user_id, FeedRequest::campus(campus_id, options)).await
}

#[get("/events/{event_id}")]
pub async fn get_event_feed(
    path: web::Path<String>,
    query: web::Query<PageQueryParams>,
    http_req: HttpRequest,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let user_id = caller_id(&http_req)?;
    let event_id = path_id(path.into_inner(), "eventId")?;
    let query = query.into_inner();
    let options = page_options(&state, query.limit, query.cursor)?;
    serve_page(&state, &user_id, FeedRequest::event(event_id, options)).await
}
