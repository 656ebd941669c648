//! HTTP routes and handlers.
//!
//! | Method | Path                | Handler                 |
//! |--------|---------------------|-------------------------|
//! | GET    | `/health`           | liveness                |
//! | POST   | `/api/v1/search`    | directory search        |
//! | GET    | `/api/v1/locations` | location typeahead      |
//! | GET    | `/api/v1/locale`    | resolve session language|
//! | PUT    | `/api/v1/locale`    | store session language  |
//! | POST   | `/api/v1/usage`     | daily ceiling check     |
//! | GET    | `/api/v1/news`      | health news cards       |

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tervis_core::{
    Identity, Language, LocaleResolver, LocationSuggestionService, NewsSource, SearchService,
    ThrottleDecision, UsageThrottle,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::dto::{
    LocaleParams, LocaleResponse, LocaleUpdate, LocationParams, NewsParams, NewsResponse,
    SearchRequest, SearchResponse, UsageRequest,
};
use crate::error::ApiError;

/// Services shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub search: SearchService,
    pub suggestions: LocationSuggestionService,
    pub throttle: UsageThrottle,
    pub locale: LocaleResolver,
    pub news: Arc<dyn NewsSource>,
}

/// Builds the API router with permissive CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/search", post(search))
        .route("/api/v1/locations", get(locations))
        .route("/api/v1/locale", get(get_locale).put(put_locale))
        .route("/api/v1/usage", post(record_usage))
        .route("/api/v1/news", get(news))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = body?;
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Query is required".to_string()));
    }

    if let Some(identity) =
        Identity::resolve(request.user_id.as_deref(), request.session_id.as_deref())
    {
        let decision = gate(&state, &identity, &request, query).await;
        if !decision.allowed {
            return Err(ApiError::TooManyRequests(decision));
        }
    }

    let language = request.language.unwrap_or_default();
    let result = state.search.search(query, language).await?;
    Ok(Json(SearchResponse::from(result)))
}

/// Throttle check for a search. A failing usage store lets the search through.
async fn gate(
    state: &AppState,
    identity: &Identity,
    request: &SearchRequest,
    query: &str,
) -> ThrottleDecision {
    match state
        .throttle
        .check_and_record(identity, request.session_id.as_deref(), request.mode, query)
        .await
    {
        Ok(decision) => decision,
        Err(e) => {
            warn!("Usage check failed, allowing search: {}", e);
            ThrottleDecision {
                allowed: true,
                used: 0,
                limit: state.throttle.limit_for(request.mode),
            }
        }
    }
}

async fn locations(State(state): State<AppState>, Query(params): Query<LocationParams>) -> Response {
    let query = params.q.unwrap_or_default();
    if !state.suggestions.accepts(&query) {
        let message = format!(
            "Query must be at least {} characters",
            state.suggestions.min_chars()
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message, "locations": [] })),
        )
            .into_response();
    }

    let suggestions = state.suggestions.suggest(&query).await;
    if suggestions.error.is_some() {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(suggestions)).into_response()
    } else {
        Json(suggestions).into_response()
    }
}

async fn get_locale(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LocaleParams>,
) -> Result<Json<LocaleResponse>, ApiError> {
    let session = params
        .session
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("session is required".to_string()))?;
    let host = headers.get(HOST).and_then(|h| h.to_str().ok());

    let language = state.locale.resolve(&session, host).await;
    Ok(Json(LocaleResponse { language }))
}

async fn put_locale(
    State(state): State<AppState>,
    body: Result<Json<LocaleUpdate>, JsonRejection>,
) -> Result<Json<LocaleResponse>, ApiError> {
    let Json(update) = body?;
    if update.session.trim().is_empty() {
        return Err(ApiError::BadRequest("session is required".to_string()));
    }
    let language = Language::from_code(&update.language).ok_or_else(|| {
        ApiError::BadRequest(format!("Unsupported language: {}", update.language))
    })?;

    state.locale.set_preference(&update.session, language).await?;
    Ok(Json(LocaleResponse { language }))
}

async fn record_usage(
    State(state): State<AppState>,
    body: Result<Json<UsageRequest>, JsonRejection>,
) -> Result<Json<ThrottleDecision>, ApiError> {
    let Json(request) = body?;
    let identity = Identity::resolve(request.user_id.as_deref(), request.session_id.as_deref())
        .ok_or_else(|| ApiError::BadRequest("sessionId or userId is required".to_string()))?;

    let decision = state
        .throttle
        .check_and_record(
            &identity,
            request.session_id.as_deref(),
            request.mode,
            &request.query,
        )
        .await?;
    Ok(Json(decision))
}

async fn news(State(state): State<AppState>, Query(params): Query<NewsParams>) -> Json<NewsResponse> {
    let language = params
        .lang
        .as_deref()
        .and_then(Language::from_code)
        .unwrap_or_default();

    let items = state.news.latest(language).await;
    Json(NewsResponse {
        status: "ok",
        items,
    })
}
