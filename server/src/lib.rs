use anyhow::Result;
use axum::{extract::{Query, State}, http::StatusCode, routing::get, Json, Router};
use marquee_core::wikitext::parse_record;
use marquee_core::{Corpus, CorpusConfig, ParsedRecord, Resolution};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct LabelParams {
    pub label: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub results: Vec<String>,
}

#[derive(Serialize)]
pub struct OffsetResponse {
    pub label: String,
    pub offset: u64,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
}

pub fn build_app(config: CorpusConfig) -> Result<Router> {
    let corpus = Corpus::open(config)?;
    let app_state = AppState { corpus: Arc::new(corpus) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/offset", get(offset_handler))
        .route("/record", get(record_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

/// Run blocking store/archive work off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let k = params.k.unwrap_or(state.corpus.config().search_limit).clamp(1, MAX_K);
    let corpus = state.corpus.clone();
    let query = params.q.clone();
    let results = blocking(move || {
        corpus
            .store()
            .search_labels(&query, k)
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    })
    .await?;
    Ok(Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), results }))
}

pub async fn offset_handler(
    State(state): State<AppState>,
    Query(params): Query<LabelParams>,
) -> Result<Json<OffsetResponse>, ApiError> {
    let corpus = state.corpus.clone();
    blocking(move || match corpus.offset(&params.label) {
        Ok(Some(offset)) => Ok(Json(OffsetResponse { label: params.label, offset })),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, format!("{} is not indexed", params.label))),
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    })
    .await
}

pub async fn record_handler(
    State(state): State<AppState>,
    Query(params): Query<LabelParams>,
) -> Result<Json<ParsedRecord>, ApiError> {
    let corpus = state.corpus.clone();
    blocking(move || match corpus.resolve(&params.label) {
        Resolution::Resolved { markup, label } => Ok(Json(parse_record(&markup, &label))),
        Resolution::Unavailable { requested, last_tried, reason } => {
            tracing::info!(%requested, %last_tried, %reason, "record unavailable");
            Err((
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": reason.to_string(),
                    "reason": reason,
                    "requested": requested,
                    "last_tried": last_tried,
                })),
            ))
        }
    })
    .await
}
