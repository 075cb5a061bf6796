//! REST endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    error::ApiError,
    model::ScoringAdapter,
    pipeline,
    stats::{CustomerStats, SNAPSHOT},
    types::{BatchPredictionResponse, CustomerRecord, PredictionResult},
};

pub const SERVICE_NAME: &str = "TeleLink Customer Analytics API";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ScoringAdapter>,
}

impl AppState {
    pub fn new(models: ScoringAdapter) -> Self {
        Self {
            models: Arc::new(models),
        }
    }
}

#[derive(Debug, Serialize)]
struct OnlineResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    models_loaded: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    churn_model: &'static str,
    clv_model: &'static str,
    api_version: &'static str,
}

fn load_state(loaded: bool) -> &'static str {
    if loaded {
        "loaded"
    } else {
        "not loaded"
    }
}

pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/online", get(online))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/batch-predict", post(batch_predict))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(state)
}

/// Empty origin list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::error!("All configured CORS origins are invalid, allowing any origin");
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

async fn online(State(state): State<AppState>) -> Json<OnlineResponse> {
    Json(OnlineResponse {
        status: "online",
        service: SERVICE_NAME,
        version: API_VERSION,
        models_loaded: state.models.is_ready(),
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let m = &state.models;
    Json(HealthResponse {
        status: if m.is_ready() { "healthy" } else { "degraded" },
        churn_model: load_state(m.churn_loaded()),
        clv_model: load_state(m.clv_loaded()),
        api_version: API_VERSION,
    })
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<CustomerRecord>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(record) = payload?;
    pipeline::predict_one(&state.models, &record).map(Json)
}

async fn batch_predict(
    State(state): State<AppState>,
    payload: Result<Json<Vec<CustomerRecord>>, JsonRejection>,
) -> Result<Json<BatchPredictionResponse>, ApiError> {
    let Json(records) = payload?;
    pipeline::predict_batch(&state.models, &records).map(Json)
}

async fn stats() -> Json<CustomerStats> {
    Json(SNAPSHOT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_creation() {
        let _ = create_router(AppState::new(ScoringAdapter::default()), &[]);
        let _ = create_router(
            AppState::new(ScoringAdapter::default()),
            &["http://localhost:3000".to_string(), "bad\norigin".to_string()],
        );
    }

    async fn allow_origin_for(app: Router, origin: &str) -> Option<String> {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        let req = Request::builder()
            .method("GET")
            .uri("/online")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        resp.headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_cors_limited_to_configured_origins() {
        let origins = vec!["http://a.example".to_string()];
        let app = || create_router(AppState::new(ScoringAdapter::default()), &origins);

        assert_eq!(
            allow_origin_for(app(), "http://a.example").await.as_deref(),
            Some("http://a.example")
        );
        assert_eq!(allow_origin_for(app(), "http://evil.example").await, None);
    }

    #[tokio::test]
    async fn test_cors_permissive_without_configured_origins() {
        let app = create_router(AppState::new(ScoringAdapter::default()), &[]);
        assert_eq!(
            allow_origin_for(app, "http://anywhere.example").await.as_deref(),
            Some("*")
        );
    }

    #[test]
    fn version_matches_package() {
        assert_eq!(API_VERSION, "2.0.0");
    }
}
