//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::{
    handlers,
    models::{AnalyzeRequest, AnalyzeResponse, ErrorEnvelope},
};
use crate::analyzer::VideoAnalyzer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<VideoAnalyzer>,
}

/// Configure and start the HTTP server
pub async fn start_http_server(
    analyzer: Arc<VideoAnalyzer>,
    host: &str,
    port: u16,
) -> Result<()> {
    let app = build_router(analyzer);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("🌐 API server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(analyzer: Arc<VideoAnalyzer>) -> Router {
    // Any origin, any method, any header: browser extensions and local
    // frontends call this service from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze_video", post(analyze_video_handler))
        .route("/health", get(health_handler))
        .with_state(AppState { analyzer })
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
}

/// Analyze video handler
async fn analyze_video_handler(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    match state.analyzer.analyze(&request.youtube_link).await {
        Ok(result) => {
            let response = AnalyzeResponse {
                key_concepts: result.key_concepts,
                summary: result.summary,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            warn!("Analysis failed for {}: {}", request.youtube_link, e);
            // Every request-fatal error is caller-correctable (bad URL,
            // missing transcript, infeasible sample count)
            (StatusCode::BAD_REQUEST, Json(ErrorEnvelope::new(e.to_string()))).into_response()
        }
    }
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    match handlers::health_check().await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            (status, Json(serde_json::json!({"error": e.to_string()}))).into_response()
        }
    }
}
