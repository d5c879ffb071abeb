//! ai-or-human: tells whether an image was made by a person or generated by AI.
//!
//! The crate has two halves:
//! - a classification server (`router`, `handlers`) exposing `POST /upload`
//!   and `POST /instagram`
//! - a headless page controller (`ui`) that drives both submission flows
//!   against that server through `client::HttpApi`

pub mod classifier;
pub mod client;
pub mod config;
pub mod crypto;
pub mod handlers;
pub mod instagram;
pub mod metrics;
pub mod prediction;
pub mod state;
pub mod templates;
pub mod ui;

use axum::error_handling::HandleErrorLayer;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::Router;
use std::time::Duration;
use tower::buffer::BufferLayer;
use tower::limit::RateLimitLayer;
use tower::load_shed::error::Overloaded;
use tower::load_shed::LoadShedLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub use prediction::{PredictionPayload, PredictionResult};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = if let Some(ref origins) = state.config.cors_origins {
        let origins: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Each Instagram request reaches out to instagram.com. Over the limit,
    // requests are shed immediately instead of waiting out the window.
    let instagram_rate_limit = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(rate_limit_error))
        .layer(BufferLayer::new(16))
        .layer(LoadShedLayer::new())
        .layer(RateLimitLayer::new(10, Duration::from_secs(60)));

    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/upload", post(handlers::upload::upload))
        .route(
            "/instagram",
            post(handlers::instagram::instagram).layer(instagram_rate_limit),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state)
}

async fn rate_limit_error(err: BoxError) -> handlers::HandlerError {
    if err.is::<Overloaded>() {
        handlers::error_response(StatusCode::TOO_MANY_REQUESTS, handlers::MSG_RATE_LIMITED)
    } else {
        tracing::error!("[ai-or-human] Instagram service error: {}", err);
        handlers::error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(templates::index::render(state.config.static_dir.as_deref()))
}
