use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: Option<String>,
    pub ready: bool,
    pub cached_posts: usize,
    pub started_at: DateTime<Utc>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: format!("ai-or-human-v{}", env!("CARGO_PKG_VERSION")),
        model: state
            .classifier
            .as_ref()
            .map(|c| c.descriptor().name.clone()),
        ready: state.classifier.is_some(),
        cached_posts: state.posts.len(),
        started_at: state.started_at,
    })
}
