use axum::extract::State;
use axum::Json;

use crate::metrics::PredictionStats;
use crate::state::AppState;

pub async fn metrics(State(state): State<AppState>) -> Json<PredictionStats> {
    Json(state.metrics.snapshot())
}
