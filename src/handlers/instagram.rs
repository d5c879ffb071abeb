use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use base64::Engine as _;
use serde::Deserialize;
use tracing::{info, warn};

use super::{classify_bytes, error_response, loaded_classifier, HandlerError};
use crate::instagram::{fetch_post_image, parse_post_url, FetchError, MSG_VIDEO};
use crate::metrics::FlowKind;
use crate::prediction::PredictionResult;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct InstagramRequest {
    #[serde(default)]
    pub url: String,
}

/// POST /instagram
///
/// Looks up the post behind `url`, downloads its image and classifies it.
/// The response carries the image itself as base64 in `image_data`.
pub async fn instagram(
    State(state): State<AppState>,
    Json(request): Json<InstagramRequest>,
) -> Result<Json<PredictionResult>, HandlerError> {
    state.metrics.record_request(FlowKind::Instagram);

    let shortcode = parse_post_url(&request.url).map_err(|e| {
        state.metrics.record_error(FlowKind::Instagram);
        error_response(StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let classifier = loaded_classifier(&state, FlowKind::Instagram)?;

    info!("[ai-or-human] Instagram post {}", shortcode);
    let (post, bytes) = fetch_post_image(state.fetcher.as_ref(), &state.posts, &shortcode)
        .await
        .map_err(|e| {
            warn!("[ai-or-human] Instagram fetch for {} failed: {}", shortcode, e);
            state.metrics.record_error(FlowKind::Instagram);
            let status = match &e {
                FetchError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            error_response(status, e.to_string())
        })?;

    if post.is_video {
        state.metrics.record_error(FlowKind::Instagram);
        return Err(error_response(StatusCode::BAD_REQUEST, MSG_VIDEO));
    }

    let image_data = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let mut result = classify_bytes(&state, classifier, FlowKind::Instagram, bytes).await?;
    result.image_data = Some(image_data);
    Ok(Json(result))
}
