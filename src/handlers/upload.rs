use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use super::{classify_bytes, error_response, loaded_classifier, HandlerError};
use crate::metrics::FlowKind;
use crate::prediction::PredictionResult;
use crate::state::AppState;

pub const MSG_NO_FILE_PART: &str = "No file part";
pub const MSG_NO_SELECTED_FILE: &str = "No selected file";

/// POST /upload
///
/// Multipart form with a single `file` field holding the image.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResult>, HandlerError> {
    state.metrics.record_request(FlowKind::Upload);

    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("[ai-or-human] Failed to read multipart body: {}", e);
                state.metrics.record_error(FlowKind::Upload);
                return Err(error_response(
                    e.status(),
                    format!("Failed to read upload: {}", e.body_text()),
                ));
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            state.metrics.record_error(FlowKind::Upload);
            error_response(
                e.status(),
                format!("Failed to read upload: {}", e.body_text()),
            )
        })?;
        file = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = file.ok_or_else(|| {
        state.metrics.record_error(FlowKind::Upload);
        error_response(StatusCode::BAD_REQUEST, MSG_NO_FILE_PART)
    })?;

    if file_name.is_empty() {
        state.metrics.record_error(FlowKind::Upload);
        return Err(error_response(StatusCode::BAD_REQUEST, MSG_NO_SELECTED_FILE));
    }

    let classifier = loaded_classifier(&state, FlowKind::Upload)?;
    let result = classify_bytes(&state, classifier, FlowKind::Upload, bytes).await?;
    Ok(Json(result))
}
