pub mod health;
pub mod instagram;
pub mod metrics;
pub mod upload;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::classifier::{decode_image, Classifier};
use crate::crypto;
use crate::metrics::FlowKind;
use crate::prediction::PredictionResult;
use crate::state::AppState;

pub const MSG_MODEL_NOT_LOADED: &str =
    "Model tidak dapat dimuat. Pastikan file model ada di direktori yang sama.";
pub const MSG_RATE_LIMITED: &str = "Terlalu banyak permintaan. Coba lagi nanti.";

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

pub type HandlerError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn loaded_classifier(
    state: &AppState,
    flow: FlowKind,
) -> Result<Arc<dyn Classifier>, HandlerError> {
    state.classifier.clone().ok_or_else(|| {
        state.metrics.record_error(flow);
        error_response(StatusCode::SERVICE_UNAVAILABLE, MSG_MODEL_NOT_LOADED)
    })
}

/// Decodes and classifies on the blocking pool.
pub(crate) async fn classify_bytes(
    state: &AppState,
    classifier: Arc<dyn Classifier>,
    flow: FlowKind,
    bytes: Vec<u8>,
) -> Result<PredictionResult, HandlerError> {
    let request_id = uuid::Uuid::new_v4();
    let digest = crypto::short_digest(&bytes);
    info!(
        "[ai-or-human] {} classify {:?}: {} bytes, digest {}",
        request_id,
        flow,
        bytes.len(),
        digest
    );

    let start = Instant::now();
    let outcome = tokio::task::spawn_blocking(move || {
        // Decode failures: 400 for uploads, 500 for downloaded post images.
        let image = decode_image(&bytes).map_err(|e| match flow {
            FlowKind::Upload => error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid image file: {:#}", e),
            ),
            FlowKind::Instagram => {
                error!("[ai-or-human] Downloaded post image failed to decode: {:?}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Error processing image: {:#}", e),
                )
            }
        })?;
        classifier.classify(&image).map_err(|e| {
            error!("[ai-or-human] Classification failed: {:?}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing image: {}", e),
            )
        })
    })
    .await
    .map_err(|e| {
        error!("[ai-or-human] Classification task panicked: {:?}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Error processing image")
    })
    .and_then(|r| r);

    match outcome {
        Ok(result) => {
            let elapsed = start.elapsed().as_millis() as u64;
            state.metrics.record_result(flow, &result, elapsed);
            info!(
                "[ai-or-human] {} -> {} (confidence {:.4}) in {}ms",
                request_id, result.prediction, result.confidence, elapsed
            );
            Ok(result)
        }
        Err(e) => {
            state.metrics.record_error(flow);
            Err(e)
        }
    }
}
