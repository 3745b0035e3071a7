use crate::errors::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    routing::{get, post},
};
use inference::NormalizedDetection;
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Base64 encoded image
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backend: String,
    pub labels: usize,
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /predict - detect objects in a base64-encoded image
///
/// Responds with the detections in emission order, boxes normalized to
/// [0, 1]. No detections is `[]` with 200.
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<Vec<NormalizedDetection>>, ApiError> {
    let Json(request) = payload?;

    tracing::debug!(payload_len = request.image.len(), "Prediction request received");

    // Inference is CPU bound and serialized on the backend lock
    let pipeline = state.pipeline.clone();
    let detections = tokio::task::spawn_blocking(move || pipeline.predict(&request.image))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {}", e)))??;

    tracing::debug!(count = detections.len(), "Prediction complete");

    Ok(Json(detections))
}

/// GET /health - liveness plus the loaded backend
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.pipeline.backend_name().to_string(),
        labels: state.pipeline.label_count(),
    })
}
