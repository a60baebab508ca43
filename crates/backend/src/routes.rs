//! REST routes for the Veridect backend
//!
//! The handlers are thin translations between the HTTP surface and the
//! detector service: input errors become 400s, everything else a 500 with
//! a structured JSON payload.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::instrument;
use veridect_inference::{Detector, DetectorError, ImageInput};
use veridect_shared::{
    BatchPredictRequest, BatchPredictResponse, BatchPredictionResult, ErrorResponse,
    HealthResponse, PredictRequest, Prediction, PredictionResponse, ServiceInfo, UploadResponse,
    MAX_BATCH_IMAGES,
};

const SERVICE_NAME: &str = "Veridect AI-vs-Real Image Detector API";
const SERVICE_DESCRIPTION: &str = "Detect AI-generated vs real images";

/// Error wrapper translating detector errors into HTTP responses
pub struct ApiError(DetectorError);

impl From<DetectorError> for ApiError {
    fn from(err: DetectorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.to_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

/// Builds the backend router around a loaded detector
pub fn router(detector: Arc<Detector>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/predict/upload", post(predict_upload))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(detector)
}

async fn root(State(detector): State<Arc<Detector>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: SERVICE_DESCRIPTION.to_string(),
        endpoints: BTreeMap::from([
            (
                "POST /predict".to_string(),
                "Single image prediction".to_string(),
            ),
            (
                "POST /predict/batch".to_string(),
                "Batch image prediction".to_string(),
            ),
            (
                "POST /predict/upload".to_string(),
                "Upload image file for prediction".to_string(),
            ),
            ("GET /health".to_string(), "Health check".to_string()),
        ]),
        model: detector.architecture().to_string(),
        device: detector.device_name().to_string(),
    })
}

async fn health(State(detector): State<Arc<Detector>>) -> Json<HealthResponse> {
    let report = detector.health();
    Json(HealthResponse {
        status: report.status,
        api: "online".to_string(),
        cuda_available: report.cuda_available,
        model_loaded: report.model_loaded,
        device: report.device,
    })
}

async fn metrics(
    State(detector): State<Arc<Detector>>,
) -> Json<veridect_inference::DetectorStats> {
    Json(detector.stats())
}

#[instrument(skip_all)]
async fn predict(
    State(detector): State<Arc<Detector>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let predictions = detector.predict(ImageInput::Base64(request.image))?;
    Ok(Json(to_prediction_response(
        predictions,
        request.return_all_scores,
    )?))
}

#[instrument(skip_all)]
async fn predict_batch(
    State(detector): State<Arc<Detector>>,
    Json(request): Json<BatchPredictRequest>,
) -> Result<Json<BatchPredictResponse>, ApiError> {
    if request.images.len() > MAX_BATCH_IMAGES {
        return Err(DetectorError::InvalidInput(format!(
            "maximum {MAX_BATCH_IMAGES} images per batch request"
        ))
        .into());
    }

    let inputs = request.images.into_iter().map(ImageInput::Base64).collect();
    let results = detector
        .predict_batch(inputs)
        .into_iter()
        .map(|result| match result.and_then(|p| to_prediction_response(p, true)) {
            Ok(response) => BatchPredictionResult::Ok(response),
            Err(e) => BatchPredictionResult::Err {
                error: e.to_string(),
            },
        })
        .collect();

    Ok(Json(BatchPredictResponse { results }))
}

#[instrument(skip_all)]
async fn predict_upload(
    State(detector): State<Arc<Detector>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DetectorError::InvalidInput(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().unwrap_or("").to_string();
        if !content_type.starts_with("image/") {
            return Err(DetectorError::InvalidInput("file must be an image".to_string()).into());
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| DetectorError::InvalidInput(format!("failed to read upload: {e}")))?;

        let predictions = detector.predict(ImageInput::Bytes(bytes.to_vec()))?;
        return Ok(Json(UploadResponse {
            filename,
            prediction: to_prediction_response(predictions, true)?,
        }));
    }

    Err(DetectorError::InvalidInput("multipart request has no \"file\" field".to_string()).into())
}

fn to_prediction_response(
    predictions: Vec<Prediction>,
    return_all_scores: bool,
) -> Result<PredictionResponse, DetectorError> {
    let top = predictions
        .first()
        .cloned()
        .ok_or_else(|| DetectorError::Inference("empty prediction set".to_string()))?;

    Ok(PredictionResponse {
        top_prediction: top.label.clone(),
        confidence: top.score,
        predictions: if return_all_scores {
            predictions
        } else {
            vec![top]
        },
    })
}
