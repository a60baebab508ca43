//! REST wire types for the Veridect API
//!
//! Request and response bodies shared between the backend routes and the
//! client library, so both sides agree on the JSON contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of images accepted by a single batch request
pub const MAX_BATCH_IMAGES: usize = 10;

/// One class prediction: a label and its softmax probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Human-readable class label (e.g. "AI", "REAL")
    pub label: String,
    /// Probability in [0, 1]; a full prediction set sums to 1
    pub score: f32,
}

/// Request body for `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Base64-encoded image, optionally with a data-URL prefix
    pub image: String,
    /// Return all class scores, or only the top prediction
    #[serde(default = "default_return_all_scores")]
    pub return_all_scores: bool,
}

fn default_return_all_scores() -> bool {
    true
}

/// Response body for `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Per-class predictions, sorted by descending score
    pub predictions: Vec<Prediction>,
    /// Label of the highest-scoring class
    pub top_prediction: String,
    /// Score of the highest-scoring class
    pub confidence: f32,
}

/// Request body for `POST /predict/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    /// Base64-encoded images, at most [`MAX_BATCH_IMAGES`]
    pub images: Vec<String>,
}

/// Response body for `POST /predict/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    /// One entry per input image, preserving input order
    pub results: Vec<BatchPredictionResult>,
}

/// Per-image outcome within a batch response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchPredictionResult {
    /// The image was classified successfully
    Ok(PredictionResponse),
    /// Classification failed for this image only
    Err {
        /// Error description for this input
        error: String,
    },
}

/// Response body for `POST /predict/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Original filename of the uploaded image
    pub filename: String,
    /// Prediction payload for the uploaded image
    #[serde(flatten)]
    pub prediction: PredictionResponse,
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status ("healthy")
    pub status: String,
    /// API layer status ("online")
    pub api: String,
    /// Whether CUDA support is compiled in and a GPU is visible
    pub cuda_available: bool,
    /// Whether checkpoint weights were loaded into the model
    pub model_loaded: bool,
    /// Device the model runs on ("cpu", "cuda", "metal")
    pub device: String,
}

/// Response body for `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Service name
    pub name: String,
    /// Service version
    pub version: String,
    /// Short service description
    pub description: String,
    /// Route → description map of the exposed endpoints
    pub endpoints: BTreeMap<String, String>,
    /// Architecture name of the loaded model
    pub model: String,
    /// Device the model runs on
    pub device: String,
}

/// Structured error payload returned for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details for API consumers
    pub error: ErrorDetails,
}

/// Detailed error information for structured API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error type identifier
    pub r#type: String,
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    /// Builds an error payload from a type tag and message
    pub fn new(r#type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                r#type: r#type.into(),
                message: message.into(),
            },
        }
    }
}
