//! # Veridect Shared
//!
//! Common functionality shared across the Veridect components: error
//! handling, CLI option groups, request metrics, and the REST wire types
//! exchanged between the backend and the client library.

pub mod api;
pub mod cli;
pub mod error;
pub mod metrics;

pub use api::{
    BatchPredictRequest, BatchPredictResponse, BatchPredictionResult, ErrorDetails, ErrorResponse,
    HealthResponse, PredictRequest, Prediction, PredictionResponse, ServiceInfo, UploadResponse,
    MAX_BATCH_IMAGES,
};
pub use cli::LoggingOptions;
pub use error::{Result, VeridectError};
pub use metrics::{MetricsCollector, MetricsSnapshot};

/// Current version of the Veridect workspace
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
