//! # Veridect Backend
//!
//! REST API backend for the Veridect AI-vs-real image detector. The model
//! is loaded once at startup and shared read-only across requests.
//!
//! ## Endpoints
//!
//! - `GET /` - Service metadata
//! - `GET /health` - Liveness and GPU availability
//! - `POST /predict` - Single image prediction
//! - `POST /predict/batch` - Batch prediction (max 10 images)
//! - `POST /predict/upload` - Multipart file upload prediction

pub mod cli_options;
pub mod config;
pub mod routes;

pub use cli_options::BackendCliOptions;
pub use config::BackendConfig;
pub use routes::router;

use std::sync::Arc;
use tracing::{error, info};
use veridect_inference::{select_device, Detector, DetectorConfig};
use veridect_shared::{Result, VeridectError};

/// Loads the detector, falling back to untrained weights on failure
///
/// A bad checkpoint is reported loudly but does not kill the process; the
/// degraded state is visible through `model_loaded: false` in `/health`.
pub fn init_detector(config: &BackendConfig) -> Result<Detector> {
    match Detector::load(
        &config.model_path,
        config.config_path.as_deref(),
        config.device_id,
    ) {
        Ok(detector) => Ok(detector),
        Err(e) => {
            error!(
                error = %e,
                model_path = %config.model_path.display(),
                "Checkpoint load failed, continuing with untrained weights"
            );
            let detector_config = config
                .config_path
                .as_deref()
                .and_then(|path| DetectorConfig::from_json_file(path).ok())
                .unwrap_or_default();
            let device = select_device(config.device_id).map_err(detector_error)?;
            Detector::untrained(detector_config, device).map_err(detector_error)
        }
    }
}

/// Runs the backend server until interrupted
pub async fn serve(config: BackendConfig) -> Result<()> {
    let detector = Arc::new(init_detector(&config)?);
    let app = routes::router(detector, config.max_body_bytes);

    info!(
        listen_addr = %config.listen_addr,
        service_name = %config.service_name,
        "Backend server listening"
    );

    axum::Server::bind(&config.listen_addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            VeridectError::network(
                config.listen_addr.to_string(),
                format!("server error: {e}"),
                Some(Box::new(e)),
            )
        })?;

    info!("Backend server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn detector_error(e: veridect_inference::DetectorError) -> VeridectError {
    VeridectError::configuration(e.to_string())
}
