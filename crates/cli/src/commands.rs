//! Command implementations for the Veridect CLI

use crate::cli_options::{PredictOptions, RemoteOptions};
use veridect_client::DetectorClient;
use veridect_inference::{Detector, ImageInput};
use veridect_shared::{Prediction, Result, VeridectError};

/// Classify one image, locally or against a running server
pub async fn predict(opts: PredictOptions) -> Result<()> {
    println!("Analyzing image: {}", opts.image.display());

    let predictions: Vec<Prediction> = match &opts.url {
        Some(url) => {
            let client = build_client(url, opts.api_key.clone());
            let response = client
                .predict_file(&opts.image, true)
                .await
                .map_err(|e| client_error(url, e))?;
            response.predictions
        }
        None => {
            let detector = Detector::load(
                &opts.model_path,
                opts.config_path.as_deref(),
                opts.device_id,
            )
            .map_err(|e| VeridectError::configuration(e.to_string()))?;
            let bytes = std::fs::read(&opts.image)?;
            detector
                .predict(ImageInput::Bytes(bytes))
                .map_err(|e| VeridectError::internal(e.to_string()))?
        }
    };

    println!();
    println!("Results:");
    for prediction in &predictions {
        println!("  {}: {:.2}%", prediction.label, prediction.score * 100.0);
    }

    if let Some(top) = predictions.first() {
        println!();
        println!(
            "Verdict: {} ({:.1}% confidence)",
            top.label,
            top.score * 100.0
        );
    }

    Ok(())
}

/// Print the health report of a running server
pub async fn health(opts: RemoteOptions) -> Result<()> {
    let client = build_client(&opts.url, opts.api_key);
    let health = client
        .health()
        .await
        .map_err(|e| client_error(client.base_url(), e))?;

    println!("Status: {}", health.status);
    println!("API: {}", health.api);
    println!("Device: {}", health.device);
    println!("CUDA available: {}", health.cuda_available);
    println!("Model loaded: {}", health.model_loaded);
    Ok(())
}

/// Print the metadata of a running server
pub async fn info(opts: RemoteOptions) -> Result<()> {
    let client = build_client(&opts.url, opts.api_key);
    let info = client
        .info()
        .await
        .map_err(|e| client_error(client.base_url(), e))?;

    let rendered = serde_json::to_string_pretty(&info)
        .map_err(|e| VeridectError::internal(format!("failed to render response: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn build_client(url: &str, api_key: Option<String>) -> DetectorClient {
    let client = DetectorClient::new(url);
    match api_key {
        Some(key) => client.with_api_key(key),
        None => client,
    }
}

fn client_error(url: &str, err: veridect_client::ClientError) -> VeridectError {
    VeridectError::network(url, err.to_string(), Some(Box::new(err)))
}
