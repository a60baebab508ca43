//! The detector service: one loaded model behind a predict call
//!
//! The model, config and label metadata are loaded once and shared
//! read-only afterwards; parameter mutation happens only inside the
//! one-time checkpoint load. Inference is a pure function of (model,
//! input), so no request-level locking is needed.

use crate::checkpoint::{self, Checkpoint, CheckpointMetadata};
use crate::config::DetectorConfig;
use crate::error::{DetectorError, DetectorResult};
use crate::model::{create_model, Classifier};
use crate::preprocess;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use candle_core::{DType, Device, Module, D};
use candle_nn::{ops, VarBuilder, VarMap};
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use veridect_shared::{MetricsCollector, MetricsSnapshot, Prediction};

/// The accepted shapes of a prediction input
///
/// All variants normalize to a decoded RGB image before preprocessing.
#[derive(Debug)]
pub enum ImageInput {
    /// Base64 string, optionally prefixed with a `data:image/...;base64,` URL
    Base64(String),
    /// JSON mapping carrying the base64 payload under an `"image"` key
    Json(serde_json::Value),
    /// Raw encoded image bytes (file contents, upload body)
    Bytes(Vec<u8>),
    /// An already-decoded image
    Decoded(DynamicImage),
}

impl ImageInput {
    /// Normalizes the input to a decoded RGB image
    pub fn into_rgb(self) -> DetectorResult<RgbImage> {
        match self {
            Self::Base64(data) => decode_base64_image(&data),
            Self::Json(value) => {
                let data = value.get("image").and_then(|v| v.as_str()).ok_or_else(|| {
                    DetectorError::InvalidInput(
                        "expected an object with an \"image\" key".to_string(),
                    )
                })?;
                decode_base64_image(data)
            }
            Self::Bytes(bytes) => preprocess::decode_image(&bytes),
            Self::Decoded(image) => Ok(image.to_rgb8()),
        }
    }
}

impl From<String> for ImageInput {
    fn from(data: String) -> Self {
        Self::Base64(data)
    }
}

impl From<&str> for ImageInput {
    fn from(data: &str) -> Self {
        Self::Base64(data.to_string())
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        Self::Decoded(image)
    }
}

fn decode_base64_image(data: &str) -> DetectorResult<RgbImage> {
    let payload = if data.starts_with("data:image") {
        data.splitn(2, ',').nth(1).ok_or_else(|| {
            DetectorError::InvalidInput("data URL is missing the base64 payload".to_string())
        })?
    } else {
        data
    };
    let bytes = BASE64.decode(payload.trim())?;
    preprocess::decode_image(&bytes)
}

/// Service liveness report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status ("healthy")
    pub status: String,
    /// Device the model runs on
    pub device: String,
    /// Whether CUDA support is compiled in and a GPU is visible
    pub cuda_available: bool,
    /// Whether checkpoint weights were loaded
    pub model_loaded: bool,
}

/// Service statistics
#[derive(Debug, Clone, Serialize)]
pub struct DetectorStats {
    /// Request counters and latency
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
    /// Whether checkpoint weights were loaded
    pub model_loaded: bool,
}

/// Selects the inference device; negative ids mean CPU
pub fn select_device(device_id: i32) -> DetectorResult<Device> {
    if device_id < 0 {
        return Ok(Device::Cpu);
    }
    Device::cuda_if_available(device_id as usize).map_err(|e| {
        DetectorError::Model(format!("failed to initialize device {device_id}: {e}"))
    })
}

/// Short name of a device for reports and logs
pub fn device_name(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

/// AI-vs-real image detector
///
/// Owns the loaded classifier, its config and label metadata. Construct
/// once at startup and share behind an `Arc`.
#[derive(Debug)]
pub struct Detector {
    model: Classifier,
    config: DetectorConfig,
    metadata: CheckpointMetadata,
    device: Device,
    metrics: Arc<MetricsCollector>,
    model_loaded: bool,
}

impl Detector {
    /// Loads a detector from a checkpoint file
    ///
    /// The config is taken from `config_path` when given, otherwise from a
    /// `config.json` next to the checkpoint, otherwise from defaults.
    pub fn load(
        checkpoint_path: &Path,
        config_path: Option<&Path>,
        device_id: i32,
    ) -> DetectorResult<Self> {
        let config = load_config(checkpoint_path, config_path)?;
        let device = select_device(device_id)?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = create_model(&config, vb)?;

        let checkpoint = Checkpoint::read(checkpoint_path, &device)?;
        let report = checkpoint::load_into(&checkpoint, &varmap, &config)?;

        info!(
            loaded = report.loaded,
            device = device_name(&device),
            classes = ?report.metadata.idx_to_class,
            "Detector ready"
        );

        Ok(Self {
            model,
            config,
            metadata: report.metadata,
            device,
            metrics: Arc::new(MetricsCollector::new()),
            model_loaded: true,
        })
    }

    /// Builds a detector with freshly initialized (untrained) weights
    ///
    /// Used when no usable checkpoint is available; predictions will be
    /// meaningless and `/health` reports `model_loaded: false`.
    pub fn untrained(config: DetectorConfig, device: Device) -> DetectorResult<Self> {
        config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = create_model(&config, vb)?;

        let metadata = CheckpointMetadata {
            idx_to_class: config.label_map()?,
            num_classes: config.num_classes,
            balanced_acc: None,
            val_acc: None,
            timestamp: None,
        };

        Ok(Self {
            model,
            config,
            metadata,
            device,
            metrics: Arc::new(MetricsCollector::new()),
            model_loaded: false,
        })
    }

    /// Classifies one image
    ///
    /// Returns exactly `num_classes` predictions whose scores sum to 1,
    /// sorted by descending score.
    pub fn predict(&self, input: ImageInput) -> DetectorResult<Vec<Prediction>> {
        let started = Instant::now();
        let result = self.predict_inner(input);
        self.metrics
            .record_request(started.elapsed(), result.is_err());
        result
    }

    fn predict_inner(&self, input: ImageInput) -> DetectorResult<Vec<Prediction>> {
        let image = input.into_rgb()?;
        let tensor = preprocess::preprocess(&image, &self.config, &self.device)?;

        let logits = self.model.forward(&tensor.unsqueeze(0)?)?;
        let probs = ops::softmax(&logits, D::Minus1)?
            .squeeze(0)?
            .to_vec1::<f32>()?;

        let mut predictions: Vec<Prediction> = probs
            .iter()
            .enumerate()
            .map(|(idx, &score)| Prediction {
                label: self
                    .metadata
                    .idx_to_class
                    .get(&idx)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{idx}"))
                    .to_uppercase(),
                score,
            })
            .collect();
        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));

        Ok(predictions)
    }

    /// Classifies a batch of images sequentially
    ///
    /// One forward pass per image; a failing item does not affect the
    /// others, and output order matches input order.
    pub fn predict_batch(&self, inputs: Vec<ImageInput>) -> Vec<DetectorResult<Vec<Prediction>>> {
        inputs.into_iter().map(|input| self.predict(input)).collect()
    }

    /// Service liveness report
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "healthy".to_string(),
            device: device_name(&self.device).to_string(),
            cuda_available: candle_core::utils::cuda_is_available(),
            model_loaded: self.model_loaded,
        }
    }

    /// Request counters and model state
    pub fn stats(&self) -> DetectorStats {
        DetectorStats {
            metrics: self.metrics.snapshot(),
            model_loaded: self.model_loaded,
        }
    }

    /// Architecture name of the loaded model
    pub fn architecture(&self) -> &str {
        self.model.architecture()
    }

    /// Short name of the inference device
    pub fn device_name(&self) -> &'static str {
        device_name(&self.device)
    }

    /// The detector configuration
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Metadata resolved from the checkpoint (or config defaults)
    pub fn metadata(&self) -> &CheckpointMetadata {
        &self.metadata
    }
}

fn load_config(
    checkpoint_path: &Path,
    config_path: Option<&Path>,
) -> DetectorResult<DetectorConfig> {
    if let Some(path) = config_path {
        return DetectorConfig::from_json_file(path);
    }

    let sibling = checkpoint_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("config.json");
    if sibling.exists() {
        info!(path = %sibling.display(), "Loading detector config");
        DetectorConfig::from_json_file(&sibling)
    } else {
        warn!("Config not found, using defaults");
        Ok(DetectorConfig::default())
    }
}
