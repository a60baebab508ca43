//! Configuration for the Veridect detector
//!
//! The config file is the source of truth for both model construction and
//! image preprocessing. It is read once at startup and immutable afterwards.

use crate::error::{ConfigError, DetectorResult};
use crate::model;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use validator::{Validate, ValidationError};

/// ImageNet channel means, the preprocessing default
pub const DEFAULT_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations, the preprocessing default
pub const DEFAULT_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Detector configuration
///
/// Loaded from a JSON file with the keys `architecture`, `num_classes`,
/// `drop_rate`, `drop_path_rate`, `image_size`, `mean`, `std` and
/// `idx_to_class`. Missing keys fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DetectorConfig {
    /// Architecture name resolved through the model registry
    #[validate(custom(function = "validate_architecture"))]
    pub architecture: String,

    /// Number of output classes
    #[validate(range(min = 1, max = 1024, message = "Number of classes must be between 1 and 1024"))]
    pub num_classes: usize,

    /// Classifier head dropout rate
    #[validate(range(min = 0.0, max = 1.0, message = "Drop rate must be between 0.0 and 1.0"))]
    pub drop_rate: f32,

    /// Stochastic depth rate (kept for checkpoint config compatibility;
    /// only relevant during training)
    #[validate(range(min = 0.0, max = 1.0, message = "Drop path rate must be between 0.0 and 1.0"))]
    pub drop_path_rate: f32,

    /// Input image edge length in pixels
    #[validate(range(min = 32, max = 1024, message = "Image size must be between 32 and 1024"))]
    pub image_size: usize,

    /// Per-channel normalization means (RGB)
    #[validate(length(min = 3, max = 3, message = "Mean must have exactly 3 channels"))]
    pub mean: Vec<f32>,

    /// Per-channel normalization standard deviations (RGB)
    #[validate(
        length(min = 3, max = 3, message = "Std must have exactly 3 channels"),
        custom(function = "validate_std")
    )]
    pub std: Vec<f32>,

    /// Class index → label mapping; JSON object keys are strings
    pub idx_to_class: BTreeMap<String, String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            architecture: "convdet_s1".to_string(),
            num_classes: 2,
            drop_rate: 0.2,
            drop_path_rate: 0.1,
            image_size: 224,
            mean: DEFAULT_MEAN.to_vec(),
            std: DEFAULT_STD.to_vec(),
            idx_to_class: BTreeMap::from([
                ("0".to_string(), "ai".to_string()),
                ("1".to_string(), "real".to_string()),
            ]),
        }
    }
}

impl DetectorConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DetectorResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {e}")))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> DetectorResult<()> {
        Validate::validate(self)?;

        for (key, _) in &self.idx_to_class {
            if key.parse::<usize>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "idx_to_class".to_string(),
                    value: key.clone(),
                    reason: "keys must be non-negative integers".to_string(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Class index → label mapping with keys normalized to integers
    pub fn label_map(&self) -> DetectorResult<BTreeMap<usize, String>> {
        self.idx_to_class
            .iter()
            .map(|(key, label)| {
                let idx = key.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                    field: "idx_to_class".to_string(),
                    value: key.clone(),
                    reason: "keys must be non-negative integers".to_string(),
                })?;
                Ok((idx, label.clone()))
            })
            .collect()
    }
}

/// Fluent builder for detector configurations
#[derive(Debug, Default)]
pub struct DetectorConfigBuilder {
    config: DetectorConfig,
}

impl DetectorConfigBuilder {
    /// Create a new builder seeded with the defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the architecture name
    #[must_use]
    pub fn architecture<S: Into<String>>(mut self, name: S) -> Self {
        self.config.architecture = name.into();
        self
    }

    /// Set the number of output classes
    #[must_use]
    pub const fn num_classes(mut self, num_classes: usize) -> Self {
        self.config.num_classes = num_classes;
        self
    }

    /// Set the input image size
    #[must_use]
    pub const fn image_size(mut self, image_size: usize) -> Self {
        self.config.image_size = image_size;
        self
    }

    /// Set the classifier head dropout rate
    #[must_use]
    pub const fn drop_rate(mut self, drop_rate: f32) -> Self {
        self.config.drop_rate = drop_rate;
        self
    }

    /// Set the class index → label mapping
    #[must_use]
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        self.config.idx_to_class = labels
            .into_iter()
            .map(|(idx, label)| (idx.to_string(), label.into()))
            .collect();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> DetectorResult<DetectorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn validate_architecture(name: &str) -> Result<(), ValidationError> {
    if model::is_known_architecture(name) {
        Ok(())
    } else {
        Err(ValidationError::new("Unknown architecture"))
    }
}

fn validate_std(std: &[f32]) -> Result<(), ValidationError> {
    if std.iter().all(|&v| v > 0.0) {
        Ok(())
    } else {
        Err(ValidationError::new("Std values must be positive"))
    }
}
