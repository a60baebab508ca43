//! # Veridect Inference
//!
//! Checkpoint loading, preprocessing and inference for the Veridect
//! AI-vs-real image detector.
//!
//! ## Features
//!
//! - **Checkpoint loading**: safetensors weights with parameter-name
//!   reconciliation across training-wrapper prefixes
//! - **Deterministic preprocessing**: fixed resize + normalize pipeline
//!   driven by the detector config
//! - **Inference service**: one loaded model behind a `predict` call,
//!   shared read-only across requests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use veridect_inference::{Detector, ImageInput};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let detector = Detector::load(Path::new("model.safetensors"), None, -1)?;
//!     let predictions = detector.predict(ImageInput::Base64("...".to_string()))?;
//!     println!("{}: {:.2}", predictions[0].label, predictions[0].score);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]

pub mod checkpoint;
pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod preprocess;

pub use checkpoint::{key_candidates, Checkpoint, CheckpointMetadata, LoadReport};
pub use config::{DetectorConfig, DetectorConfigBuilder};
pub use detector::{
    device_name, select_device, Detector, DetectorStats, HealthReport, ImageInput,
};
pub use error::{ConfigError, DetectorError, DetectorResult};
pub use model::{create_model, is_known_architecture, Classifier};

pub use veridect_shared::Prediction;
