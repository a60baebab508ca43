//! Backend configuration management

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use veridect_shared::Result;

/// Default maximum request body size (base64 inflates images by ~33%)
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Configuration for the backend server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Address to bind the backend server to
    pub listen_addr: SocketAddr,
    /// Path to the model checkpoint file
    pub model_path: PathBuf,
    /// Optional explicit path to the detector config JSON
    pub config_path: Option<PathBuf>,
    /// GPU device ID (-1 for CPU)
    pub device_id: i32,
    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
    /// Service name used in logs and the root endpoint
    pub service_name: String,
}

impl Default for BackendConfig {
    /// Creates a default backend configuration with sensible defaults
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".parse().expect("default address is valid"),
            model_path: PathBuf::from("model.safetensors"),
            config_path: None,
            device_id: -1,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            service_name: "veridect-backend".to_string(),
        }
    }
}

impl BackendConfig {
    /// Creates configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("VERIDECT_LISTEN_ADDR") {
            config.listen_addr = addr.parse().map_err(|e| {
                veridect_shared::VeridectError::configuration(format!(
                    "invalid VERIDECT_LISTEN_ADDR {addr:?}: {e}"
                ))
            })?;
        }
        if let Ok(path) = std::env::var("VERIDECT_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("VERIDECT_CONFIG_PATH") {
            config.config_path = Some(PathBuf::from(path));
        }
        if let Ok(device_id) = std::env::var("VERIDECT_DEVICE_ID") {
            config.device_id = device_id.parse().map_err(|e| {
                veridect_shared::VeridectError::configuration(format!(
                    "invalid VERIDECT_DEVICE_ID {device_id:?}: {e}"
                ))
            })?;
        }
        if let Ok(name) = std::env::var("VERIDECT_SERVICE_NAME") {
            config.service_name = name;
        }

        Ok(config)
    }
}
