//! CLI options for the Veridect backend
//!
//! Used both by the standalone `veridect-backend` binary and flattened
//! into the unified `veridect` CLI.

use crate::config::{BackendConfig, DEFAULT_MAX_BODY_BYTES};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use veridect_shared::{LoggingOptions, Result};

/// Veridect Backend - AI-vs-real image detection server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct BackendCliOptions {
    /// Address to listen on
    #[arg(
        short,
        long,
        default_value = "0.0.0.0:8000",
        env = "VERIDECT_LISTEN_ADDR"
    )]
    pub listen_addr: SocketAddr,

    /// Path to the model checkpoint file
    #[arg(
        short,
        long,
        default_value = "model.safetensors",
        env = "VERIDECT_MODEL_PATH"
    )]
    pub model_path: PathBuf,

    /// Explicit path to the detector config JSON (defaults to a
    /// config.json next to the checkpoint)
    #[arg(long, env = "VERIDECT_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// GPU device ID to use (-1 for CPU)
    #[arg(long, default_value_t = -1, env = "VERIDECT_DEVICE_ID")]
    pub device_id: i32,

    /// Maximum accepted request body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES, env = "VERIDECT_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Service name used in logs
    #[arg(long, env = "VERIDECT_SERVICE_NAME")]
    pub service_name: Option<String>,

    #[command(flatten)]
    pub logging: LoggingOptions,
}

impl BackendCliOptions {
    /// Run the backend server with the configured options
    pub async fn run(self) -> Result<()> {
        let config = self.to_config();

        info!(
            listen_addr = %config.listen_addr,
            model_path = ?config.model_path,
            device_id = config.device_id,
            "Backend server starting"
        );

        crate::serve(config).await
    }

    /// Convert CLI options to a BackendConfig
    pub fn to_config(&self) -> BackendConfig {
        BackendConfig {
            listen_addr: self.listen_addr,
            model_path: self.model_path.clone(),
            config_path: self.config_path.clone(),
            device_id: self.device_id,
            max_body_bytes: self.max_body_bytes,
            service_name: self
                .service_name
                .clone()
                .unwrap_or_else(|| "veridect-backend".to_string()),
        }
    }
}
