//! CLI options for the unified Veridect command-line interface

use crate::commands;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use veridect_backend::BackendCliOptions;
use veridect_shared::{LoggingOptions, Result};

/// Veridect - AI-vs-real image detection
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available Veridect commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the backend API server
    Serve(BackendCliOptions),

    /// Classify a local image file
    Predict(PredictOptions),

    /// Check the health of a running server
    Health(RemoteOptions),

    /// Show metadata of a running server
    Info(RemoteOptions),
}

/// Options for the `predict` test harness
#[derive(Args, Debug)]
pub struct PredictOptions {
    /// Path to the image to classify
    pub image: PathBuf,

    /// Predict against a running server instead of loading the model locally
    #[arg(long, env = "VERIDECT_API_URL")]
    pub url: Option<String>,

    /// Optional API key for remote prediction
    #[arg(long, env = "VERIDECT_API_KEY")]
    pub api_key: Option<String>,

    /// Path to the model checkpoint file (local prediction)
    #[arg(
        short,
        long,
        default_value = "model.safetensors",
        env = "VERIDECT_MODEL_PATH"
    )]
    pub model_path: PathBuf,

    /// Explicit path to the detector config JSON (local prediction)
    #[arg(long, env = "VERIDECT_CONFIG_PATH")]
    pub config_path: Option<PathBuf>,

    /// GPU device ID to use (-1 for CPU)
    #[arg(long, default_value_t = -1, env = "VERIDECT_DEVICE_ID")]
    pub device_id: i32,

    #[command(flatten)]
    pub logging: LoggingOptions,
}

/// Options for commands that talk to a running server
#[derive(Args, Debug)]
pub struct RemoteOptions {
    /// Base URL of the running server
    #[arg(
        long,
        default_value = "http://127.0.0.1:8000",
        env = "VERIDECT_API_URL"
    )]
    pub url: String,

    /// Optional API key
    #[arg(long, env = "VERIDECT_API_KEY")]
    pub api_key: Option<String>,

    #[command(flatten)]
    pub logging: LoggingOptions,
}

impl Cli {
    /// Run the selected command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve(opts) => {
                opts.logging.init_logging();
                opts.run().await
            }
            Commands::Predict(opts) => {
                opts.logging.init_logging();
                commands::predict(opts).await
            }
            Commands::Health(opts) => {
                opts.logging.init_logging();
                commands::health(opts).await
            }
            Commands::Info(opts) => {
                opts.logging.init_logging();
                commands::info(opts).await
            }
        }
    }
}
