//! Shared CLI functionality for Veridect components
//!
//! Common CLI options used by both the backend binary and the unified
//! `veridect` CLI, to keep flag names and logging behavior consistent.

use clap::Args;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Common logging options shared across all components
#[derive(Args, Debug, Clone)]
pub struct LoggingOptions {
    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "VERIDECT_LOG_LEVEL")]
    pub log_level: String,
}

impl LoggingOptions {
    /// Initialize logging with the configured level
    pub fn init_logging(&self) {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(self.parse_log_level())
            .with_target(true)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set logging subscriber");
    }

    /// Parse the log level string into a tracing Level
    pub fn parse_log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "error" => Level::ERROR,
            "warn" => Level::WARN,
            "info" => Level::INFO,
            "debug" => Level::DEBUG,
            "trace" => Level::TRACE,
            _ => Level::INFO,
        }
    }
}
