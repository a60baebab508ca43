//! # Veridect Backend - Main Entry Point
//!
//! REST API server for the Veridect AI-vs-real image detector.

use clap::Parser;
use veridect_backend::BackendCliOptions;
use veridect_shared::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let options = BackendCliOptions::parse();
    options.logging.init_logging();
    options.run().await
}
