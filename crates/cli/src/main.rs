//! # Veridect - Main Entry Point
//!
//! Unified command-line interface for the Veridect detector.

use clap::Parser;
use veridect_cli::Cli;
use veridect_shared::Result;

#[tokio::main]
async fn main() -> Result<()> {
    Cli::parse().run().await
}
