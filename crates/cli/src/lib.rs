//! # Veridect CLI
//!
//! Unified command interface for the Veridect detector: serve the REST
//! API, classify a local image as a test harness, or query a running
//! server.

pub mod cli_options;
pub mod commands;

pub use cli_options::{Cli, Commands, PredictOptions, RemoteOptions};
