//! Shared error handling for Veridect components
//!
//! Component-level errors (configuration, network, internal) used by the
//! binaries. The inference crate carries its own richer taxonomy for
//! per-request failures; this type covers startup and transport concerns.

use thiserror::Error;

/// Result type alias for Veridect operations
pub type Result<T> = std::result::Result<T, VeridectError>;

/// Error types for Veridect component operations
#[derive(Error, Debug)]
pub enum VeridectError {
    /// Configuration validation errors
    ///
    /// Raised during component startup when the provided configuration is
    /// invalid. Fix the configuration and restart.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// Optional source error for additional context
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Network-level connectivity errors
    #[error("Network error connecting to {target}: {message}")]
    Network {
        /// Target address that failed to connect
        target: String,
        /// Descriptive error message
        message: String,
        /// Underlying network error for debugging
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal errors that do not fit the other categories
    #[error("Internal error: {message}")]
    Internal {
        /// Descriptive error message
        message: String,
        /// Optional source error for additional context
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl VeridectError {
    /// Creates a configuration error from a message
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a network error for the given target
    pub fn network(
        target: impl Into<String>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            target: target.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates an internal error from a message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

impl From<std::io::Error> for VeridectError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("IO error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}
