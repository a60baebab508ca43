//! Error types for the Veridect inference crate

use thiserror::Error;
use veridect_shared::ErrorResponse;

/// Result type for detector operations
pub type DetectorResult<T> = Result<T, DetectorError>;

/// Main error type for detector operations
#[derive(Error, Debug)]
pub enum DetectorError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Invalid request input (bad base64, missing fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The input bytes could not be decoded as an image
    #[error("Image decoding failed: {0}")]
    ImageDecode(String),

    /// Checkpoint format is incompatible with the model
    #[error("Checkpoint incompatible: {0}")]
    CheckpointIncompatible(String),

    /// Model construction or weight loading failed
    #[error("Model operation failed: {0}")]
    Model(String),

    /// Forward pass or postprocessing failed
    #[error("Inference failed: {0}")]
    Inference(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required configuration field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid configuration value provided
    #[error("Invalid value for {field}: {value} (reason: {reason})")]
    InvalidValue {
        /// Configuration field name
        field: String,
        /// Invalid value provided
        value: String,
        /// Reason why value is invalid
        reason: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// File read/write error
    #[error("File read error: {0}")]
    FileRead(String),

    /// Configuration parsing error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<base64::DecodeError> for DetectorError {
    fn from(err: base64::DecodeError) -> Self {
        Self::InvalidInput(format!("invalid base64 image data: {err}"))
    }
}

impl From<image::ImageError> for DetectorError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageDecode(err.to_string())
    }
}

impl From<candle_core::Error> for DetectorError {
    fn from(err: candle_core::Error) -> Self {
        Self::Inference(format!("tensor operation failed: {err}"))
    }
}

impl From<validator::ValidationErrors> for DetectorError {
    fn from(err: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error
                            .message
                            .as_ref()
                            .unwrap_or(&std::borrow::Cow::Borrowed("validation error"))
                    )
                })
            })
            .collect();

        Self::Configuration(ConfigError::ValidationFailed(messages.join(", ")))
    }
}

/// HTTP status code mapping for API responses
impl DetectorError {
    /// Convert error to the appropriate HTTP status code
    #[must_use]
    pub const fn to_status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) | Self::ImageDecode(_) => 400,
            Self::Configuration(_) => 400,
            Self::CheckpointIncompatible(_) => 422,
            _ => 500,
        }
    }

    /// Get user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => format!("Invalid request: {msg}"),
            Self::ImageDecode(msg) => format!("Could not decode image: {msg}"),
            Self::CheckpointIncompatible(_) => {
                "The model checkpoint is incompatible with this service.".to_string()
            }
            Self::Configuration(err) => format!("Invalid configuration: {err}"),
            _ => "An internal error occurred.".to_string(),
        }
    }

    /// Error type tag used in structured error payloads
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::InvalidInput(_) => "validation_error",
            Self::ImageDecode(_) => "image_error",
            Self::CheckpointIncompatible(_) | Self::Model(_) => "model_error",
            Self::Inference(_) => "inference_error",
            Self::Io(_) | Self::Serialization(_) => "internal_error",
        }
    }
}

impl From<&DetectorError> for ErrorResponse {
    fn from(err: &DetectorError) -> Self {
        ErrorResponse::new(err.type_tag(), err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            DetectorError::InvalidInput("test".to_string()).to_status_code(),
            400
        );
        assert_eq!(
            DetectorError::ImageDecode("truncated".to_string()).to_status_code(),
            400
        );
        assert_eq!(
            DetectorError::CheckpointIncompatible("no match".to_string()).to_status_code(),
            422
        );
        assert_eq!(
            DetectorError::Inference("nan".to_string()).to_status_code(),
            500
        );
    }

    #[test]
    fn test_user_messages() {
        let err = DetectorError::InvalidInput("missing image field".to_string());
        assert_eq!(err.user_message(), "Invalid request: missing image field");

        let err = DetectorError::Inference("shape".to_string());
        assert_eq!(err.user_message(), "An internal error occurred.");
    }

    #[test]
    fn test_error_response_conversion() {
        let err = DetectorError::ImageDecode("not a PNG".to_string());
        let response = ErrorResponse::from(&err);
        assert_eq!(response.error.r#type, "image_error");
        assert!(!response.error.message.is_empty());
    }
}
