//! # Veridect Client
//!
//! Thin client library for the Veridect detector REST API: encodes local
//! images to base64, issues the HTTP calls and deserializes the typed
//! responses. No retry, no backoff; non-2xx responses are returned as
//! errors unmodified.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use veridect_client::DetectorClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DetectorClient::new("http://127.0.0.1:8000");
//!     let result = client.predict_file("photo.jpg", true).await?;
//!     println!("{} ({:.1}%)", result.top_prediction, result.confidence * 100.0);
//!     Ok(())
//! }
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::DynamicImage;
use reqwest::multipart::{Form, Part};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use veridect_shared::{
    BatchPredictRequest, BatchPredictResponse, HealthResponse, PredictRequest, PredictionResponse,
    ServiceInfo, UploadResponse,
};

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by the client library
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failures and non-2xx responses, propagated unmodified
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A local image could not be encoded
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// A local image in any of the shapes the client can encode
#[derive(Debug)]
pub enum ImageSource {
    /// Path to an image file
    Path(PathBuf),
    /// Raw encoded image bytes
    Bytes(Vec<u8>),
    /// An already-decoded image; re-encoded as PNG before upload
    Image(DynamicImage),
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Image(image)
    }
}

/// Client for the Veridect detector REST API
#[derive(Debug, Clone)]
pub struct DetectorClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl DetectorClient {
    /// Creates a client for the API at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: reqwest::Client::new(),
        }
    }

    /// Attaches a bearer API key to every request
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The normalized base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base64-encodes an image source
    pub fn encode_image(source: ImageSource) -> ClientResult<String> {
        let bytes = match source {
            ImageSource::Path(path) => std::fs::read(path)?,
            ImageSource::Bytes(bytes) => bytes,
            ImageSource::Image(image) => {
                let mut buffer = Vec::new();
                image.write_to(&mut Cursor::new(&mut buffer), image::ImageOutputFormat::Png)?;
                buffer
            }
        };
        Ok(BASE64.encode(bytes))
    }

    /// Classifies a base64-encoded image via `POST /predict`
    pub async fn predict(
        &self,
        image_base64: impl Into<String>,
        return_all_scores: bool,
    ) -> ClientResult<PredictionResponse> {
        let request = PredictRequest {
            image: image_base64.into(),
            return_all_scores,
        };
        let response = self
            .post("/predict")
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Classifies a local image file
    pub async fn predict_file(
        &self,
        path: impl AsRef<Path>,
        return_all_scores: bool,
    ) -> ClientResult<PredictionResponse> {
        let image = Self::encode_image(ImageSource::Path(path.as_ref().to_path_buf()))?;
        self.predict(image, return_all_scores).await
    }

    /// Classifies up to 10 images in one request via `POST /predict/batch`
    pub async fn predict_batch(
        &self,
        images: Vec<ImageSource>,
    ) -> ClientResult<BatchPredictResponse> {
        let images = images
            .into_iter()
            .map(Self::encode_image)
            .collect::<ClientResult<Vec<_>>>()?;
        let response = self
            .post("/predict/batch")
            .json(&BatchPredictRequest { images })
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Uploads an image file via `POST /predict/upload`
    pub async fn predict_upload(&self, path: impl AsRef<Path>) -> ClientResult<UploadResponse> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str(content_type_for(path))?;
        let form = Form::new().part("file", part);

        let response = self
            .post("/predict/upload")
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches the service health via `GET /health`
    pub async fn health(&self) -> ClientResult<HealthResponse> {
        let response = self.get("/health").send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches the service metadata via `GET /`
    pub async fn info(&self) -> ClientResult<ServiceInfo> {
        let response = self.get("/").send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(format!("{}{path}", self.base_url)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = DetectorClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");

        let client = DetectorClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_encode_image_bytes() {
        let encoded = DetectorClient::encode_image(ImageSource::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(encoded, BASE64.encode([1, 2, 3]));
    }

    #[test]
    fn test_encode_decoded_image_produces_png() {
        let image = DynamicImage::new_rgb8(4, 4);
        let encoded = DetectorClient::encode_image(ImageSource::Image(image)).unwrap();
        let decoded = BASE64.decode(encoded).unwrap();
        assert_eq!(&decoded[1..4], b"PNG");
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.webp")), "image/webp");
        assert_eq!(content_type_for(Path::new("a.bin")), "application/octet-stream");
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result =
            DetectorClient::encode_image(ImageSource::Path(PathBuf::from("/nonexistent.png")));
        assert!(matches!(result, Err(ClientError::Io(_))));
    }
}
