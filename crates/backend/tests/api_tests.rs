//! API Tests
//!
//! Exercises the REST routes end to end against an in-process router with
//! an untrained detector (the HTTP contract does not depend on weights).

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use candle_core::Device;
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;
use veridect_backend::router;
use veridect_inference::{Detector, DetectorConfigBuilder};

fn test_app() -> Router {
    let config = DetectorConfigBuilder::new()
        .architecture("convdet_s0")
        .image_size(64)
        .build()
        .unwrap();
    let detector = Detector::untrained(config, Device::Cpu).unwrap();
    router(Arc::new(detector), 4 * 1024 * 1024)
}

fn png_bytes(color: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(64, 64, Rgb(color));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn png_base64(color: [u8; 3]) -> String {
    BASE64.encode(png_bytes(color))
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, content_type: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "veridect-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_root_returns_service_metadata() {
    let response = test_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["model"], "convdet_s0");
    assert_eq!(body["device"], "cpu");
    assert!(body["endpoints"]["POST /predict"].is_string());
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["api"], "online");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["device"], "cpu");
}

#[tokio::test]
async fn test_metrics_counts_requests() {
    let app = test_app();

    let request = json_request(
        "/predict",
        serde_json::json!({ "image": png_base64([4, 4, 4]) }),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total_requests"], 1);
    assert_eq!(body["total_errors"], 0);
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_predict_returns_sorted_distribution() {
    let request = json_request(
        "/predict",
        serde_json::json!({ "image": png_base64([255, 0, 0]) }),
    );
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let predictions = body["predictions"].as_array().unwrap();
    assert_eq!(predictions.len(), 2);

    let sum: f64 = predictions
        .iter()
        .map(|p| p["score"].as_f64().unwrap())
        .sum();
    assert!((sum - 1.0).abs() < 0.01);

    assert_eq!(body["top_prediction"], predictions[0]["label"]);
    assert_eq!(body["confidence"], predictions[0]["score"]);
    assert!(
        predictions[0]["score"].as_f64().unwrap() >= predictions[1]["score"].as_f64().unwrap()
    );
}

#[tokio::test]
async fn test_predict_top_only() {
    let request = json_request(
        "/predict",
        serde_json::json!({ "image": png_base64([0, 255, 0]), "return_all_scores": false }),
    );
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["predictions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_predict_rejects_bad_base64() {
    let request = json_request("/predict", serde_json::json!({ "image": "%%% nope %%%" }));
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_batch_over_cap_is_rejected() {
    let images: Vec<String> = (0..11).map(|_| png_base64([1, 2, 3])).collect();
    let request = json_request("/predict/batch", serde_json::json!({ "images": images }));
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_batch_preserves_input_order() {
    let request = json_request(
        "/predict/batch",
        serde_json::json!({
            "images": [png_base64([255, 0, 0]), "broken base64", png_base64([0, 0, 255])]
        }),
    );
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0]["top_prediction"].is_string());
    assert!(results[1]["error"].is_string());
    assert!(results[2]["top_prediction"].is_string());
}

#[tokio::test]
async fn test_batch_at_cap_succeeds() {
    let images: Vec<String> = (0..10).map(|_| png_base64([9, 9, 9])).collect();
    let request = json_request("/predict/batch", serde_json::json!({ "images": images }));
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_upload_rejects_non_image_content_type() {
    let request = multipart_request("/predict/upload", "text/plain", "notes.txt", b"hello");
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_classifies_image_file() {
    let request = multipart_request("/predict/upload", "image/png", "red.png", &png_bytes([255, 0, 0]));
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["filename"], "red.png");
    assert_eq!(body["predictions"].as_array().unwrap().len(), 2);
    assert!(body["top_prediction"].is_string());
}
