//! Detector Service Tests
//!
//! Tests the predict path end to end: input normalization, preprocessing,
//! forward pass, softmax and label mapping.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use candle_core::Device;
use image::{Rgb, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;
use veridect_inference::{
    Detector, DetectorConfig, DetectorConfigBuilder, DetectorError, ImageInput,
};

fn small_config() -> DetectorConfig {
    DetectorConfigBuilder::new()
        .architecture("convdet_s0")
        .image_size(64)
        .build()
        .unwrap()
}

fn test_detector() -> Detector {
    Detector::untrained(small_config(), Device::Cpu).unwrap()
}

fn png_bytes(color: [u8; 3], size: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(size, size, Rgb(color));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageOutputFormat::Png)
        .unwrap();
    bytes
}

fn png_base64(color: [u8; 3], size: u32) -> String {
    BASE64.encode(png_bytes(color, size))
}

#[test]
fn test_predict_returns_probability_distribution() {
    let detector = test_detector();
    let predictions = detector
        .predict(ImageInput::Base64(png_base64([255, 0, 0], 64)))
        .unwrap();

    assert_eq!(predictions.len(), 2);
    let sum: f32 = predictions.iter().map(|p| p.score).sum();
    assert!((sum - 1.0).abs() < 0.01, "scores sum to {sum}");
    assert!(predictions[0].score >= predictions[1].score);
    for prediction in &predictions {
        assert!(["AI", "REAL"].contains(&prediction.label.as_str()));
    }
}

#[test]
fn test_predict_is_deterministic() {
    let detector = test_detector();
    let first = detector
        .predict(ImageInput::Base64(png_base64([12, 200, 7], 64)))
        .unwrap();
    let second = detector
        .predict(ImageInput::Base64(png_base64([12, 200, 7], 64)))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_data_url_prefix_is_stripped() {
    let detector = test_detector();
    let data_url = format!("data:image/png;base64,{}", png_base64([0, 0, 255], 64));
    let predictions = detector.predict(ImageInput::Base64(data_url)).unwrap();
    assert_eq!(predictions.len(), 2);
}

#[test]
fn test_json_mapping_input() {
    let detector = test_detector();
    let payload = serde_json::json!({ "image": png_base64([9, 9, 9], 64) });
    let predictions = detector.predict(ImageInput::Json(payload)).unwrap();
    assert_eq!(predictions.len(), 2);

    let missing = serde_json::json!({ "picture": "abc" });
    assert!(matches!(
        detector.predict(ImageInput::Json(missing)),
        Err(DetectorError::InvalidInput(_))
    ));
}

#[test]
fn test_raw_bytes_and_decoded_inputs() {
    let detector = test_detector();
    let bytes = png_bytes([77, 1, 130], 48);

    let from_bytes = detector.predict(ImageInput::Bytes(bytes.clone())).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    let from_decoded = detector.predict(ImageInput::Decoded(decoded)).unwrap();
    assert_eq!(from_bytes, from_decoded);
}

#[test]
fn test_invalid_base64_is_an_input_error() {
    let detector = test_detector();
    let result = detector.predict(ImageInput::Base64("!!! not base64 !!!".to_string()));
    assert!(matches!(result, Err(DetectorError::InvalidInput(_))));
}

#[test]
fn test_corrupt_image_is_a_decode_error() {
    let detector = test_detector();
    let garbage = BASE64.encode(b"valid base64, invalid image");
    let result = detector.predict(ImageInput::Base64(garbage));
    assert!(matches!(result, Err(DetectorError::ImageDecode(_))));
}

#[test]
fn test_batch_preserves_order_and_isolates_failures() {
    let detector = test_detector();
    let results = detector.predict_batch(vec![
        ImageInput::Base64(png_base64([255, 0, 0], 64)),
        ImageInput::Base64("broken".to_string()),
        ImageInput::Base64(png_base64([0, 255, 0], 64)),
    ]);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
}

#[test]
fn test_missing_label_falls_back_to_synthetic_name() {
    let config = DetectorConfig {
        architecture: "convdet_s0".to_string(),
        image_size: 64,
        idx_to_class: BTreeMap::from([("0".to_string(), "ai".to_string())]),
        ..Default::default()
    };
    let detector = Detector::untrained(config, Device::Cpu).unwrap();

    let predictions = detector
        .predict(ImageInput::Base64(png_base64([1, 2, 3], 64)))
        .unwrap();
    let labels: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
    assert!(labels.contains(&"AI"));
    assert!(labels.contains(&"CLASS_1"));
}

#[test]
fn test_health_report() {
    let detector = test_detector();
    let health = detector.health();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.device, "cpu");
    assert!(!health.model_loaded);
}

#[test]
fn test_stats_count_requests_and_errors() {
    let detector = test_detector();
    detector
        .predict(ImageInput::Base64(png_base64([5, 5, 5], 64)))
        .unwrap();
    let _ = detector.predict(ImageInput::Base64("broken".to_string()));

    let stats = detector.stats();
    assert_eq!(stats.metrics.total_requests, 2);
    assert_eq!(stats.metrics.total_errors, 1);
}
