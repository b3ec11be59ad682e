//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;

use greenlight_models::GreenTimePolicy;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory uploaded images are stored in
    pub upload_dir: PathBuf,
    /// Directory annotated images are written to
    pub result_dir: PathBuf,
    /// ONNX detection model
    pub model_path: String,
    /// YOLO dataset `data.yaml` holding the class names
    pub class_names_path: PathBuf,
    /// TrueType font used for image captions
    pub font_path: PathBuf,
    /// Minimum confidence for a detection to be counted
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
    /// Square model input size
    pub model_input_size: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Green-time heuristic constants
    pub timing: GreenTimePolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            result_dir: PathBuf::from("static/results"),
            model_path: "models/clean_traffic_model.onnx".to_string(),
            class_names_path: PathBuf::from("vehicle-detection.v21i.yolov11/data.yaml"),
            font_path: PathBuf::from("assets/fonts/DejaVuSans.ttf"),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            model_input_size: 640,
            max_body_size: 16 * 1024 * 1024, // 16MB
            timing: GreenTimePolicy::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timing = defaults.timing;

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            upload_dir: env_or("UPLOAD_DIR", defaults.upload_dir),
            result_dir: env_or("RESULT_DIR", defaults.result_dir),
            model_path: std::env::var("MODEL_PATH").unwrap_or(defaults.model_path),
            class_names_path: env_or("CLASS_NAMES_PATH", defaults.class_names_path),
            font_path: env_or("FONT_PATH", defaults.font_path),
            confidence_threshold: env_or("CONFIDENCE_THRESHOLD", defaults.confidence_threshold),
            nms_threshold: env_or("NMS_THRESHOLD", defaults.nms_threshold),
            model_input_size: env_or("MODEL_INPUT_SIZE", defaults.model_input_size),
            max_body_size: env_or("MAX_BODY_SIZE", defaults.max_body_size),
            timing: GreenTimePolicy {
                base_time: env_or("GREEN_BASE_TIME", timing.base_time),
                time_per_car: env_or("GREEN_TIME_PER_CAR", timing.time_per_car),
                time_per_motorcycle: env_or("GREEN_TIME_PER_MOTORCYCLE", timing.time_per_motorcycle),
                min_time: env_or("GREEN_MIN_TIME", timing.min_time),
                max_time: env_or("GREEN_MAX_TIME", timing.max_time),
                previous_time: env_or("GREEN_PREVIOUS_TIME", timing.previous_time),
            },
        }
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
