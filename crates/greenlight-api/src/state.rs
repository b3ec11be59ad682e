//! Application state.

use std::sync::Arc;

use greenlight_media::{
    load_class_names, Annotator, DetectionProvider, LabelFont, MediaError, OnnxDetector,
    OnnxDetectorConfig,
};
use greenlight_models::ModelError;
use greenlight_storage::{LocalStore, StorageError};
use thiserror::Error;

use crate::config::ApiConfig;

/// Failures while building the state at process start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ModelError),

    #[error("failed to load detection resources: {0}")]
    Media(#[from] MediaError),

    #[error("failed to prepare image store: {0}")]
    Storage(#[from] StorageError),
}

/// Shared application state.
///
/// Built once at startup; the model, class table and font are never reloaded.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detector: Arc<dyn DetectionProvider>,
    pub annotator: Arc<Annotator>,
    pub store: Arc<LocalStore>,
}

impl AppState {
    /// Create new application state, loading the model and resources from disk.
    pub fn new(config: ApiConfig) -> Result<Self, StartupError> {
        config.timing.validate()?;

        let store = LocalStore::open(&config.upload_dir, &config.result_dir)?;
        let class_names = load_class_names(&config.class_names_path)?;
        let detector = OnnxDetector::new(
            OnnxDetectorConfig {
                model_path: config.model_path.clone(),
                confidence_threshold: config.confidence_threshold,
                nms_threshold: config.nms_threshold,
                input_size: config.model_input_size,
            },
            class_names,
        )?;
        let annotator = Annotator::new(LabelFont::from_path(&config.font_path)?);

        Ok(Self::from_parts(config, Arc::new(detector), annotator, store))
    }

    /// Assemble state from already-built components.
    pub fn from_parts(
        config: ApiConfig,
        detector: Arc<dyn DetectionProvider>,
        annotator: Annotator,
        store: LocalStore,
    ) -> Self {
        Self {
            config,
            detector,
            annotator: Arc::new(annotator),
            store: Arc::new(store),
        }
    }
}
