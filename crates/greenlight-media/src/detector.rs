//! Vehicle detection using a YOLO ONNX model.
//!
//! The model is an opaque external capability behind [`DetectionProvider`].
//! [`OnnxDetector`] runs a YOLOv8/YOLO11-style export with ONNX Runtime and
//! picks an execution provider automatically:
//! - CUDA on Linux with NVIDIA GPU (when `cuda` feature enabled)
//! - CoreML on macOS
//! - CPU fallback on all platforms

use std::path::Path;
use std::sync::Mutex;

use greenlight_models::{BoundingBox, ClassNames, Detection};
use image::{DynamicImage, GenericImageView};
use ndarray::Array;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Source of detections for a single image.
pub trait DetectionProvider: Send + Sync {
    /// Detect objects in an image.
    ///
    /// Boxes are in pixel coordinates of `image`.
    fn detect(&self, image: &DynamicImage) -> MediaResult<Vec<Detection>>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Configuration for the ONNX detector.
#[derive(Debug, Clone)]
pub struct OnnxDetectorConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Confidence threshold for detections
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
    /// Input image size (model expects square input)
    pub input_size: u32,
}

impl Default for OnnxDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: "models/clean_traffic_model.onnx".to_string(),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            input_size: 640,
        }
    }
}

/// Raw candidate before class lookup.
#[derive(Debug, Clone)]
struct Candidate {
    bbox: BoundingBox,
    class_id: usize,
    confidence: f32,
}

/// Vehicle detector backed by an ONNX Runtime session.
///
/// Loaded once at startup and shared between requests.
pub struct OnnxDetector {
    session: Mutex<Session>,
    class_names: ClassNames,
    config: OnnxDetectorConfig,
}

impl OnnxDetector {
    /// Create a new detector from config and the model's class table.
    ///
    /// Returns error if model file doesn't exist or cannot be loaded.
    pub fn new(config: OnnxDetectorConfig, class_names: ClassNames) -> MediaResult<Self> {
        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            return Err(MediaError::model_not_found(&config.model_path));
        }

        let session = Mutex::new(create_session(model_path)?);
        info!(
            model_path = %config.model_path,
            input_size = config.input_size,
            classes = class_names.len(),
            "Vehicle detector initialized"
        );

        Ok(Self {
            session,
            class_names,
            config,
        })
    }

    /// Preprocess image for YOLO inference.
    ///
    /// - Resize to model input size
    /// - Normalize pixel values to [0, 1]
    /// - Convert to NCHW format (batch, channels, height, width)
    fn preprocess(&self, img: &DynamicImage) -> MediaResult<Value> {
        let input_size = self.config.input_size;

        let resized = img.resize_exact(
            input_size,
            input_size,
            image::imageops::FilterType::Triangle,
        );

        let rgb = resized.to_rgb8();
        let (w, h) = (input_size as usize, input_size as usize);

        let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);
        for c in 0..3 {
            for y in 0..h {
                for x in 0..w {
                    let pixel = rgb.get_pixel(x as u32, y as u32);
                    chw_data.push(pixel[c] as f32 / 255.0);
                }
            }
        }

        let shape = vec![1usize, 3, h, w];
        Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::inference(format!("Failed to create tensor: {}", e)))
    }

    /// Run ONNX inference.
    fn run_inference(&self, input: Value) -> MediaResult<Vec<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::inference("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| MediaError::inference(format!("ONNX inference failed: {}", e)))?;

        // Output layout is [1, 4 + num_classes, num_anchors]
        let output = outputs
            .get("output0")
            .ok_or_else(|| MediaError::inference("Missing output0 tensor"))?;

        let tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::inference(format!("Failed to extract tensor: {}", e)))?;

        Ok(tensor.1.to_vec())
    }

    /// Parse raw YOLO output into pixel-space candidates.
    fn postprocess(
        &self,
        outputs: &[f32],
        orig_width: u32,
        orig_height: u32,
    ) -> MediaResult<Vec<Candidate>> {
        decode_yolo_output(
            outputs,
            self.class_names.len(),
            self.config.input_size,
            (orig_width, orig_height),
            self.config.confidence_threshold,
        )
        .map(|candidates| non_maximum_suppression(candidates, self.config.nms_threshold))
    }
}

impl DetectionProvider for OnnxDetector {
    fn detect(&self, image: &DynamicImage) -> MediaResult<Vec<Detection>> {
        let (width, height) = image.dimensions();
        let input = self.preprocess(image)?;
        let outputs = self.run_inference(input)?;
        let candidates = self.postprocess(&outputs, width, height)?;

        let detections = candidates
            .into_iter()
            .map(|c| {
                let label = self.class_names.label(c.class_id)?;
                Ok(Detection::new(label, c.confidence, c.bbox))
            })
            .collect::<MediaResult<Vec<_>>>()?;

        debug!(count = detections.len(), "Vehicle detection completed");

        Ok(detections)
    }

    fn name(&self) -> &'static str {
        "onnx-yolo"
    }
}

/// Decode a `[1, 4 + num_classes, num_anchors]` YOLO tensor.
///
/// Each anchor column holds `cx, cy, w, h` in model-input pixels followed by
/// one score per class.
fn decode_yolo_output(
    outputs: &[f32],
    num_classes: usize,
    input_size: u32,
    (orig_width, orig_height): (u32, u32),
    confidence_threshold: f32,
) -> MediaResult<Vec<Candidate>> {
    let num_features = 4 + num_classes;
    if num_classes == 0 || outputs.len() % num_features != 0 {
        return Err(MediaError::inference(format!(
            "Unexpected output size {} for {} classes",
            outputs.len(),
            num_classes
        )));
    }
    let num_boxes = outputs.len() / num_features;

    // [features, boxes] -> view as [boxes, features]
    let output_array = Array::from_shape_vec((num_features, num_boxes), outputs.to_vec())
        .map_err(|e| MediaError::inference(format!("Failed to reshape output: {}", e)))?;
    let transposed = output_array.t();

    let input_size = input_size as f32;
    let scale_w = orig_width as f32 / input_size;
    let scale_h = orig_height as f32 / input_size;

    let mut candidates = Vec::new();
    for i in 0..num_boxes {
        let mut best_class = 0;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..num_classes {
            let score = transposed[[i, 4 + c]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_score < confidence_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(
            transposed[[i, 0]] * scale_w,
            transposed[[i, 1]] * scale_h,
            transposed[[i, 2]] * scale_w,
            transposed[[i, 3]] * scale_h,
        )
        .clamp_to(orig_width, orig_height);

        candidates.push(Candidate {
            bbox,
            class_id: best_class,
            confidence: best_score,
        });
    }

    Ok(candidates)
}

/// Class-aware Non-Maximum Suppression.
fn non_maximum_suppression(mut detections: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in detections {
        let overlaps = keep.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !overlaps {
            keep.push(candidate);
        }
    }
    keep
}

/// Create ONNX Runtime session with automatic execution provider selection.
fn create_session(model_path: &Path) -> MediaResult<Session> {
    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| MediaError::inference(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::inference(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for vehicle detection");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!("Using CoreML execution provider for vehicle detection");
                return Ok(session);
            }
        }
        debug!("CoreML execution provider not available, using CPU");
    }

    info!("Using CPU execution provider for vehicle detection");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| MediaError::inference(format!("Failed to load ONNX model: {}", e)))
}
