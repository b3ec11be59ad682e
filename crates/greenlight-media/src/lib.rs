//! Vehicle detection and image annotation.
//!
//! This crate provides:
//! - A `DetectionProvider` seam with an ONNX Runtime YOLO implementation
//! - Class-name table loading from a YOLO dataset `data.yaml`
//! - Bounding-box and summary annotation of result images
//! - The detect → count → annotate pipeline used by the upload workflow

pub mod annotate;
pub mod class_names;
pub mod detector;
pub mod error;
pub mod pipeline;

pub use annotate::{Annotator, LabelFont};
pub use class_names::load_class_names;
pub use detector::{DetectionProvider, OnnxDetector, OnnxDetectorConfig};
pub use error::{MediaError, MediaResult};
pub use pipeline::{analyze_image, ImageAnalysis};
