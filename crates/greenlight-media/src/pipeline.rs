//! Detect → count → annotate for a single stored image.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use greenlight_models::{count_detections, filter_confident, CountSummary, Detection};
use image::{DynamicImage, ImageReader};
use tracing::info;

use crate::annotate::Annotator;
use crate::detector::DetectionProvider;
use crate::error::{MediaError, MediaResult};

/// Outcome of analyzing one image.
#[derive(Debug, Clone)]
pub struct ImageAnalysis {
    pub counts: CountSummary,
    /// Detections at or above the confidence threshold
    pub detections: Vec<Detection>,
    pub result_path: PathBuf,
    pub detection_time: Duration,
}

/// Run detection on `input_path`, count vehicles, and write the annotated
/// copy to `output_path`.
///
/// Blocking; callers on an async runtime should use `spawn_blocking`.
pub fn analyze_image(
    provider: &dyn DetectionProvider,
    annotator: &Annotator,
    input_path: &Path,
    output_path: &Path,
    confidence_threshold: f32,
) -> MediaResult<ImageAnalysis> {
    let image = decode_image(input_path)?;

    let start = Instant::now();
    let raw = provider.detect(&image)?;
    let detection_time = start.elapsed();

    let counts = count_detections(&raw, confidence_threshold)?;
    let detections = filter_confident(&raw, confidence_threshold);
    let result_path = annotator.annotate_to(&image, &detections, &counts, output_path)?;

    info!(
        provider = provider.name(),
        input = %input_path.display(),
        cars = counts.cars,
        motorcycles = counts.motorcycles,
        total = counts.total(),
        detection_ms = detection_time.as_millis() as u64,
        "Image analyzed"
    );

    Ok(ImageAnalysis {
        counts,
        detections,
        result_path,
        detection_time,
    })
}

/// Decode by content; the extension is only a fallback when the magic
/// bytes are unrecognized.
fn decode_image(path: &Path) -> MediaResult<DynamicImage> {
    let decode_err = |message: String| MediaError::ImageDecode {
        path: path.to_path_buf(),
        message,
    };

    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}
