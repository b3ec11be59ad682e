//! Result image annotation.
//!
//! Draws one box per detection with a `"<label> <confidence>"` caption and
//! a single summary line in the top-left corner.

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use greenlight_models::{CountSummary, Detection, VehicleClass};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 16.0;
const LABEL_OFFSET: i32 = 10;
const SUMMARY_SCALE: f32 = 28.0;
const SUMMARY_POSITION: (i32, i32) = (10, 10);
const SUMMARY_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// TrueType font used for captions, loaded once at startup.
pub struct LabelFont {
    font: FontVec,
}

impl LabelFont {
    pub fn from_bytes(bytes: Vec<u8>) -> MediaResult<Self> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| MediaError::Font(format!("Invalid font data: {}", e)))?;
        Ok(Self { font })
    }

    pub fn from_path(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| MediaError::Font(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }
}

/// Draws detections and counts onto copies of uploaded images.
pub struct Annotator {
    font: LabelFont,
}

impl Annotator {
    pub fn new(font: LabelFont) -> Self {
        Self { font }
    }

    /// Render an annotated copy of `image`.
    pub fn annotate(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        counts: &CountSummary,
    ) -> RgbImage {
        let mut canvas = image.to_rgb8();

        for detection in detections {
            let color = Rgb(box_color(detection));
            let bbox = detection.bbox;

            let x = bbox.x1.round() as i32;
            let y = bbox.y1.round() as i32;
            let w = bbox.width().round() as u32;
            let h = bbox.height().round() as u32;

            for inset in 0..BOX_THICKNESS {
                let inner_w = w.saturating_sub(2 * inset as u32);
                let inner_h = h.saturating_sub(2 * inset as u32);
                if inner_w == 0 || inner_h == 0 {
                    break;
                }
                let rect = Rect::at(x + inset, y + inset).of_size(inner_w, inner_h);
                draw_hollow_rect_mut(&mut canvas, rect, color);
            }

            let caption = detection.caption();
            let scale = PxScale::from(LABEL_SCALE);
            let (_, text_h) = text_size(scale, &self.font.font, &caption);
            let text_y = (y - LABEL_OFFSET - text_h as i32).max(0);
            draw_text_mut(&mut canvas, color, x, text_y, scale, &self.font.font, &caption);
        }

        draw_text_mut(
            &mut canvas,
            SUMMARY_COLOR,
            SUMMARY_POSITION.0,
            SUMMARY_POSITION.1,
            PxScale::from(SUMMARY_SCALE),
            &self.font.font,
            &counts.summary_line(),
        );

        canvas
    }

    /// Annotate and write to `output_path`; the format follows the extension.
    pub fn annotate_to(
        &self,
        image: &DynamicImage,
        detections: &[Detection],
        counts: &CountSummary,
        output_path: &Path,
    ) -> MediaResult<PathBuf> {
        let annotated = self.annotate(image, detections, counts);
        annotated
            .save(output_path)
            .map_err(|e| MediaError::ImageEncode {
                path: output_path.to_path_buf(),
                message: e.to_string(),
            })?;

        debug!(
            path = %output_path.display(),
            boxes = detections.len(),
            "Annotated image written"
        );

        Ok(output_path.to_path_buf())
    }
}

// Non-car labels share the motorcycle color.
fn box_color(detection: &Detection) -> [u8; 3] {
    match detection.label.parse::<VehicleClass>() {
        Ok(VehicleClass::Car) => VehicleClass::Car.color(),
        _ => VehicleClass::Motorcycle.color(),
    }
}
