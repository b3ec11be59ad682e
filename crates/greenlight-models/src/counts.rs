//! Per-class vehicle counting.

use serde::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::error::ModelResult;
use crate::vehicle::VehicleClass;

/// Vehicle counts for one image.
///
/// The total is always derived from the per-class counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSummary {
    pub cars: u32,
    pub motorcycles: u32,
}

impl CountSummary {
    pub fn new(cars: u32, motorcycles: u32) -> Self {
        Self { cars, motorcycles }
    }

    pub fn total(&self) -> u32 {
        self.cars + self.motorcycles
    }

    pub fn get(&self, class: VehicleClass) -> u32 {
        match class {
            VehicleClass::Car => self.cars,
            VehicleClass::Motorcycle => self.motorcycles,
        }
    }

    fn increment(&mut self, class: VehicleClass) {
        match class {
            VehicleClass::Car => self.cars += 1,
            VehicleClass::Motorcycle => self.motorcycles += 1,
        }
    }

    /// Summary line drawn on annotated images.
    ///
    /// Format: "Total: T | Cars: C | Motorcycles: M"
    pub fn summary_line(&self) -> String {
        format!(
            "Total: {} | Cars: {} | Motorcycles: {}",
            self.total(),
            self.cars,
            self.motorcycles
        )
    }
}

/// Keep only detections at or above the confidence threshold.
pub fn filter_confident(detections: &[Detection], threshold: f32) -> Vec<Detection> {
    detections
        .iter()
        .filter(|d| d.confidence >= threshold)
        .cloned()
        .collect()
}

/// Count detections by vehicle class.
///
/// Detections below `threshold` are skipped before their label is looked at.
/// A counted detection with a label outside [`VehicleClass`] is an error.
pub fn count_detections(detections: &[Detection], threshold: f32) -> ModelResult<CountSummary> {
    let mut summary = CountSummary::default();
    for detection in detections.iter().filter(|d| d.confidence >= threshold) {
        let class: VehicleClass = detection.label.parse()?;
        summary.increment(class);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use crate::error::ModelError;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_counts_by_class() {
        let detections = vec![det("mobil", 0.9), det("mobil", 0.5), det("motor", 0.3)];
        let summary = count_detections(&detections, 0.25).unwrap();
        assert_eq!(summary, CountSummary::new(2, 1));
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let detections = vec![det("car", 0.25), det("car", 0.2499)];
        let summary = count_detections(&detections, 0.25).unwrap();
        assert_eq!(summary.cars, 1);
    }

    #[test]
    fn test_unknown_label_is_error() {
        let detections = vec![det("car", 0.9), det("bus", 0.9)];
        let err = count_detections(&detections, 0.25).unwrap_err();
        assert_eq!(err, ModelError::UnknownClass("bus".to_string()));
    }

    #[test]
    fn test_unknown_label_below_threshold_is_ignored() {
        let detections = vec![det("bus", 0.1), det("motor", 0.8)];
        let summary = count_detections(&detections, 0.25).unwrap();
        assert_eq!(summary, CountSummary::new(0, 1));
    }

    #[test]
    fn test_total_matches_class_sum() {
        let labels = ["car", "motor", "mobil", "motorcycle", "car"];
        for n in 0..=labels.len() {
            let detections: Vec<_> = labels[..n].iter().map(|l| det(l, 0.7)).collect();
            let summary = count_detections(&detections, 0.25).unwrap();
            assert_eq!(summary.total(), summary.cars + summary.motorcycles);
            assert_eq!(summary.total() as usize, n);
        }
    }

    #[test]
    fn test_filter_confident() {
        let detections = vec![det("car", 0.9), det("car", 0.1)];
        let kept = filter_confident(&detections, 0.25);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            CountSummary::new(2, 1).summary_line(),
            "Total: 3 | Cars: 2 | Motorcycles: 1"
        );
    }
}
