//! Shared data models for the Greenlight backend.
//!
//! This crate provides the pure, I/O-free parts of the system:
//! - Vehicle classes and detections
//! - Per-class counting with a confidence threshold
//! - Green-phase timing arithmetic
//! - Class index to label lookup

pub mod class_names;
pub mod counts;
pub mod detection;
pub mod error;
pub mod timing;
pub mod vehicle;

// Re-export common types
pub use class_names::ClassNames;
pub use counts::{count_detections, filter_confident, CountSummary};
pub use detection::{BoundingBox, Detection};
pub use error::{ModelError, ModelResult};
pub use timing::{calculate_green_time, round_to, GreenTimePolicy, TimingResult};
pub use vehicle::VehicleClass;
