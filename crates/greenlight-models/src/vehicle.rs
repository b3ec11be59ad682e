//! Vehicle classes recognized by the counter.
//!
//! The detection model may report labels in English (`car`, `motorcycle`)
//! or in the Indonesian naming of the training dataset (`mobil`, `motor`).
//! Both spellings map onto the same [`VehicleClass`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A vehicle class that contributes to green-phase timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Car,
    Motorcycle,
}

impl VehicleClass {
    /// All counted vehicle classes.
    pub const ALL: &'static [VehicleClass] = &[VehicleClass::Car, VehicleClass::Motorcycle];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Motorcycle => "motorcycle",
        }
    }

    /// Box color as RGB.
    pub fn color(&self) -> [u8; 3] {
        match self {
            VehicleClass::Car => [0, 255, 0],
            VehicleClass::Motorcycle => [0, 0, 255],
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VehicleClass {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" | "mobil" => Ok(VehicleClass::Car),
            "motorcycle" | "motor" | "motorbike" => Ok(VehicleClass::Motorcycle),
            _ => Err(ModelError::unknown_class(s)),
        }
    }
}
