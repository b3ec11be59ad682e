//! Green-phase timing arithmetic.
//!
//! Turns vehicle counts into a suggested green duration and compares it
//! against a fixed baseline:
//!
//! ```text
//! raw        = base + cars * per_car + motorcycles * per_motorcycle
//! green      = clamp(raw, min, max)
//! saved      = previous - green
//! saved_pct  = saved / previous * 100
//! ```
//!
//! # Example
//!
//! ```
//! use greenlight_models::{CountSummary, GreenTimePolicy};
//!
//! let timing = GreenTimePolicy::default().summarize(&CountSummary::new(2, 1));
//! assert_eq!(timing.green_time, 27);
//! assert_eq!(timing.improvement_time, 33.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::counts::CountSummary;
use crate::error::{ModelError, ModelResult};

/// Constants driving the green-time heuristic (all in seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreenTimePolicy {
    pub base_time: u32,
    pub time_per_car: u32,
    pub time_per_motorcycle: u32,
    pub min_time: u32,
    pub max_time: u32,
    /// Baseline green duration, only used for the improvement comparison
    pub previous_time: u32,
}

impl Default for GreenTimePolicy {
    fn default() -> Self {
        Self {
            base_time: 10,
            time_per_car: 6,
            time_per_motorcycle: 5,
            min_time: 15,
            max_time: 60,
            previous_time: 60,
        }
    }
}

impl GreenTimePolicy {
    /// Reject configurations the arithmetic cannot honor.
    pub fn validate(&self) -> ModelResult<()> {
        if self.previous_time == 0 {
            return Err(ModelError::invalid_policy("previous_time must be greater than 0"));
        }
        if self.min_time > self.max_time {
            return Err(ModelError::invalid_policy(format!(
                "min_time ({}) exceeds max_time ({})",
                self.min_time, self.max_time
            )));
        }
        Ok(())
    }

    /// Green duration for the given counts, clamped to `[min_time, max_time]`.
    pub fn green_time(&self, car_count: u32, motorcycle_count: u32) -> u32 {
        let raw = u64::from(self.base_time)
            .saturating_add(u64::from(car_count).saturating_mul(u64::from(self.time_per_car)))
            .saturating_add(
                u64::from(motorcycle_count).saturating_mul(u64::from(self.time_per_motorcycle)),
            );
        // Lower bound first so a misordered policy still yields max_time.
        raw.max(u64::from(self.min_time))
            .min(u64::from(self.max_time)) as u32
    }

    /// Seconds saved against the baseline. Negative when the suggestion is longer.
    pub fn improvement_time(&self, green_time: u32) -> f64 {
        f64::from(self.previous_time) - f64::from(green_time)
    }

    /// Improvement as a percentage of the baseline.
    pub fn improvement_pct(&self, green_time: u32) -> f64 {
        self.improvement_time(green_time) / f64::from(self.previous_time) * 100.0
    }

    /// Full timing result for a set of counts.
    pub fn summarize(&self, counts: &CountSummary) -> TimingResult {
        let green_time = self.green_time(counts.cars, counts.motorcycles);
        TimingResult {
            green_time,
            improvement_time: self.improvement_time(green_time),
            improvement_pct: self.improvement_pct(green_time),
        }
    }
}

/// Suggested timing for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingResult {
    pub green_time: u32,
    pub improvement_time: f64,
    pub improvement_pct: f64,
}

impl TimingResult {
    /// Same result with values rounded for display (1 and 2 decimals).
    pub fn rounded(&self) -> Self {
        Self {
            green_time: self.green_time,
            improvement_time: round_to(self.improvement_time, 1),
            improvement_pct: round_to(self.improvement_pct, 2),
        }
    }
}

/// Green time under the default policy.
pub fn calculate_green_time(car_count: u32, motorcycle_count: u32) -> u32 {
    GreenTimePolicy::default().green_time(car_count, motorcycle_count)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
