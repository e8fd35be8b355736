//! Score → capacity curve.
//!
//! Both the scaler and the detector's advisory recommendation use this
//! single mapping so the number of agents a caller is told to expect
//! matches the number the scaler actually allocates.
//!
//! ```text
//! score < mid            → 3
//! mid    ≤ score < medium → 4..=6 (graduated)
//! medium ≤ score < high   → 6..=8 (graduated)
//! high   ≤ score          → 8..=max (graduated)
//! result clamped to [min, max]
//! ```

use serde::{Deserialize, Serialize};

/// Band boundaries of the capacity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityCurve {
    /// Start of the first graduated band.
    pub mid: u32,
    /// Start of the second graduated band.
    pub medium: u32,
    /// Start of the open-ended top band.
    pub high: u32,
}

impl Default for CapacityCurve {
    fn default() -> Self {
        Self {
            mid: 50,
            medium: 70,
            high: 85,
        }
    }
}

/// Agents allocated below `mid`.
const BASE_AGENTS: usize = 3;

impl CapacityCurve {
    /// Number of agents a task of `score` warrants, clamped to `[min, max]`.
    ///
    /// Non-decreasing in `score` for any curve whose boundaries increase.
    pub fn required_agents(&self, score: u32, min: usize, max: usize) -> usize {
        let max = max.max(min);
        let score = score.min(100);

        let raw = if score < self.mid {
            BASE_AGENTS
        } else if score < self.medium {
            graduated(score, self.mid, self.medium, 4, 2)
        } else if score < self.high {
            graduated(score, self.medium, self.high, 6, 2)
        } else {
            graduated(score, self.high, 100, 8, 4).min(max)
        };

        raw.clamp(min, max)
    }

    /// True when the boundaries are strictly increasing and within 0..=100.
    pub fn is_well_formed(&self) -> bool {
        self.mid < self.medium && self.medium < self.high && self.high < 100
    }
}

/// `ceil(base + (score - from) * span / (to - from))`, capped at `base + span`.
fn graduated(score: u32, from: u32, to: u32, base: usize, span: usize) -> usize {
    let width = f64::from(to.saturating_sub(from).max(1));
    let offset = f64::from(score.saturating_sub(from));
    let value = (base as f64 + offset * span as f64 / width).ceil() as usize;
    value.min(base + span)
}
