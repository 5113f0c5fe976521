//! Link flow model: the volume-delay function.
//!
//! # Shape
//!
//! The Bureau of Public Roads form:
//!
//! ```text
//! t(v) = t0 · (1 + α · min(v / c, SATURATION_CAP)^β)
//! ```
//!
//! where `t0` is the free-flow travel time, `c` the capacity and `v` the
//! number of vehicles already on the link.  With `α ≥ 0` and `β ≥ 1` the
//! function is monotone non-decreasing and convex in `v`, equals `t0` at
//! `v = 0`, and keeps growing past saturation.  The ratio cap keeps the
//! result finite for any volume; parameters are checked at construction so
//! that the capped value itself cannot overflow.

use crate::{NetworkError, NetworkResult};

/// Largest volume/capacity ratio fed into the power term.
pub const SATURATION_CAP: f64 = 1.0e3;

/// Volume-delay parameters.  Evaluation is a pure function of its inputs.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeDelay {
    pub alpha: f64,
    pub beta:  f64,
}

impl VolumeDelay {
    /// Classic BPR parameters (α = 0.15, β = 4).
    pub const BPR: VolumeDelay = VolumeDelay { alpha: 0.15, beta: 4.0 };

    /// Volume-independent: every vehicle sees the free-flow time.
    pub const FREE_FLOW: VolumeDelay = VolumeDelay { alpha: 0.0, beta: 1.0 };

    /// Validated constructor.
    pub fn new(alpha: f64, beta: f64) -> NetworkResult<Self> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(NetworkError::InvalidVolumeDelay(format!("alpha must be finite and >= 0, got {alpha}")));
        }
        if !beta.is_finite() || beta < 1.0 {
            return Err(NetworkError::InvalidVolumeDelay(format!("beta must be finite and >= 1, got {beta}")));
        }
        let worst = 1.0 + alpha * SATURATION_CAP.powf(beta);
        if !worst.is_finite() {
            return Err(NetworkError::InvalidVolumeDelay(format!(
                "alpha={alpha}, beta={beta} overflow at saturation"
            )));
        }
        Ok(Self { alpha, beta })
    }

    /// Travel time across a link with the given free-flow time and capacity
    /// when `volume` vehicles are already on it.
    #[inline]
    pub fn travel_time(&self, free_flow: f64, capacity: f64, volume: f64) -> f64 {
        if volume <= 0.0 || self.alpha == 0.0 {
            return free_flow;
        }
        let ratio = (volume / capacity).min(SATURATION_CAP);
        free_flow * (1.0 + self.alpha * ratio.powf(self.beta))
    }
}

impl Default for VolumeDelay {
    fn default() -> Self {
        Self::BPR
    }
}
