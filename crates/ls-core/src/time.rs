//! Simulation time model.
//!
//! # Design
//!
//! Time is continuous: a `SimTime` is a count of simulated seconds since the
//! start of the run, stored as `f64`.  Link travel times come out of the
//! volume-delay function as arbitrary reals, so an integer tick would force
//! rounding into every link traversal.
//!
//! `f64` is not `Ord`, but event queues need a total order.  `SimTime`
//! orders by [`f64::total_cmp`], which is a total order over every bit
//! pattern.  Scenario validation rejects NaN and negative timestamps before
//! a run starts, so in practice only finite non-negative values and the
//! [`SimTime::INFINITY`] sentinel ever reach a queue.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An absolute simulation timestamp, in seconds since simulation start.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// "No pending work."  A worker whose queue is empty reports this as its
    /// clock; it compares greater than every finite time.
    pub const INFINITY: SimTime = SimTime(f64::INFINITY);

    /// Construct from seconds.  `-0.0` is normalized to `0.0` so that the
    /// two zeros compare equal under the total order.
    #[inline]
    pub fn new(secs: f64) -> SimTime {
        SimTime(secs + 0.0)
    }

    #[inline]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// `true` for every real timestamp; `false` for the infinity sentinel
    /// and NaN.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// `true` if this is a usable input timestamp: finite and not negative.
    #[inline]
    pub fn is_valid_input(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl PartialEq for SimTime {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime::new(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_finite() {
            write!(f, "{:.3}s", self.0)
        } else {
            f.write_str("inf")
        }
    }
}
