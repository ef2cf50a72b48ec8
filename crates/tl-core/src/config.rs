//! Top-level simulation configuration.

use crate::{CoreError, CoreResult, Duration, SimClock, SimTime};

/// Top-level simulation configuration.
///
/// Typically loaded from a TOML/JSON file by the application crate (enable
/// the `serde` feature) and passed to the engine builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Unix timestamp (seconds) that `SimTime::ZERO` corresponds to.
    pub start_unix_secs: i64,

    /// Plan horizon.  Events scheduled after `SimTime::ZERO + duration` are
    /// never dispatched.  `None` runs until no pending events remain.
    pub duration: Option<Duration>,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Number of evenly spaced grid samples the condition search strategy
    /// takes across a window before bisecting.
    pub search_samples: u32,

    /// Bisection stops once the bracketing interval is this narrow.
    pub search_resolution: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs:   0,
            duration:          None,
            seed:              0,
            search_samples:    64,
            search_resolution: Duration::EPSILON,
        }
    }
}

impl SimConfig {
    /// The last instant at which events may still be dispatched, if bounded.
    #[inline]
    pub fn end_time(&self) -> Option<SimTime> {
        self.duration.map(|d| SimTime::ZERO.offset(d))
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs)
    }

    /// Reject configurations the engine cannot honour.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(d) = self.duration {
            if d.is_negative() {
                return Err(CoreError::Config(format!("duration must be non-negative, got {d}")));
            }
        }
        if self.search_samples == 0 {
            return Err(CoreError::Config("search_samples must be > 0".into()));
        }
        if self.search_resolution <= Duration::ZERO {
            return Err(CoreError::Config(format!(
                "search_resolution must be positive, got {}",
                self.search_resolution
            )));
        }
        Ok(())
    }
}
