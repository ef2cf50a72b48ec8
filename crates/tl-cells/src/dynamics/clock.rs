use serde::{Deserialize, Serialize};

use tl_core::Duration;

use super::{Dynamics, Polynomial};

/// A stopwatch: elapsed simulated time since some reference point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clock {
    pub elapsed: Duration,
}

impl Clock {
    pub const fn starting_at(elapsed: Duration) -> Self {
        Clock { elapsed }
    }
}

impl Dynamics for Clock {
    type Value = Duration;

    fn extract(&self) -> Duration {
        self.elapsed
    }

    fn step(&self, elapsed: Duration) -> Self {
        Clock { elapsed: self.elapsed.saturating_add(elapsed) }
    }

    /// Elapsed seconds, slope one.
    fn as_polynomial(&self) -> Option<Polynomial> {
        Some(Polynomial::new(vec![self.elapsed.as_secs_f64(), 1.0]))
    }
}
