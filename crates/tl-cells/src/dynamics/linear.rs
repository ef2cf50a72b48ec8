use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use tl_core::Duration;

use super::{Dynamics, Polynomial};

/// A real value changing at a constant rate (units per second).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Linear {
    pub value: f64,
    pub rate:  f64,
}

impl Linear {
    pub const fn new(value: f64, rate: f64) -> Self {
        Linear { value, rate }
    }

    /// A value that does not change.
    pub const fn constant(value: f64) -> Self {
        Linear { value, rate: 0.0 }
    }

    /// Same current value, new rate.  Used by effect models that change a
    /// consumption or charge rate without touching the level.
    pub fn with_rate(self, rate: f64) -> Self {
        Linear { rate, ..self }
    }
}

impl Dynamics for Linear {
    type Value = f64;

    #[inline]
    fn extract(&self) -> f64 {
        self.value
    }

    #[inline]
    fn step(&self, elapsed: Duration) -> Self {
        Linear { value: self.value + self.rate * elapsed.as_secs_f64(), rate: self.rate }
    }

    fn as_polynomial(&self) -> Option<Polynomial> {
        Some(Polynomial::new(vec![self.value, self.rate]))
    }

    fn is_constant(&self) -> bool {
        self.rate == 0.0
    }
}

impl Add for Linear {
    type Output = Linear;
    fn add(self, rhs: Linear) -> Linear {
        Linear { value: self.value + rhs.value, rate: self.rate + rhs.rate }
    }
}

impl Sub for Linear {
    type Output = Linear;
    fn sub(self, rhs: Linear) -> Linear {
        Linear { value: self.value - rhs.value, rate: self.rate - rhs.rate }
    }
}

impl Mul<f64> for Linear {
    type Output = Linear;
    fn mul(self, factor: f64) -> Linear {
        Linear { value: self.value * factor, rate: self.rate * factor }
    }
}
