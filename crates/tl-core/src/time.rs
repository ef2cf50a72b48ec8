//! Simulated time model.
//!
//! # Design
//!
//! Time is logical and advanced only by the engine.  Both instants and
//! spans are stored as signed microsecond counts:
//!
//!   `SimTime`  — microseconds since plan start (`SimTime::ZERO`)
//!   `Duration` — a signed span of microseconds
//!
//! Integer microseconds keep event ordering exact (no floating-point drift)
//! and make same-time ties well defined.  Continuous dynamics convert to
//! seconds with [`Duration::as_secs_f64`] only when evaluating rates.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

const MICROS_PER_SECOND: i64 = 1_000_000;

// ── Duration ──────────────────────────────────────────────────────────────────

/// A signed span of simulated time, in microseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Duration(pub i64);

impl Duration {
    pub const ZERO: Duration = Duration(0);
    /// The smallest representable step.
    pub const EPSILON: Duration = Duration(1);
    pub const MICROSECOND: Duration = Duration(1);
    pub const MILLISECOND: Duration = Duration(1_000);
    pub const SECOND: Duration = Duration(MICROS_PER_SECOND);
    pub const MINUTE: Duration = Duration(60 * MICROS_PER_SECOND);
    pub const HOUR: Duration = Duration(3_600 * MICROS_PER_SECOND);
    pub const DAY: Duration = Duration(86_400 * MICROS_PER_SECOND);

    /// Effectively unbounded span.  Kept well below `i64::MAX` so that
    /// `SimTime + Duration::FOREVER` cannot overflow for any realistic time.
    pub const FOREVER: Duration = Duration(i64::MAX / 4);

    #[inline]
    pub const fn from_micros(micros: i64) -> Duration {
        Duration(micros)
    }

    #[inline]
    pub const fn from_millis(millis: i64) -> Duration {
        Duration(millis * 1_000)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Duration {
        Duration(secs * MICROS_PER_SECOND)
    }

    /// Convert fractional seconds, rounding to the nearest microsecond.
    pub fn from_secs_f64(secs: f64) -> Duration {
        Duration((secs * MICROS_PER_SECOND as f64).round() as i64)
    }

    #[inline]
    pub const fn micros(self) -> i64 {
        self.0
    }

    /// This span expressed in (fractional) seconds.
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SECOND as f64
    }

    /// `self / unit` as a float, e.g. `d.ratio_over(Duration::HOUR)`.
    #[inline]
    pub fn ratio_over(self, unit: Duration) -> f64 {
        self.0 as f64 / unit.0 as f64
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn saturating_add(self, rhs: Duration) -> Duration {
        Duration(self.0.saturating_add(rhs.0))
    }
}

impl Add for Duration {
    type Output = Duration;
    #[inline]
    fn add(self, rhs: Duration) -> Duration {
        Duration(self.0 + rhs.0)
    }
}

impl AddAssign for Duration {
    #[inline]
    fn add_assign(&mut self, rhs: Duration) {
        self.0 += rhs.0;
    }
}

impl Sub for Duration {
    type Output = Duration;
    #[inline]
    fn sub(self, rhs: Duration) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl Neg for Duration {
    type Output = Duration;
    #[inline]
    fn neg(self) -> Duration {
        Duration(-self.0)
    }
}

impl Mul<i64> for Duration {
    type Output = Duration;
    #[inline]
    fn mul(self, rhs: i64) -> Duration {
        Duration(self.0 * rhs)
    }
}

impl Div<i64> for Duration {
    type Output = Duration;
    #[inline]
    fn div(self, rhs: i64) -> Duration {
        Duration(self.0 / rhs)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let secs = abs / MICROS_PER_SECOND as u64;
        let micros = abs % MICROS_PER_SECOND as u64;
        write!(f, "{sign}{secs}.{micros:06}s")
    }
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute simulated instant: microseconds since plan start.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// Return the instant `d` after `self`, saturating at the representable
    /// maximum instead of overflowing.
    #[inline]
    pub fn offset(self, d: Duration) -> SimTime {
        SimTime(self.0.saturating_add(d.0))
    }

    /// Span elapsed from `earlier` to `self` (negative if `earlier > self`).
    #[inline]
    pub fn since(self, earlier: SimTime) -> Duration {
        Duration(self.0 - earlier.0)
    }

    #[inline]
    pub const fn micros(self) -> i64 {
        self.0
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: Duration) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl Sub<Duration> for SimTime {
    type Output = SimTime;
    #[inline]
    fn sub(self, rhs: Duration) -> SimTime {
        SimTime(self.0 - rhs.0)
    }
}

impl Sub for SimTime {
    type Output = Duration;
    #[inline]
    fn sub(self, rhs: SimTime) -> Duration {
        Duration(self.0 - rhs.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}", Duration(self.0))
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The engine's monotonically non-decreasing simulated clock, plus the
/// mapping from simulated time to Unix wall-clock time for reporting.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of `SimTime::ZERO`.
    pub start_unix_secs: i64,
    /// The current simulated instant.
    pub now: SimTime,
}

impl SimClock {
    pub fn new(start_unix_secs: i64) -> Self {
        Self { start_unix_secs, now: SimTime::ZERO }
    }

    /// Move the clock forward to `t`.
    ///
    /// Returns `false` (and leaves the clock untouched) if `t` is earlier
    /// than the current time.
    #[inline]
    pub fn advance_to(&mut self, t: SimTime) -> bool {
        if t < self.now {
            return false;
        }
        self.now = t;
        true
    }

    /// Unix timestamp in microseconds corresponding to `t`.
    #[inline]
    pub fn unix_micros(&self, t: SimTime) -> i64 {
        self.start_unix_secs * MICROS_PER_SECOND + t.0
    }

    /// Break elapsed time into (day, hour, minute, second) components since
    /// plan start.  Useful for human-readable logging without a datetime
    /// library.
    pub fn elapsed_dhms(&self) -> (u64, u32, u32, u32) {
        let total_secs = (self.now.0.max(0) / MICROS_PER_SECOND) as u64;
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        let seconds = (total_secs % 60) as u32;
        (days, hours, minutes, seconds)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m, s) = self.elapsed_dhms();
        write!(f, "{} (day {} {:02}:{:02}:{:02})", self.now, d, h, m, s)
    }
}
