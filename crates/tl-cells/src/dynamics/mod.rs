//! Symbolic dynamics: values that know how they evolve over time.
//!
//! # Design
//!
//! A cell stores a [`Dynamics`] value rather than a sample.  Reading the cell
//! at a later time steps the stored dynamics forward by the elapsed span.
//! Condition evaluation asks for [`Dynamics::as_polynomial`]; dynamics that
//! can express themselves as a low-degree polynomial get exact analytic
//! crossing times, everything else falls back to numeric search.
//!
//! | Type            | Value   | Evolution                               |
//! |-----------------|---------|-----------------------------------------|
//! | [`Discrete<T>`] | `T`     | constant until overwritten              |
//! | [`Linear`]      | `f64`   | `value + rate * t` (rate per second)    |
//! | [`Polynomial`]  | `f64`   | `Σ cᵢ tⁱ` (t in seconds)                |
//! | [`Clock`]       | `Duration` | grows one-for-one with simulated time |

mod clock;
mod discrete;
mod linear;
mod polynomial;

use std::fmt;

use tl_core::Duration;

pub use clock::Clock;
pub use discrete::Discrete;
pub use linear::Linear;
pub use polynomial::Polynomial;

/// A value paired with its law of evolution.
///
/// `step(d)` must satisfy `x.step(a).step(b) == x.step(a + b)` up to
/// floating-point rounding; the store relies on it when reading at arbitrary
/// instants between writes.
pub trait Dynamics: Clone + fmt::Debug + Send + Sync + 'static {
    type Value;

    /// The instantaneous value.
    fn extract(&self) -> Self::Value;

    /// The dynamics as seen `elapsed` later.
    fn step(&self, elapsed: Duration) -> Self;

    /// Polynomial form in seconds, if one exists.  Enables analytic
    /// condition solving.
    fn as_polynomial(&self) -> Option<Polynomial> {
        None
    }

    /// `true` if `step` never changes the value.
    fn is_constant(&self) -> bool {
        false
    }
}
