//! Threshold comparisons: `resource <op> threshold`.
//!
//! When the resource's dynamics have a polynomial form of degree ≤ 2, the
//! crossing is found from the roots of `p(t) - threshold`.  Sign is constant
//! between roots, so the only candidate answers are the window ends and the
//! microseconds around each root.  Each candidate is confirmed by stepping
//! the real dynamics, which keeps analytic answers consistent with what a
//! task would read at that instant.

use tl_cells::{CellResult, Dynamics, Polynomial, Resource};
use tl_core::Duration;

use crate::condition::Condition;
use crate::crossing::{Crossing, Direction, Window};
use crate::evaluator::Evaluator;

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Largest polynomial degree solved in closed form.
const MAX_ANALYTIC_DEGREE: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    LessThan,
    AtMost,
    GreaterThan,
    AtLeast,
}

impl Comparison {
    #[inline]
    pub fn test(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::LessThan => value < threshold,
            Comparison::AtMost => value <= threshold,
            Comparison::GreaterThan => value > threshold,
            Comparison::AtLeast => value >= threshold,
        }
    }
}

pub struct Compare<R> {
    resource:  R,
    op:        Comparison,
    threshold: f64,
}

impl<R> Compare<R> {
    pub fn new(resource: R, op: Comparison, threshold: f64) -> Self {
        Compare { resource, op, threshold }
    }
}

pub fn greater_than<R>(resource: R, threshold: f64) -> Compare<R> {
    Compare::new(resource, Comparison::GreaterThan, threshold)
}

pub fn at_least<R>(resource: R, threshold: f64) -> Compare<R> {
    Compare::new(resource, Comparison::AtLeast, threshold)
}

pub fn less_than<R>(resource: R, threshold: f64) -> Compare<R> {
    Compare::new(resource, Comparison::LessThan, threshold)
}

pub fn at_most<R>(resource: R, threshold: f64) -> Compare<R> {
    Compare::new(resource, Comparison::AtMost, threshold)
}

impl<R> Compare<R>
where
    R: Resource,
    R::Dyn: Dynamics<Value = f64>,
{
    fn accepts(&self, dynamics: &R::Dyn, offset: Duration, direction: Direction) -> bool {
        let value = dynamics.step(offset).extract();
        direction.accepts(self.op.test(value, self.threshold))
    }

    /// Candidate offsets in ascending order, or `None` if no closed form.
    fn candidates(&self, dynamics: &R::Dyn, window: Window) -> Option<Vec<Duration>> {
        if dynamics.is_constant() {
            return Some(vec![window.earliest, window.latest]);
        }
        let poly = dynamics.as_polynomial()?;
        if poly.degree() > MAX_ANALYTIC_DEGREE || poly.is_non_finite() {
            return None;
        }
        let shifted = poly - Polynomial::constant(self.threshold);
        let roots = match shifted.real_roots() {
            Some(roots) => roots,
            // Identically equal to the threshold: constant sign.
            None => Vec::new(),
        };

        let mut out = vec![window.earliest, window.latest];
        for root in roots {
            let micros = root * MICROS_PER_SECOND;
            let in_reach = micros >= window.earliest.micros() as f64 - 2.0
                && micros <= window.latest.micros() as f64 + 2.0;
            if !micros.is_finite() || !in_reach {
                continue;
            }
            let floor = micros.floor() as i64;
            for m in floor - 1..=floor + 2 {
                let d = Duration(m);
                if window.contains(d) {
                    out.push(d);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        Some(out)
    }
}

impl<R> Condition for Compare<R>
where
    R: Resource,
    R::Dyn: Dynamics<Value = f64>,
{
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        if window.is_empty() {
            return Ok(Crossing::analytic(None));
        }
        let dynamics = self.resource.dynamics(ev.querier())?;
        match self.candidates(&dynamics, window) {
            Some(candidates) => {
                let hit = candidates.into_iter().find(|&d| self.accepts(&dynamics, d, direction));
                Ok(Crossing::analytic(hit))
            }
            None => ev.search_earliest(direction, window, |d| {
                Ok(self.op.test(dynamics.step(d).extract(), self.threshold))
            }),
        }
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        if window.is_empty() {
            return Ok(Crossing::analytic(None));
        }
        let dynamics = self.resource.dynamics(ev.querier())?;
        match self.candidates(&dynamics, window) {
            Some(candidates) => {
                let hit = candidates.into_iter().rev().find(|&d| self.accepts(&dynamics, d, direction));
                Ok(Crossing::analytic(hit))
            }
            None => ev.search_latest(direction, window, |d| {
                Ok(self.op.test(dynamics.step(d).extract(), self.threshold))
            }),
        }
    }
}
