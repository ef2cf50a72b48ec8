//! Arbitrary predicates over a resource's value.

use tl_cells::{CellResult, Dynamics, Resource};

use crate::condition::Condition;
use crate::crossing::{Crossing, Direction, Window};
use crate::evaluator::Evaluator;

/// Holds whenever `predicate(value)` is true.
///
/// Constant dynamics (e.g. `Discrete`) are decided from a single read; all
/// others fall back to search.
pub struct When<R, F> {
    resource:  R,
    predicate: F,
}

pub fn when<R, F>(resource: R, predicate: F) -> When<R, F>
where
    R: Resource,
    F: Fn(&<R::Dyn as Dynamics>::Value) -> bool + Send + Sync + 'static,
{
    When { resource, predicate }
}

impl<R, F> Condition for When<R, F>
where
    R: Resource,
    F: Fn(&<R::Dyn as Dynamics>::Value) -> bool + Send + Sync + 'static,
{
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        if window.is_empty() {
            return Ok(Crossing::analytic(None));
        }
        let dynamics = self.resource.dynamics(ev.querier())?;
        if dynamics.is_constant() {
            let ok = direction.accepts((self.predicate)(&dynamics.extract()));
            return Ok(Crossing::analytic(ok.then_some(window.earliest)));
        }
        ev.search_earliest(direction, window, |d| Ok((self.predicate)(&dynamics.step(d).extract())))
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        if window.is_empty() {
            return Ok(Crossing::analytic(None));
        }
        let dynamics = self.resource.dynamics(ev.querier())?;
        if dynamics.is_constant() {
            let ok = direction.accepts((self.predicate)(&dynamics.extract()));
            return Ok(Crossing::analytic(ok.then_some(window.latest)));
        }
        ev.search_latest(direction, window, |d| Ok((self.predicate)(&dynamics.step(d).extract())))
    }
}
