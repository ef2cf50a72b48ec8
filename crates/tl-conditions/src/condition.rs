//! The `Condition` trait and its boolean algebra.

use std::sync::Arc;

use tl_cells::CellResult;

use crate::crossing::{Crossing, Direction, Window};
use crate::evaluator::Evaluator;

/// Upper bound on alternations of the `and` fix-point before falling back to
/// search.
const MAX_FIXPOINT_ROUNDS: usize = 64;

/// A pure predicate over the extrapolated future of the cell store.
///
/// Implementations only read, through `ev.querier()`, so the engine can
/// learn which cells each condition depends on.
pub trait Condition: Send + Sync + 'static {
    /// Earliest offset in `window` at which the predicate matches `direction`.
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing>;

    /// Latest offset in `window` at which the predicate matches `direction`.
    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing>;
}

pub type BoxedCondition = Box<dyn Condition>;

impl<C: Condition + ?Sized> Condition for Box<C> {
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        (**self).earliest(ev, direction, window)
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        (**self).latest(ev, direction, window)
    }
}

impl<C: Condition + ?Sized> Condition for Arc<C> {
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        (**self).earliest(ev, direction, window)
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        (**self).latest(ev, direction, window)
    }
}

// ── Constants ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default)]
pub struct Always;

#[derive(Copy, Clone, Debug, Default)]
pub struct Never;

pub fn always() -> Always {
    Always
}

pub fn never() -> Never {
    Never
}

impl Condition for Always {
    fn earliest(&self, _ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        let hit = direction == Direction::Rising && !window.is_empty();
        Ok(Crossing::analytic(hit.then_some(window.earliest)))
    }

    fn latest(&self, _ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        let hit = direction == Direction::Rising && !window.is_empty();
        Ok(Crossing::analytic(hit.then_some(window.latest)))
    }
}

impl Condition for Never {
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        Always.earliest(ev, direction.flip(), window)
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        Always.latest(ev, direction.flip(), window)
    }
}

// ── Not ───────────────────────────────────────────────────────────────────────

pub struct Not<C>(pub C);

impl<C: Condition> Condition for Not<C> {
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        self.0.earliest(ev, direction.flip(), window)
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        self.0.latest(ev, direction.flip(), window)
    }
}

// ── And / Or ──────────────────────────────────────────────────────────────────
//
// De Morgan: "and falling" is "or" over falling operands and vice versa, so
// each side reduces to one of two shapes:
//   both  — both operands must match at the same instant (fix-point)
//   either — either operand suffices (min / max)

pub struct And<A, B>(pub A, pub B);

pub struct Or<A, B>(pub A, pub B);

impl<A: Condition, B: Condition> Condition for And<A, B> {
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        match direction {
            Direction::Rising => both_earliest(ev, &self.0, &self.1, direction, window),
            Direction::Falling => either_earliest(ev, &self.0, &self.1, direction, window),
        }
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        match direction {
            Direction::Rising => both_latest(ev, &self.0, &self.1, direction, window),
            Direction::Falling => either_latest(ev, &self.0, &self.1, direction, window),
        }
    }
}

impl<A: Condition, B: Condition> Condition for Or<A, B> {
    fn earliest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        match direction {
            Direction::Rising => either_earliest(ev, &self.0, &self.1, direction, window),
            Direction::Falling => both_earliest(ev, &self.0, &self.1, direction, window),
        }
    }

    fn latest(&self, ev: &Evaluator<'_>, direction: Direction, window: Window) -> CellResult<Crossing> {
        match direction {
            Direction::Rising => either_latest(ev, &self.0, &self.1, direction, window),
            Direction::Falling => both_latest(ev, &self.0, &self.1, direction, window),
        }
    }
}

fn either_earliest<A: Condition, B: Condition>(
    ev: &Evaluator<'_>,
    a: &A,
    b: &B,
    direction: Direction,
    window: Window,
) -> CellResult<Crossing> {
    Ok(Crossing::earlier(a.earliest(ev, direction, window)?, b.earliest(ev, direction, window)?))
}

fn either_latest<A: Condition, B: Condition>(
    ev: &Evaluator<'_>,
    a: &A,
    b: &B,
    direction: Direction,
    window: Window,
) -> CellResult<Crossing> {
    Ok(Crossing::later(a.latest(ev, direction, window)?, b.latest(ev, direction, window)?))
}

/// Alternate between the operands, each time asking for the earliest match
/// at or after the other's answer, until both agree.
fn both_earliest<A: Condition, B: Condition>(
    ev: &Evaluator<'_>,
    a: &A,
    b: &B,
    direction: Direction,
    window: Window,
) -> CellResult<Crossing> {
    let mut start = window.earliest;
    let mut acc = Crossing::analytic(None);
    for _ in 0..MAX_FIXPOINT_ROUNDS {
        let ca = a.earliest(ev, direction, window.starting_at(start))?;
        acc = acc.merged_with(ca);
        let Some(ta) = ca.offset else {
            return Ok(Crossing { offset: None, ..acc });
        };
        let cb = b.earliest(ev, direction, window.starting_at(ta))?;
        acc = acc.merged_with(cb);
        let Some(tb) = cb.offset else {
            return Ok(Crossing { offset: None, ..acc });
        };
        if tb == ta {
            return Ok(Crossing { offset: Some(ta), ..acc });
        }
        start = tb;
    }
    let searched = ev.search_earliest(Direction::Rising, window, |offset| {
        Ok(direction.accepts(ev.holds_at(a, offset)?) && direction.accepts(ev.holds_at(b, offset)?))
    })?;
    Ok(searched.merged_with(acc))
}

/// Mirror of [`both_earliest`], walking backwards from the window end.
fn both_latest<A: Condition, B: Condition>(
    ev: &Evaluator<'_>,
    a: &A,
    b: &B,
    direction: Direction,
    window: Window,
) -> CellResult<Crossing> {
    let mut end = window.latest;
    let mut acc = Crossing::analytic(None);
    for _ in 0..MAX_FIXPOINT_ROUNDS {
        let ca = a.latest(ev, direction, window.ending_at(end))?;
        acc = acc.merged_with(ca);
        let Some(ta) = ca.offset else {
            return Ok(Crossing { offset: None, ..acc });
        };
        let cb = b.latest(ev, direction, window.ending_at(ta))?;
        acc = acc.merged_with(cb);
        let Some(tb) = cb.offset else {
            return Ok(Crossing { offset: None, ..acc });
        };
        if tb == ta {
            return Ok(Crossing { offset: Some(ta), ..acc });
        }
        end = tb;
    }
    let searched = ev.search_latest(Direction::Rising, window, |offset| {
        Ok(direction.accepts(ev.holds_at(a, offset)?) && direction.accepts(ev.holds_at(b, offset)?))
    })?;
    Ok(searched.merged_with(acc))
}

// ── Extension methods ─────────────────────────────────────────────────────────

pub trait ConditionExt: Condition + Sized {
    fn and<C: Condition>(self, other: C) -> And<Self, C> {
        And(self, other)
    }

    fn or<C: Condition>(self, other: C) -> Or<Self, C> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }

    fn boxed(self) -> BoxedCondition {
        Box::new(self)
    }
}

impl<C: Condition> ConditionExt for C {}
