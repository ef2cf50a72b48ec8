//! Resources: anything whose dynamics can be read through a `Querier`.
//!
//! A cell handle is the simplest resource.  Derived resources combine cells
//! with pure functions over dynamics:
//!
//! ```rust
//! use tl_cells::{CellStore, Linear, ResourceExt, Querier, Resource};
//!
//! let mut store = CellStore::new();
//! let a = store.allocate("a", Linear::new(1.0, 0.5));
//! let b = store.allocate("b", Linear::new(2.0, -0.5));
//! let total = a.zip(b, |x, y| x + y);
//!
//! let q = Querier::new(&store);
//! assert_eq!(total.value(&q).unwrap(), 3.0);
//! ```
//!
//! Evaluation order is irrelevant: resources only read.

use std::sync::Arc;

use crate::dynamics::Dynamics;
use crate::error::CellResult;
use crate::querier::Querier;
use crate::store::CellId;

pub trait Resource: Send + Sync + 'static {
    type Dyn: Dynamics;

    /// Current dynamics of the resource.  Every cell consulted is recorded
    /// on `q`.
    fn dynamics(&self, q: &Querier<'_>) -> CellResult<Self::Dyn>;

    /// Current value of the resource.
    fn value(&self, q: &Querier<'_>) -> CellResult<<Self::Dyn as Dynamics>::Value> {
        Ok(self.dynamics(q)?.extract())
    }
}

impl<D: Dynamics> Resource for CellId<D> {
    type Dyn = D;

    fn dynamics(&self, q: &Querier<'_>) -> CellResult<D> {
        q.sample(*self)
    }
}

impl<R: Resource> Resource for Arc<R> {
    type Dyn = R::Dyn;

    fn dynamics(&self, q: &Querier<'_>) -> CellResult<R::Dyn> {
        (**self).dynamics(q)
    }
}

// ── Combinators ───────────────────────────────────────────────────────────────

/// Fixed dynamics that depend on no cell.
#[derive(Clone, Debug)]
pub struct Constant<D>(pub D);

impl<D: Dynamics> Resource for Constant<D> {
    type Dyn = D;

    fn dynamics(&self, _q: &Querier<'_>) -> CellResult<D> {
        Ok(self.0.clone())
    }
}

pub struct Map<R, F> {
    inner: R,
    f:     F,
}

impl<R, F, D> Resource for Map<R, F>
where
    R: Resource,
    D: Dynamics,
    F: Fn(R::Dyn) -> D + Send + Sync + 'static,
{
    type Dyn = D;

    fn dynamics(&self, q: &Querier<'_>) -> CellResult<D> {
        Ok((self.f)(self.inner.dynamics(q)?))
    }
}

pub struct Zip<A, B, F> {
    left:  A,
    right: B,
    f:     F,
}

impl<A, B, F, D> Resource for Zip<A, B, F>
where
    A: Resource,
    B: Resource,
    D: Dynamics,
    F: Fn(A::Dyn, B::Dyn) -> D + Send + Sync + 'static,
{
    type Dyn = D;

    fn dynamics(&self, q: &Querier<'_>) -> CellResult<D> {
        Ok((self.f)(self.left.dynamics(q)?, self.right.dynamics(q)?))
    }
}

pub fn constant<D: Dynamics>(dynamics: D) -> Constant<D> {
    Constant(dynamics)
}

pub fn map<R, F>(inner: R, f: F) -> Map<R, F> {
    Map { inner, f }
}

pub fn zip<A, B, F>(left: A, right: B, f: F) -> Zip<A, B, F> {
    Zip { left, right, f }
}

/// Method-style combinators for every resource.
pub trait ResourceExt: Resource + Sized {
    fn map<D, F>(self, f: F) -> Map<Self, F>
    where
        D: Dynamics,
        F: Fn(Self::Dyn) -> D + Send + Sync + 'static,
    {
        map(self, f)
    }

    fn zip<B, D, F>(self, other: B, f: F) -> Zip<Self, B, F>
    where
        B: Resource,
        D: Dynamics,
        F: Fn(Self::Dyn, B::Dyn) -> D + Send + Sync + 'static,
    {
        zip(self, other, f)
    }

    fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl<R: Resource> ResourceExt for R {}
