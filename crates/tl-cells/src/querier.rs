//! Read-tracking view over a `CellStore`.

use std::cell::RefCell;
use std::collections::BTreeSet;

use tl_core::{CellKey, SimTime};

use crate::dynamics::Dynamics;
use crate::error::CellResult;
use crate::store::{CellId, CellStore};

/// Read-only access to the store that remembers every cell it touched.
///
/// Conditions are evaluated through a `Querier`; the recorded keys become the
/// condition's dependency set.  When any of those cells is written later, the
/// engine re-evaluates the condition.
pub struct Querier<'a> {
    cells: &'a CellStore,
    reads: RefCell<BTreeSet<CellKey>>,
}

impl<'a> Querier<'a> {
    pub fn new(cells: &'a CellStore) -> Self {
        Querier { cells, reads: RefCell::new(BTreeSet::new()) }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.cells.now()
    }

    /// Dynamics of `id` at the current time; records the read.
    pub fn sample<D: Dynamics>(&self, id: CellId<D>) -> CellResult<D> {
        self.reads.borrow_mut().insert(id.key());
        self.cells.sample(id)
    }

    /// Dynamics of `id` at an earlier instant; records the read.
    pub fn sample_at<D: Dynamics>(&self, id: CellId<D>, t: SimTime) -> CellResult<D> {
        self.reads.borrow_mut().insert(id.key());
        self.cells.sample_at(id, t)
    }

    /// Keys read so far.
    pub fn reads(&self) -> BTreeSet<CellKey> {
        self.reads.borrow().clone()
    }

    pub fn into_reads(self) -> BTreeSet<CellKey> {
        self.reads.into_inner()
    }
}
