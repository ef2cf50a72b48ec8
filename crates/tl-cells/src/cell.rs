//! A single versioned cell and its type-erased storage wrapper.

use std::any::Any;

use tl_core::{CellKey, SimTime};

use crate::dynamics::Dynamics;
use crate::error::{CellError, CellResult};

// ── Typed cell ────────────────────────────────────────────────────────────────

/// One unit of simulation state: the current dynamics plus every earlier
/// `(time, dynamics)` entry, in non-decreasing time order.
///
/// The history is never empty; the first entry is the initial value recorded
/// at allocation time.  Two writes at the same instant both stay in the
/// history; the later one wins for reads at that instant.
#[derive(Clone, Debug)]
pub struct Cell<D> {
    key:     CellKey,
    name:    String,
    history: Vec<(SimTime, D)>,
}

impl<D: Dynamics> Cell<D> {
    pub(crate) fn new(key: CellKey, name: String, initial: D, at: SimTime) -> Self {
        Cell { key, name, history: vec![(at, initial)] }
    }

    #[inline]
    pub fn key(&self) -> CellKey {
        self.key
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn history(&self) -> &[(SimTime, D)] {
        &self.history
    }

    /// Time the cell was created.
    #[inline]
    pub fn created(&self) -> SimTime {
        self.history[0].0
    }

    /// Time of the most recent write.
    #[inline]
    pub fn last_time(&self) -> SimTime {
        self.history[self.history.len() - 1].0
    }

    /// The most recently written dynamics.
    #[inline]
    pub fn current(&self) -> &D {
        &self.history[self.history.len() - 1].1
    }

    /// Append an entry.  Fails if `at` precedes the latest recorded time.
    pub fn record(&mut self, value: D, at: SimTime) -> CellResult<()> {
        let last = self.last_time();
        if at < last {
            return Err(CellError::NonMonotonicWrite { cell: self.key, at, last });
        }
        self.history.push((at, value));
        Ok(())
    }

    /// The entry in effect at `t`: the last one recorded at or before `t`.
    ///
    /// Uses binary search (`partition_point`), O(log n) in history length.
    pub fn entry_at(&self, t: SimTime) -> Option<&(SimTime, D)> {
        let idx = self.history.partition_point(|(time, _)| *time <= t);
        if idx == 0 { None } else { Some(&self.history[idx - 1]) }
    }
}

// ── Type-erased wrapper ───────────────────────────────────────────────────────

/// Type-erased interface over `Cell<D>`, so cells of different dynamics
/// types can share one `Vec` in the store.
///
/// Sealed: only `Cell<D>` implements it.
pub trait ErasedCell: Send + Sync + 'static + sealed::Sealed {
    fn key(&self) -> CellKey;

    fn name(&self) -> &str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn last_time(&self) -> SimTime;

    /// `std::any::type_name` of the stored dynamics, for error messages.
    fn dynamics_type(&self) -> &'static str;

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

mod sealed {
    pub trait Sealed {}
}

impl<D: Dynamics> sealed::Sealed for Cell<D> {}

impl<D: Dynamics> ErasedCell for Cell<D> {
    fn key(&self) -> CellKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.history.len()
    }

    fn last_time(&self) -> SimTime {
        Cell::last_time(self)
    }

    fn dynamics_type(&self) -> &'static str {
        std::any::type_name::<D>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
