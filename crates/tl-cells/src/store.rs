//! `CellStore` — the versioned state of a simulation run.
//!
//! # Design
//!
//! Cells of arbitrary dynamics types live side by side as
//! `Box<dyn ErasedCell>`, indexed by `CellKey`.  Callers hold typed
//! [`CellId<D>`] handles, and every access downcasts back to `Cell<D>`; a
//! handle can only be produced by [`CellStore::allocate`], so a mismatch means
//! a handle from a different store was used.
//!
//! The store carries its own notion of "now".  Reads beyond it are rejected
//! (`OutOfOrderRead`), as are writes ahead of it.  Every write records the
//! cell's key in a written-set that the engine drains after each task step to
//! decide which pending conditions need re-evaluation.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tl_core::{CellKey, SimTime};

use crate::cell::{Cell, ErasedCell};
use crate::dynamics::Dynamics;
use crate::error::{CellError, CellResult};

// ── CellId ────────────────────────────────────────────────────────────────────

/// Typed handle to a cell holding dynamics of type `D`.
///
/// `Copy` regardless of `D`; the `fn() -> D` marker keeps the handle `Send`
/// and `Sync` even for non-`Sync` dynamics.
pub struct CellId<D> {
    key:     CellKey,
    _marker: PhantomData<fn() -> D>,
}

impl<D> CellId<D> {
    #[inline]
    pub fn key(self) -> CellKey {
        self.key
    }
}

impl<D> Clone for CellId<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for CellId<D> {}

impl<D> PartialEq for CellId<D> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<D> Eq for CellId<D> {}

impl<D> Hash for CellId<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<D> fmt::Debug for CellId<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.key.0)
    }
}

// ── CellStore ─────────────────────────────────────────────────────────────────

/// All cells of a run, plus the store's view of the current time.
#[derive(Default)]
pub struct CellStore {
    cells:   Vec<Box<dyn ErasedCell>>,
    now:     SimTime,
    written: BTreeSet<CellKey>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Move the store's clock forward.  Never backwards.
    pub fn advance_to(&mut self, t: SimTime) -> CellResult<()> {
        if t < self.now {
            return Err(CellError::ClockRewind { now: self.now, requested: t });
        }
        self.now = t;
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Create a cell whose history starts with `initial` at the current time.
    pub fn allocate<D: Dynamics>(&mut self, name: impl Into<String>, initial: D) -> CellId<D> {
        let key = CellKey(self.cells.len() as u32);
        self.cells.push(Box::new(Cell::new(key, name.into(), initial, self.now)));
        CellId { key, _marker: PhantomData }
    }

    /// All allocated keys in allocation order.
    pub fn keys(&self) -> impl Iterator<Item = CellKey> + '_ {
        self.cells.iter().map(|c| c.key())
    }

    pub fn name(&self, key: CellKey) -> Option<&str> {
        self.cells.get(key.index()).map(|c| c.name())
    }

    /// Look up a cell by its allocation name.  Linear scan; intended for
    /// setup and reporting, not hot paths.
    pub fn find<D: Dynamics>(&self, name: &str) -> Option<CellId<D>> {
        self.cells
            .iter()
            .find(|c| c.name() == name && c.as_any().is::<Cell<D>>())
            .map(|c| CellId { key: c.key(), _marker: PhantomData })
    }

    /// Borrow the typed cell.
    pub fn cell<D: Dynamics>(&self, id: CellId<D>) -> CellResult<&Cell<D>> {
        let erased = self.cells.get(id.key.index()).ok_or(CellError::UnknownCell(id.key))?;
        erased
            .as_any()
            .downcast_ref::<Cell<D>>()
            .ok_or(CellError::TypeMismatch { cell: id.key, actual: erased.dynamics_type() })
    }

    fn cell_mut<D: Dynamics>(&mut self, id: CellId<D>) -> CellResult<&mut Cell<D>> {
        let erased = self.cells.get_mut(id.key.index()).ok_or(CellError::UnknownCell(id.key))?;
        let actual = erased.dynamics_type();
        erased
            .as_any_mut()
            .downcast_mut::<Cell<D>>()
            .ok_or(CellError::TypeMismatch { cell: id.key, actual })
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// The most recently written dynamics, unstepped.
    pub fn read<D: Dynamics>(&self, id: CellId<D>) -> CellResult<&D> {
        Ok(self.cell(id)?.current())
    }

    /// The dynamics entry in effect at `t` (at or before `t`), unstepped.
    pub fn read_at<D: Dynamics>(&self, id: CellId<D>, t: SimTime) -> CellResult<&D> {
        Ok(&self.entry_at(id, t)?.1)
    }

    /// The dynamics as they stand at the current time.
    pub fn sample<D: Dynamics>(&self, id: CellId<D>) -> CellResult<D> {
        self.sample_at(id, self.now)
    }

    /// The dynamics as they stand at `t`: the effective entry stepped
    /// forward by the time elapsed since it was recorded.
    pub fn sample_at<D: Dynamics>(&self, id: CellId<D>, t: SimTime) -> CellResult<D> {
        let (recorded, dynamics) = self.entry_at(id, t)?;
        Ok(dynamics.step(t - *recorded))
    }

    pub fn history<D: Dynamics>(&self, id: CellId<D>) -> CellResult<&[(SimTime, D)]> {
        Ok(self.cell(id)?.history())
    }

    fn entry_at<D: Dynamics>(&self, id: CellId<D>, t: SimTime) -> CellResult<&(SimTime, D)> {
        if t > self.now {
            return Err(CellError::OutOfOrderRead { cell: id.key, requested: t, now: self.now });
        }
        let cell = self.cell(id)?;
        cell.entry_at(t)
            .ok_or(CellError::NoValueAt { cell: id.key, requested: t, created: cell.created() })
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    /// Record `value` as the cell's dynamics from `at` onward.
    pub fn write<D: Dynamics>(&mut self, id: CellId<D>, value: D, at: SimTime) -> CellResult<()> {
        if at > self.now {
            return Err(CellError::FutureWrite { cell: id.key, at, now: self.now });
        }
        self.cell_mut(id)?.record(value, at)?;
        self.written.insert(id.key);
        Ok(())
    }

    /// Write at the current time.
    pub fn set<D: Dynamics>(&mut self, id: CellId<D>, value: D) -> CellResult<()> {
        let now = self.now;
        self.write(id, value, now)
    }

    /// Apply `effect` to the current dynamics and write the result now.
    pub fn emit<D, F>(&mut self, id: CellId<D>, effect: F) -> CellResult<()>
    where
        D: Dynamics,
        F: FnOnce(D) -> D,
    {
        let current = self.sample(id)?;
        self.set(id, effect(current))
    }

    // ── Change tracking ───────────────────────────────────────────────────────

    /// Drain the set of cells written since the last call.
    pub fn take_written(&mut self) -> BTreeSet<CellKey> {
        std::mem::take(&mut self.written)
    }

    pub fn was_written(&self, key: CellKey) -> bool {
        self.written.contains(&key)
    }
}

impl fmt::Debug for CellStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellStore")
            .field("cells", &self.cells.len())
            .field("now", &self.now)
            .field("pending_writes", &self.written.len())
            .finish()
    }
}
