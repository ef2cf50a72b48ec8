//! `PriorityLock`: exclusive access granted in priority order, held in cells.

use std::fmt::Debug;
use std::marker::PhantomData;

use log::trace;
use serde::{Deserialize, Serialize};

use tl_cells::{CellId, CellResult, CellStore, Discrete};
use tl_conditions::when;
use tl_core::TaskId;
use tl_task::{ModelResult, TaskContext};

use crate::{LockError, LockResult};

/// Three-level priority for the common case.  Any `Ord` type works.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waiter<P> {
    pub task:     TaskId,
    pub priority: P,
}

pub type HolderCell = CellId<Discrete<Option<TaskId>>>;
pub type QueueCell<P> = CellId<Discrete<Vec<Waiter<P>>>>;

/// Handle to a lock whose state lives in the cell store.  Cheap to copy
/// into every activity that needs it.
pub struct PriorityLock<P> {
    holder: HolderCell,
    queue:  QueueCell<P>,
    _p:     PhantomData<fn() -> P>,
}

impl<P> Clone for PriorityLock<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PriorityLock<P> {}

impl<P> Debug for PriorityLock<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriorityLock").field("holder", &self.holder).field("queue", &self.queue).finish()
    }
}

impl<P> PriorityLock<P>
where
    P: Ord + Clone + Debug + Send + Sync + 'static,
{
    /// Allocate a free lock in `cells` (before the run).
    pub fn new(cells: &mut CellStore, name: &str) -> Self {
        PriorityLock {
            holder: cells.allocate(format!("{name}.holder"), Discrete(None)),
            queue: cells.allocate(format!("{name}.queue"), Discrete(Vec::new())),
            _p: PhantomData,
        }
    }

    /// Allocate a free lock from inside a running task.
    pub fn create(ctx: &mut TaskContext, name: &str) -> ModelResult<Self> {
        Ok(PriorityLock {
            holder: ctx.allocate(format!("{name}.holder"), Discrete(None))?,
            queue: ctx.allocate(format!("{name}.queue"), Discrete(Vec::new()))?,
            _p: PhantomData,
        })
    }

    pub fn holder_cell(&self) -> HolderCell {
        self.holder
    }

    pub fn queue_cell(&self) -> QueueCell<P> {
        self.queue
    }

    pub fn holder(&self, cells: &CellStore) -> CellResult<Option<TaskId>> {
        Ok(cells.read(self.holder)?.0)
    }

    /// Waiters in grant order.
    pub fn waiting(&self, cells: &CellStore) -> CellResult<Vec<Waiter<P>>> {
        Ok(cells.read(self.queue)?.0.clone())
    }

    /// Take the lock, suspending until it is granted if it is held.
    pub fn acquire(&self, ctx: &mut TaskContext, priority: P) -> LockResult<()> {
        let me = ctx.id();
        let holder = ctx.get(self.holder)?;
        let queue = ctx.get(self.queue)?;
        if holder == Some(me) || queue.iter().any(|w| w.task == me) {
            return Err(LockError::AlreadyRequested { task: me });
        }

        if holder.is_none() {
            trace!("{me} took a free lock");
            ctx.set(self.holder, Discrete(Some(me)))?;
            return Ok(());
        }

        ctx.emit(self.queue, move |Discrete(mut queue)| {
            let slot = queue.partition_point(|w| w.priority >= priority);
            queue.insert(slot, Waiter { task: me, priority });
            Discrete(queue)
        })?;
        trace!("{me} queued behind {holder:?}");
        ctx.wait_until(when(self.holder, move |h: &Option<TaskId>| *h == Some(me)))?;
        Ok(())
    }

    /// Give the lock up.  The head of the queue, if any, becomes the holder
    /// at the same instant.
    pub fn release(&self, ctx: &mut TaskContext) -> LockResult<()> {
        let me = ctx.id();
        let holder = ctx.get(self.holder)?;
        if holder != Some(me) {
            return Err(LockError::NotHolder { task: me, holder });
        }

        let mut queue = ctx.get(self.queue)?;
        if queue.is_empty() {
            ctx.set(self.holder, Discrete(None))?;
            trace!("{me} released; lock is free");
        } else {
            let next = queue.remove(0);
            ctx.set(self.queue, Discrete(queue))?;
            ctx.set(self.holder, Discrete(Some(next.task)))?;
            trace!("{me} released; handed to {}", next.task);
        }
        Ok(())
    }

    /// Acquire, run `f`, release.  The lock is released even if `f` fails;
    /// `f`'s error wins over a release error.
    pub fn using<T, F>(&self, ctx: &mut TaskContext, priority: P, f: F) -> ModelResult<T>
    where
        F: FnOnce(&mut TaskContext) -> ModelResult<T>,
    {
        self.acquire(ctx, priority)?;
        let outcome = f(ctx);
        let released = self.release(ctx);
        let value = outcome?;
        released?;
        Ok(value)
    }
}
