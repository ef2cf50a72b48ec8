//! `TaskContext` — everything an effect model can do.
//!
//! The context is the explicit replacement for ambient "current simulation"
//! state: the current time, the cell store, child spawning, and suspension
//! all go through it.  It is handed to the model by `&mut` and lives exactly
//! as long as the task.

use std::mem;

use log::trace;

use tl_cells::{CellId, CellStore, Dynamics, Querier, Resource};
use tl_conditions::{BoxedCondition, Condition};
use tl_core::{Duration, SimTime, TaskId, TaskRng};

use crate::activity::{Activity, BoxedActivity};
use crate::channel::TaskEnd;
use crate::error::{ChannelError, ModelError, ModelResult};

// ── Messages ──────────────────────────────────────────────────────────────────

/// The state that travels with control.
pub struct Baton {
    pub cells:     CellStore,
    /// Next task id to hand out.  Shared by the engine and every task, so ids
    /// follow global creation order.
    pub next_task: TaskId,
}

impl Baton {
    pub fn new(cells: CellStore) -> Self {
        Baton { cells, next_task: TaskId(0) }
    }

    pub fn allocate_task_id(&mut self) -> TaskId {
        let id = self.next_task;
        self.next_task = id.next();
        id
    }
}

/// Engine → task.
pub struct Resume {
    pub baton: Baton,
}

/// Why a task handed control back.
pub enum SuspendReason {
    Delay(Duration),
    Condition(BoxedCondition),
    AwaitChildren,
    AwaitTask(TaskId),
    Completed,
    Failed(ModelError),
}

impl SuspendReason {
    pub fn label(&self) -> &'static str {
        match self {
            SuspendReason::Delay(_) => "delay",
            SuspendReason::Condition(_) => "condition",
            SuspendReason::AwaitChildren => "await_children",
            SuspendReason::AwaitTask(_) => "await_task",
            SuspendReason::Completed => "completed",
            SuspendReason::Failed(_) => "failed",
        }
    }
}

/// A child created during the task's turn.
pub struct SpawnRequest {
    pub id:            TaskId,
    pub activity_type: String,
    pub activity:      BoxedActivity,
    /// Offset from the parent's current time at which the child starts.
    pub delay:         Duration,
}

/// Task → engine.
pub struct Suspend {
    pub baton:   Baton,
    pub reason:  SuspendReason,
    pub spawned: Vec<SpawnRequest>,
}

// ── TaskContext ───────────────────────────────────────────────────────────────

pub struct TaskContext {
    id:            TaskId,
    activity_type: String,
    end:           TaskEnd<Resume, Suspend>,
    /// `Some` while the task holds control.
    baton:         Option<Baton>,
    spawned:       Vec<SpawnRequest>,
    children:      Vec<TaskId>,
    rng:           TaskRng,
}

impl TaskContext {
    pub(crate) fn new(id: TaskId, activity_type: String, end: TaskEnd<Resume, Suspend>, rng: TaskRng) -> Self {
        TaskContext {
            id,
            activity_type,
            end,
            baton: None,
            spawned: Vec::new(),
            children: Vec::new(),
            rng,
        }
    }

    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    /// Children spawned so far, in creation order.
    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn rng(&mut self) -> &mut TaskRng {
        &mut self.rng
    }

    fn baton(&self) -> ModelResult<&Baton> {
        self.baton.as_ref().ok_or(ModelError::Aborted)
    }

    fn baton_mut(&mut self) -> ModelResult<&mut Baton> {
        self.baton.as_mut().ok_or(ModelError::Aborted)
    }

    /// Read-only view of the whole store.
    pub fn cells(&self) -> ModelResult<&CellStore> {
        Ok(&self.baton()?.cells)
    }

    pub fn now(&self) -> ModelResult<SimTime> {
        Ok(self.baton()?.cells.now())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    /// Current value of a cell.
    pub fn get<D: Dynamics>(&self, cell: CellId<D>) -> ModelResult<D::Value> {
        Ok(self.baton()?.cells.sample(cell)?.extract())
    }

    /// Current dynamics of a cell.
    pub fn dynamics<D: Dynamics>(&self, cell: CellId<D>) -> ModelResult<D> {
        Ok(self.baton()?.cells.sample(cell)?)
    }

    /// Dynamics of a cell as they stood at an earlier time.
    pub fn read_at<D: Dynamics>(&self, cell: CellId<D>, t: SimTime) -> ModelResult<D> {
        Ok(self.baton()?.cells.sample_at(cell, t)?)
    }

    /// Current value of a derived resource.
    pub fn value<R: Resource>(&self, resource: &R) -> ModelResult<<R::Dyn as Dynamics>::Value> {
        let querier = Querier::new(&self.baton()?.cells);
        Ok(resource.value(&querier)?)
    }

    // ── Writes ────────────────────────────────────────────────────────────────

    pub fn allocate<D: Dynamics>(&mut self, name: impl Into<String>, initial: D) -> ModelResult<CellId<D>> {
        Ok(self.baton_mut()?.cells.allocate(name, initial))
    }

    /// Replace a cell's dynamics from now on.
    pub fn set<D: Dynamics>(&mut self, cell: CellId<D>, value: D) -> ModelResult<()> {
        Ok(self.baton_mut()?.cells.set(cell, value)?)
    }

    /// Apply an effect to a cell's current dynamics.
    pub fn emit<D, F>(&mut self, cell: CellId<D>, effect: F) -> ModelResult<()>
    where
        D: Dynamics,
        F: FnOnce(D) -> D,
    {
        Ok(self.baton_mut()?.cells.emit(cell, effect)?)
    }

    // ── Children ──────────────────────────────────────────────────────────────

    /// Start a child task at the current time.  It runs after this task
    /// yields.
    pub fn spawn<A: Activity>(&mut self, activity_type: impl Into<String>, activity: A) -> ModelResult<TaskId> {
        self.defer(Duration::ZERO, activity_type, activity)
    }

    /// Start a child task `delay` after the current time.
    pub fn defer<A: Activity>(
        &mut self,
        delay: Duration,
        activity_type: impl Into<String>,
        activity: A,
    ) -> ModelResult<TaskId> {
        if delay.is_negative() {
            return Err(ModelError::NegativeDelay(delay));
        }
        let id = self.baton_mut()?.allocate_task_id();
        self.spawned.push(SpawnRequest {
            id,
            activity_type: activity_type.into(),
            activity: Box::new(activity),
            delay,
        });
        self.children.push(id);
        Ok(id)
    }

    /// Spawn a daemon child that waits for `trigger()` to hold, runs
    /// `action`, and waits again for the rest of the run.  The condition is
    /// rebuilt by `trigger` for every round.  `action` must make it false, or
    /// the daemon fires again at the same instant.
    ///
    /// The daemon never completes, so neither does this task; both end the
    /// run as incomplete.
    pub fn whenever<T, C, F>(&mut self, activity_type: impl Into<String>, trigger: T, mut action: F) -> ModelResult<TaskId>
    where
        T: Fn() -> C + Send + 'static,
        C: Condition,
        F: FnMut(&mut TaskContext) -> ModelResult<()> + Send + 'static,
    {
        self.spawn(activity_type, move |ctx: &mut TaskContext| -> ModelResult<()> {
            loop {
                ctx.wait_until(trigger())?;
                action(ctx)?;
            }
        })
    }

    // ── Suspension points ─────────────────────────────────────────────────────

    /// Resume after `duration` of simulated time.
    pub fn delay(&mut self, duration: Duration) -> ModelResult<()> {
        if duration.is_negative() {
            return Err(ModelError::NegativeDelay(duration));
        }
        self.suspend(SuspendReason::Delay(duration))
    }

    /// Resume at the earliest time `condition` holds.  Returns immediately
    /// (after yielding once) if it already holds.
    pub fn wait_until<C: Condition>(&mut self, condition: C) -> ModelResult<()> {
        self.suspend(SuspendReason::Condition(Box::new(condition)))
    }

    /// Resume once every child spawned so far has completed.
    pub fn wait_for_children(&mut self) -> ModelResult<()> {
        if self.children.is_empty() {
            return Ok(());
        }
        self.suspend(SuspendReason::AwaitChildren)
    }

    /// Resume once `task` has completed.
    pub fn wait_for(&mut self, task: TaskId) -> ModelResult<()> {
        self.suspend(SuspendReason::AwaitTask(task))
    }

    fn suspend(&mut self, reason: SuspendReason) -> ModelResult<()> {
        trace!("{} ({}) suspends: {}", self.id, self.activity_type, reason.label());
        self.hand_back(reason)?;
        self.acquire()
    }

    // ── Control plumbing (used by the runner) ────────────────────────────────

    /// Block until the engine hands over control and the baton.
    pub(crate) fn acquire(&mut self) -> ModelResult<()> {
        let Resume { baton } = self.end.take_control().map_err(aborted_on_disconnect)?;
        self.baton = Some(baton);
        Ok(())
    }

    /// Return the baton and control to the engine.
    pub(crate) fn hand_back(&mut self, reason: SuspendReason) -> ModelResult<()> {
        let baton = self.baton.take().ok_or(ModelError::Aborted)?;
        let spawned = mem::take(&mut self.spawned);
        self.end
            .yield_control(Suspend { baton, reason, spawned })
            .map_err(aborted_on_disconnect)
    }
}

/// A hung-up engine means the run is over; everything else is a protocol bug.
fn aborted_on_disconnect(err: ChannelError) -> ModelError {
    match err {
        ChannelError::Disconnected { .. } => ModelError::Aborted,
        other => ModelError::Channel(other),
    }
}
