//! `Engine` — the discrete-event loop.
//!
//! # One step
//!
//! ```text
//! pop earliest (time, task) ──► advance clock ──► start thread if NotStarted
//!        ▲                                               │
//!        │                                    resume(Resume { baton })
//!        │                                               │
//!        │        ◄──── Suspend { baton, reason, spawned } ┘
//!        │
//!   register children, revalidate conditions over written cells,
//!   then act on the reason:
//!     Delay(d)       → push (now + d)
//!     Condition(c)   → evaluate, push (now + offset) if it ever holds
//!     AwaitChildren  → push now once every child is Complete
//!     AwaitTask(t)   → push now once t is Complete
//!     Completed      → Complete; wake waiting parent and listeners
//!     Failed(e)      → abort the run with the task id and time
//! ```
//!
//! The engine and at most one task thread are ever runnable at once: the
//! engine blocks inside `resume` until the task yields, so the cell store
//! has a single owner at every instant and the run is deterministic for a
//! given seed no matter how the OS schedules threads.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use serde_json::Value;

use tl_cells::CellStore;
use tl_conditions::{BoxedCondition, Evaluator, SearchConfig, Window};
use tl_core::{CellKey, Duration, SimClock, SimConfig, SimTime, TaskId, TaskRng};
use tl_schedule::EventQueue;
use tl_task::{
    Baton, BoxedActivity, ChannelError, ModelError, Resume, Side, SpawnRequest, Suspend, SuspendReason, TaskStatus,
    TaskThread, start_task,
};

use crate::observer::SimObserver;
use crate::registry::ModelRegistry;
use crate::results::{SimulationResults, TaskSummary};
use crate::{SimError, SimResult};

// ── Bookkeeping ───────────────────────────────────────────────────────────────

/// A task created before the run starts.
pub(crate) struct RootTask {
    pub start:         Duration,
    pub activity_type: String,
    pub activity:      BoxedActivity,
}

struct TaskRecord {
    parent:        Option<TaskId>,
    activity_type: String,
    status:        TaskStatus,
    /// Taken when the thread starts.
    activity:      Option<BoxedActivity>,
    /// `Some` from first dispatch until completion.
    thread:        Option<TaskThread>,
    start:         Option<SimTime>,
    end:           Option<SimTime>,
    children:      Vec<TaskId>,
    /// Tasks blocked in `wait_for` on this one.
    listeners:     Vec<TaskId>,
}

impl TaskRecord {
    fn new(parent: Option<TaskId>, activity_type: String, activity: BoxedActivity) -> Self {
        TaskRecord {
            parent,
            activity_type,
            status: TaskStatus::NotStarted,
            activity: Some(activity),
            thread: None,
            start: None,
            end: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn summary(&self, id: TaskId) -> TaskSummary {
        TaskSummary {
            id,
            parent: self.parent,
            activity_type: self.activity_type.clone(),
            status: self.status,
            start: self.start,
            end: self.end,
            children: self.children.clone(),
        }
    }
}

struct PendingCondition {
    condition: BoxedCondition,
    /// Cells the last evaluation read.
    deps:      BTreeSet<CellKey>,
}

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct Engine {
    config:           SimConfig,
    clock:            SimClock,
    search:           SearchConfig,
    registry:         ModelRegistry,
    /// `None` only while a task holds control, or after a fatal error took
    /// it down with the task.
    baton:            Option<Baton>,
    tasks:            BTreeMap<TaskId, TaskRecord>,
    queue:            EventQueue,
    conditions:       BTreeMap<TaskId, PendingCondition>,
    /// Reverse index of `conditions`: which waiting tasks read each cell.
    watchers:         FxHashMap<CellKey, BTreeSet<TaskId>>,
    completion_order: Vec<TaskId>,
}

impl Engine {
    pub(crate) fn new(config: SimConfig, registry: ModelRegistry, mut baton: Baton, roots: Vec<RootTask>) -> Self {
        let mut tasks = BTreeMap::new();
        let mut queue = EventQueue::new();
        for root in roots {
            let id = baton.allocate_task_id();
            queue.push(SimTime::ZERO.offset(root.start), id);
            tasks.insert(id, TaskRecord::new(None, root.activity_type, root.activity));
        }

        Engine {
            clock: config.make_clock(),
            search: SearchConfig::from(&config),
            config,
            registry,
            baton: Some(baton),
            tasks,
            queue,
            conditions: BTreeMap::new(),
            watchers: FxHashMap::default(),
            completion_order: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    #[inline]
    pub fn now(&self) -> SimTime {
        self.clock.now
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn cells(&self) -> SimResult<&CellStore> {
        Ok(&self.baton()?.cells)
    }

    /// Value of a registered resource at the current time.
    pub fn sample_resource(&self, name: &str) -> SimResult<Value> {
        self.registry.sample_resource(name, self.cells()?)
    }

    pub fn task_status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(|r| r.status)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Time of the next event that will be dispatched, if any.
    pub fn next_event_time(&self) -> Option<SimTime> {
        let next = self.queue.next_time()?;
        match self.config.end_time() {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }

    // ── Run loop ──────────────────────────────────────────────────────────────

    /// Run until no event remains before the horizon, then tear down every
    /// task thread and report.
    ///
    /// On error the run is over: threads are still torn down, but the engine
    /// cannot be resumed.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<SimulationResults> {
        let outcome = self.run_events(observer);
        self.shutdown();
        outcome?;

        let results = self.results()?;
        for id in &results.incomplete {
            if let Some(task) = results.task(*id) {
                warn!("{id} ({}) did not complete; last status {}", task.activity_type, task.status);
            }
        }
        debug!(
            "run finished at {}: {} tasks, {} complete",
            results.end_time,
            results.tasks.len(),
            results.completion_order.len()
        );
        observer.on_sim_end(&results);
        Ok(results)
    }

    fn run_events<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.step(observer)? {}
        Ok(())
    }

    /// Dispatch the next event.  Returns `false` once nothing is left before
    /// the horizon.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<bool> {
        if self.next_event_time().is_none() {
            return Ok(false);
        }
        let Some((time, task)) = self.queue.pop_next() else {
            return Ok(false);
        };
        self.advance_to(time, observer)?;
        self.dispatch(task, observer)?;
        Ok(true)
    }

    fn advance_to<O: SimObserver>(&mut self, time: SimTime, observer: &mut O) -> SimResult<()> {
        let from = self.now();
        if time > from {
            self.baton_mut()?.cells.advance_to(time)?;
            self.clock.advance_to(time);
            observer.on_time_advanced(from, time);
        }
        Ok(())
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    fn dispatch<O: SimObserver>(&mut self, id: TaskId, observer: &mut O) -> SimResult<()> {
        let now = self.now();
        let seed = self.config.seed;
        self.forget_condition(id);
        self.set_status(id, TaskStatus::InProgress)?;

        let record = self.record_mut(id)?;
        if record.thread.is_none() {
            let activity = record.activity.take().ok_or(SimError::Poisoned)?;
            let thread = start_task(id, record.activity_type.clone(), activity, TaskRng::new(seed, id))
                .map_err(|source| SimError::Thread { task: id, source })?;
            record.thread = Some(thread);
            record.start = Some(now);
            debug!("{id} ({}) dispatched for the first time at {now}", record.activity_type);
            observer.on_task_started(id, &record.activity_type, now);
        }

        let baton = self.baton.take().ok_or(SimError::Poisoned)?;
        let thread = self.record_mut(id)?.thread.as_mut().ok_or(SimError::Poisoned)?;
        let outcome = thread.end.resume(Resume { baton });
        match outcome {
            Ok(suspend) => self.handle_suspend(id, suspend, observer),
            Err(ChannelError::Disconnected { .. }) => Err(self.collect_crash(id)),
            Err(source) => Err(SimError::Protocol { task: id, time: now, source }),
        }
    }

    fn handle_suspend<O: SimObserver>(&mut self, id: TaskId, suspend: Suspend, observer: &mut O) -> SimResult<()> {
        let Suspend { mut baton, reason, spawned } = suspend;
        let written = baton.cells.take_written();
        self.baton = Some(baton);
        let now = self.now();
        trace!("{id} yielded at {now}: {}", reason.label());

        for request in spawned {
            self.register_child(id, request)?;
        }
        self.revalidate(&written)?;

        match reason {
            SuspendReason::Delay(d) => {
                self.set_status(id, TaskStatus::Suspended)?;
                self.queue.push(now.offset(d), id);
            }
            SuspendReason::Condition(condition) => {
                self.set_status(id, TaskStatus::Suspended)?;
                self.watch(id, condition)?;
            }
            SuspendReason::AwaitChildren => {
                self.set_status(id, TaskStatus::AwaitingChildren)?;
                if self.children_complete(id) {
                    self.queue.push(now, id);
                }
            }
            SuspendReason::AwaitTask(target) => {
                self.set_status(id, TaskStatus::Suspended)?;
                self.await_task(id, target)?;
            }
            SuspendReason::Completed => self.complete(id, observer)?,
            SuspendReason::Failed(source) => {
                let activity_type = self.record_mut(id)?.activity_type.clone();
                return Err(SimError::TaskFailed { task: id, activity_type, time: now, source });
            }
        }
        Ok(())
    }

    fn register_child(&mut self, parent: TaskId, request: SpawnRequest) -> SimResult<()> {
        let SpawnRequest { id, activity_type, activity, delay } = request;
        let at = self.now().offset(delay);
        trace!("{parent} spawned {id} ({activity_type}) for {at}");
        self.record_mut(parent)?.children.push(id);
        self.tasks.insert(id, TaskRecord::new(Some(parent), activity_type, activity));
        self.queue.push(at, id);
        Ok(())
    }

    fn await_task(&mut self, waiter: TaskId, target: TaskId) -> SimResult<()> {
        let now = self.now();
        let Some(record) = self.tasks.get_mut(&target) else {
            let activity_type = self.record_mut(waiter)?.activity_type.clone();
            return Err(SimError::TaskFailed {
                task: waiter,
                activity_type,
                time: now,
                source: ModelError::failed(format!("waited for {target}, which does not exist")),
            });
        };
        if record.status.is_complete() {
            self.queue.push(now, waiter);
        } else {
            record.listeners.push(waiter);
        }
        Ok(())
    }

    fn complete<O: SimObserver>(&mut self, id: TaskId, observer: &mut O) -> SimResult<()> {
        let now = self.now();
        self.set_status(id, TaskStatus::Complete)?;

        let record = self.record_mut(id)?;
        record.end = Some(now);
        let thread = record.thread.take();
        let listeners = mem::take(&mut record.listeners);
        let parent = record.parent;
        let summary = record.summary(id);

        debug!("{id} ({}) complete at {now}", summary.activity_type);
        self.completion_order.push(id);
        observer.on_task_completed(&summary);

        // The thread exits right after its final yield.
        if let Some(thread) = thread {
            join_thread(id, thread);
        }

        for listener in listeners {
            self.queue.push(now, listener);
        }
        if let Some(parent) = parent {
            let waiting = self.tasks.get(&parent).is_some_and(|p| p.status == TaskStatus::AwaitingChildren);
            if waiting && self.children_complete(parent) {
                self.queue.push(now, parent);
            }
        }
        Ok(())
    }

    fn children_complete(&self, id: TaskId) -> bool {
        self.tasks.get(&id).is_none_or(|record| {
            record.children.iter().all(|child| self.tasks.get(child).is_some_and(|c| c.status.is_complete()))
        })
    }

    // ── Conditions ────────────────────────────────────────────────────────────

    /// Evaluate `condition` from now and schedule `id` at the predicted
    /// instant.  A condition that never holds leaves the task parked until a
    /// cell it read is written.
    fn watch(&mut self, id: TaskId, condition: BoxedCondition) -> SimResult<()> {
        let now = self.now();
        // Nothing past the horizon is dispatched, so nothing past it is searched.
        let window = match self.config.end_time() {
            Some(end) => Window::new(Duration::ZERO, end - now),
            None => Window::from_now(),
        };
        let (crossing, deps) = {
            let evaluator = Evaluator::new(&self.baton()?.cells, self.search);
            let crossing = evaluator
                .next_satisfied_within(&*condition, window)
                .map_err(|source| SimError::Condition { task: id, time: now, source })?;
            (crossing, evaluator.into_reads())
        };

        if crossing.is_low_confidence() {
            warn!("{id}: condition predicted by search with low confidence; the predicate may change more than once or briefly between samples");
        }
        match crossing.offset {
            Some(offset) => {
                let at = now.offset(offset);
                trace!("{id} waits on {} cells, predicted {at}", deps.len());
                self.queue.push(at, id);
            }
            None => {
                trace!("{id} waits on {} cells, never satisfied as things stand", deps.len());
                self.queue.cancel(id);
            }
        }

        for key in &deps {
            self.watchers.entry(*key).or_default().insert(id);
        }
        self.conditions.insert(id, PendingCondition { condition, deps });
        Ok(())
    }

    fn forget_condition(&mut self, id: TaskId) -> Option<PendingCondition> {
        let pending = self.conditions.remove(&id)?;
        for key in &pending.deps {
            if let Some(waiting) = self.watchers.get_mut(key) {
                waiting.remove(&id);
                if waiting.is_empty() {
                    self.watchers.remove(key);
                }
            }
        }
        Some(pending)
    }

    /// Re-evaluate every waiting condition that read one of `written`.
    /// Re-evaluation starts at the current time, so a prediction never moves
    /// into the past.
    fn revalidate(&mut self, written: &BTreeSet<CellKey>) -> SimResult<()> {
        let affected: BTreeSet<TaskId> =
            written.iter().filter_map(|key| self.watchers.get(key)).flatten().copied().collect();
        for id in affected {
            if let Some(pending) = self.forget_condition(id) {
                trace!("revalidating condition of {id}");
                self.watch(id, pending.condition)?;
            }
        }
        Ok(())
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// The task thread hung up mid-turn.  Join it to tell a panic from a
    /// protocol violation.
    fn collect_crash(&mut self, id: TaskId) -> SimError {
        let time = self.now();
        let Some(record) = self.tasks.get_mut(&id) else {
            return SimError::UnknownTask(id);
        };
        let Some(TaskThread { end, handle }) = record.thread.take() else {
            return SimError::Poisoned;
        };
        drop(end);
        match handle.join() {
            Err(payload) => SimError::TaskPanicked {
                task: id,
                activity_type: record.activity_type.clone(),
                time,
                message: panic_message(payload.as_ref()),
            },
            Ok(()) => SimError::Protocol { task: id, time, source: ChannelError::Disconnected { side: Side::Task } },
        }
    }

    /// Hang up on every live task thread and join it.  Tasks blocked in a
    /// suspension point see `ModelError::Aborted` and unwind.
    fn shutdown(&mut self) {
        let live: Vec<(TaskId, TaskThread)> =
            self.tasks.iter_mut().filter_map(|(id, r)| r.thread.take().map(|t| (*id, t))).collect();
        if !live.is_empty() {
            debug!("tearing down {} task threads", live.len());
        }
        for (id, thread) in live {
            join_thread(id, thread);
        }
    }

    fn results(&self) -> SimResult<SimulationResults> {
        let cells = self.cells()?;
        let tasks: Vec<TaskSummary> = self.tasks.iter().map(|(id, r)| r.summary(*id)).collect();
        let incomplete = tasks.iter().filter(|t| !t.status.is_complete()).map(|t| t.id).collect();
        Ok(SimulationResults {
            end_time: self.now(),
            tasks,
            completion_order: self.completion_order.clone(),
            incomplete,
            profiles: self.registry.export_profiles(cells)?,
            resources: self.registry.sample_all(cells)?,
        })
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn baton(&self) -> SimResult<&Baton> {
        self.baton.as_ref().ok_or(SimError::Poisoned)
    }

    fn baton_mut(&mut self) -> SimResult<&mut Baton> {
        self.baton.as_mut().ok_or(SimError::Poisoned)
    }

    fn record_mut(&mut self, id: TaskId) -> SimResult<&mut TaskRecord> {
        self.tasks.get_mut(&id).ok_or(SimError::UnknownTask(id))
    }

    fn set_status(&mut self, id: TaskId, next: TaskStatus) -> SimResult<()> {
        let time = self.now();
        let record = self.record_mut(id)?;
        if !record.status.can_become(next) {
            return Err(SimError::IllegalTransition { task: id, from: record.status, to: next, time });
        }
        record.status = next;
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_thread(id: TaskId, thread: TaskThread) {
    let TaskThread { end, handle } = thread;
    drop(end);
    if handle.join().is_err() {
        warn!("{id}: task thread panicked during teardown");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
