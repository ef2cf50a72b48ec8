//! `EventQueue` — the engine's ordered set of pending task resumptions.
//!
//! # Design
//!
//! A task has at most one pending resumption.  Events are keyed by
//! `(SimTime, TaskId)`; `BTreeMap<SimTime, BTreeSet<TaskId>>` keeps both keys
//! ordered so `pop_next` is the smallest time and, within it, the earliest
//! created task.  A side index `FxHashMap<TaskId, SimTime>` makes
//! rescheduling and cancellation O(log W) instead of a scan.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;

use tl_core::{SimTime, TaskId};

#[derive(Default, Debug)]
pub struct EventQueue {
    by_time: BTreeMap<SimTime, BTreeSet<TaskId>>,
    by_task: FxHashMap<TaskId, SimTime>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` at `time`, replacing any event it already had.
    pub fn push(&mut self, time: SimTime, task: TaskId) {
        self.cancel(task);
        self.by_time.entry(time).or_default().insert(task);
        self.by_task.insert(task, time);
    }

    /// Remove `task`'s pending event.  Returns the time it was scheduled at.
    pub fn cancel(&mut self, task: TaskId) -> Option<SimTime> {
        let time = self.by_task.remove(&task)?;
        if let Some(tasks) = self.by_time.get_mut(&time) {
            tasks.remove(&task);
            if tasks.is_empty() {
                self.by_time.remove(&time);
            }
        }
        Some(time)
    }

    /// Remove and return the earliest event.
    pub fn pop_next(&mut self) -> Option<(SimTime, TaskId)> {
        let mut entry = self.by_time.first_entry()?;
        let time = *entry.key();
        let task = entry.get_mut().pop_first()?;
        if entry.get().is_empty() {
            entry.remove();
        }
        self.by_task.remove(&task);
        Some((time, task))
    }

    /// Time of the earliest event, without removing it.
    pub fn next_time(&self) -> Option<SimTime> {
        self.by_time.keys().next().copied()
    }

    pub fn scheduled_time(&self, task: TaskId) -> Option<SimTime> {
        self.by_task.get(&task).copied()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.by_task.contains_key(&task)
    }

    pub fn len(&self) -> usize {
        self.by_task.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_task.is_empty()
    }

    /// Pending tasks in dispatch order.
    pub fn pending(&self) -> impl Iterator<Item = (SimTime, TaskId)> + '_ {
        self.by_time.iter().flat_map(|(t, tasks)| tasks.iter().map(move |id| (*t, *id)))
    }
}
