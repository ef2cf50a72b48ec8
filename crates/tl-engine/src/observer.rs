//! `SimObserver` — hook into the event loop without modifying it.
//!
//! All methods have default no-op implementations so callers only override
//! what they need.
//!
//! Observers run on the engine thread while it holds control, so they see a
//! consistent store and never race a task.

use tl_core::{SimTime, TaskId};

use crate::results::{SimulationResults, TaskSummary};

pub trait SimObserver {
    /// Called when the clock moves forward, before the first event at `to`
    /// is dispatched.
    fn on_time_advanced(&mut self, _from: SimTime, _to: SimTime) {}

    /// Called when a task is dispatched for the first time.
    fn on_task_started(&mut self, _task: TaskId, _activity_type: &str, _at: SimTime) {}

    /// Called once per task when it completes.
    fn on_task_completed(&mut self, _summary: &TaskSummary) {}

    /// Called once after the last event, with the final results.
    fn on_sim_end(&mut self, _results: &SimulationResults) {}
}

/// A `SimObserver` that does nothing.  Use when you don't need callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
