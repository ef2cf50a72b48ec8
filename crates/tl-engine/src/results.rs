//! What a finished run reports.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use tl_core::{CellKey, SimTime, TaskId};
use tl_task::TaskStatus;

use crate::SimResult;

/// One task's lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskSummary {
    pub id:            TaskId,
    pub parent:        Option<TaskId>,
    pub activity_type: String,
    pub status:        TaskStatus,
    /// First dispatch.  `None` if the task never started.
    pub start:         Option<SimTime>,
    /// Completion.  `None` unless `status` is `Complete`.
    pub end:           Option<SimTime>,
    pub children:      Vec<TaskId>,
}

/// One segment of a cell's history: the dynamics in force from `start` until
/// the next segment.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileSegment {
    pub start:    SimTime,
    pub dynamics: Value,
}

/// The full write history of a tracked cell.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Profile {
    /// Cell names need not be unique; the key is.
    pub cell:     CellKey,
    pub name:     String,
    pub segments: Vec<ProfileSegment>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResults {
    /// Time of the last dispatched event.
    pub end_time:         SimTime,
    /// Every task the run created, in id order.
    pub tasks:            Vec<TaskSummary>,
    pub completion_order: Vec<TaskId>,
    /// Tasks still pending when the run stopped (horizon reached or blocked
    /// forever).
    pub incomplete:       Vec<TaskId>,
    pub profiles:         Vec<Profile>,
    /// Final value of every registered resource.
    pub resources:        BTreeMap<String, Value>,
}

impl SimulationResults {
    pub fn task(&self, id: TaskId) -> Option<&TaskSummary> {
        self.tasks.binary_search_by_key(&id, |t| t.id).ok().map(|i| &self.tasks[i])
    }

    /// Tasks of one activity type, in id order.
    pub fn tasks_of<'a>(&'a self, activity_type: &'a str) -> impl Iterator<Item = &'a TaskSummary> + 'a {
        self.tasks.iter().filter(move |t| t.activity_type == activity_type)
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn all_complete(&self) -> bool {
        self.incomplete.is_empty()
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
