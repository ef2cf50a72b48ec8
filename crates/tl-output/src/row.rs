//! Plain data row types written by output backends.

use tl_engine::{Profile, TaskSummary};

/// One task's lifecycle.  Times are microseconds since plan start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub task_id:       u64,
    pub parent_id:     Option<u64>,
    pub activity_type: String,
    pub status:        &'static str,
    pub start_micros:  Option<i64>,
    pub end_micros:    Option<i64>,
    pub child_count:   u32,
}

impl From<&TaskSummary> for TaskRow {
    fn from(t: &TaskSummary) -> Self {
        TaskRow {
            task_id:       t.id.0,
            parent_id:     t.parent.map(|p| p.0),
            activity_type: t.activity_type.clone(),
            status:        t.status.as_str(),
            start_micros:  t.start.map(|s| s.micros()),
            end_micros:    t.end.map(|e| e.micros()),
            child_count:   t.children.len() as u32,
        }
    }
}

/// One history segment of a tracked cell, keyed by `(cell, segment)`.
/// `dynamics` is the segment's serde JSON form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub cell:         u32,
    pub resource:     String,
    pub segment:      u32,
    pub start_micros: i64,
    pub dynamics:     String,
}

impl ProfileRow {
    pub fn from_profile(profile: &Profile) -> Vec<ProfileRow> {
        profile
            .segments
            .iter()
            .enumerate()
            .map(|(i, s)| ProfileRow {
                cell:         profile.cell.0,
                resource:     profile.name.clone(),
                segment:      i as u32,
                start_micros: s.start.micros(),
                dynamics:     s.dynamics.to_string(),
            })
            .collect()
    }
}
