//! Task lifecycle.
//!
//! ```text
//! NotStarted ──► InProgress ──► Suspended ─────────┐
//!                    ▲  │                          │
//!                    │  ├─────► AwaitingChildren ──┤
//!                    │  │                          │
//!                    └──┼──────────────────────────┘
//!                       └─────► Complete (terminal)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    AwaitingChildren,
    Suspended,
    Complete,
}

impl TaskStatus {
    /// Whether `self → next` is a legal lifecycle step.
    pub fn can_become(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, Suspended)
                | (InProgress, AwaitingChildren)
                | (InProgress, Complete)
                | (Suspended, InProgress)
                | (AwaitingChildren, InProgress)
        )
    }

    #[inline]
    pub fn is_complete(self) -> bool {
        self == TaskStatus::Complete
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::AwaitingChildren => "awaiting_children",
            TaskStatus::Suspended => "suspended",
            TaskStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
