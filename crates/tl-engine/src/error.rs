use thiserror::Error;

use tl_cells::CellError;
use tl_core::{CoreError, SimTime, TaskId};
use tl_schedule::ScheduleError;
use tl_task::{ChannelError, ModelError, TaskStatus};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("unknown activity type `{0}`")]
    UnknownActivityType(String),

    #[error("invalid parameters for `{activity_type}`: {reason}")]
    InvalidParameters { activity_type: String, reason: String },

    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    /// A plan directive was rejected while building the run.
    #[error("plan directive {index}: {source}")]
    Directive {
        index:  usize,
        #[source]
        source: Box<SimError>,
    },

    #[error("{task} ({activity_type}) failed at {time}: {source}")]
    TaskFailed {
        task:          TaskId,
        activity_type: String,
        time:          SimTime,
        #[source]
        source:        ModelError,
    },

    #[error("{task} ({activity_type}) panicked at {time}: {message}")]
    TaskPanicked {
        task:          TaskId,
        activity_type: String,
        time:          SimTime,
        message:       String,
    },

    #[error("control protocol violated by {task} at {time}: {source}")]
    Protocol {
        task:   TaskId,
        time:   SimTime,
        #[source]
        source: ChannelError,
    },

    #[error("{task} cannot move from {from} to {to} at {time}")]
    IllegalTransition { task: TaskId, from: TaskStatus, to: TaskStatus, time: SimTime },

    #[error("condition of {task} could not be evaluated at {time}: {source}")]
    Condition {
        task:   TaskId,
        time:   SimTime,
        #[source]
        source: CellError,
    },

    #[error("no such task: {0}")]
    UnknownTask(TaskId),

    #[error("could not start thread for {task}: {source}")]
    Thread {
        task:   TaskId,
        #[source]
        source: std::io::Error,
    },

    /// The engine lost its cell store to an earlier fatal error.
    #[error("engine state was lost after an earlier fatal error")]
    Poisoned,

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
