use thiserror::Error;

use tl_cells::CellError;
use tl_core::Duration;

use crate::channel::Side;

/// Control-channel protocol violations.  Always fatal for the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("{side} took control twice without yielding")]
    DoubleTake { side: Side },

    #[error("{side} yielded control it did not hold")]
    YieldWithoutControl { side: Side },

    #[error("control arrived at {side}, but the holder flag names {holder}")]
    HandoffMismatch { side: Side, holder: Side },

    #[error("{side} hung up the control channel")]
    Disconnected { side: Side },
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors an effect model can raise or receive.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model reported failure.
    #[error("activity failed: {0}")]
    Failed(String),

    #[error("invalid activity parameters: {0}")]
    InvalidParameters(String),

    #[error("cannot delay by a negative span ({0})")]
    NegativeDelay(Duration),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The run is being torn down; the model should return promptly.
    #[error("simulation aborted")]
    Aborted,

    /// Errors from model-level utilities (e.g. locks) propagated with `?`.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ModelError {
    pub fn failed(msg: impl Into<String>) -> Self {
        ModelError::Failed(msg.into())
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
