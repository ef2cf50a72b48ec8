use thiserror::Error;

use tl_core::{CellKey, SimTime};

/// Errors raised by the cell store.
///
/// `OutOfOrderRead`, `NonMonotonicWrite` and `FutureWrite` are protocol
/// violations: the engine treats them as fatal for the run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("unknown cell {0}")]
    UnknownCell(CellKey),

    #[error("cell {cell} holds `{actual}`, not the requested dynamics type")]
    TypeMismatch {
        cell:   CellKey,
        actual: &'static str,
    },

    #[error("out-of-order read of cell {cell}: requested {requested}, but the clock is at {now}")]
    OutOfOrderRead {
        cell:      CellKey,
        requested: SimTime,
        now:       SimTime,
    },

    #[error("non-monotonic write to cell {cell}: write at {at} precedes last recorded time {last}")]
    NonMonotonicWrite {
        cell: CellKey,
        at:   SimTime,
        last: SimTime,
    },

    #[error("write to cell {cell} at {at} is ahead of the clock ({now})")]
    FutureWrite {
        cell: CellKey,
        at:   SimTime,
        now:  SimTime,
    },

    #[error("cell {cell} has no value at {requested}; it was created at {created}")]
    NoValueAt {
        cell:      CellKey,
        requested: SimTime,
        created:   SimTime,
    },

    #[error("clock cannot move backwards from {now} to {requested}")]
    ClockRewind {
        now:       SimTime,
        requested: SimTime,
    },
}

pub type CellResult<T> = Result<T, CellError>;
