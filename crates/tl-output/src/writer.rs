//! The `OutputWriter` trait implemented by all backend writers.

use crate::{OutputResult, ProfileRow, TaskRow};

/// Errors are returned to the caller; [`TraceObserver`](crate::TraceObserver)
/// keeps the first one for [`take_error`](crate::TraceObserver::take_error).
pub trait OutputWriter {
    fn write_tasks(&mut self, rows: &[TaskRow]) -> OutputResult<()>;

    fn write_profiles(&mut self, rows: &[ProfileRow]) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
