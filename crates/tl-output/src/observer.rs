//! `TraceObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use tl_engine::{SimObserver, SimulationResults};

use crate::row::{ProfileRow, TaskRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes the task table and every tracked profile
/// to any [`OutputWriter`] backend when the run ends.
///
/// Errors from the writer are stored internally because `SimObserver`
/// methods have no return value.  After `engine.run()` returns, check for
/// errors with [`take_error`][Self::take_error].
pub struct TraceObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> TraceObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after `engine.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for TraceObserver<W> {
    fn on_sim_end(&mut self, results: &SimulationResults) {
        let tasks: Vec<TaskRow> = results.tasks.iter().map(TaskRow::from).collect();
        let result = self.writer.write_tasks(&tasks);
        self.store_err(result);

        let profiles: Vec<ProfileRow> = results.profiles.iter().flat_map(ProfileRow::from_profile).collect();
        let result = self.writer.write_profiles(&profiles);
        self.store_err(result);

        let result = self.writer.finish();
        self.store_err(result);
    }
}
