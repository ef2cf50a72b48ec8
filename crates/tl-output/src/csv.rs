//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `tasks.csv`
//! - `profiles.csv`
//!
//! Missing optional values are written as empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{OutputResult, ProfileRow, TaskRow};

pub struct CsvWriter {
    tasks:    Writer<File>,
    profiles: Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut tasks = Writer::from_path(dir.join("tasks.csv"))?;
        tasks.write_record([
            "task_id",
            "parent_id",
            "activity_type",
            "status",
            "start_micros",
            "end_micros",
            "child_count",
        ])?;

        let mut profiles = Writer::from_path(dir.join("profiles.csv"))?;
        profiles.write_record(["cell", "resource", "segment", "start_micros", "dynamics"])?;

        Ok(Self { tasks, profiles, finished: false })
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl OutputWriter for CsvWriter {
    fn write_tasks(&mut self, rows: &[TaskRow]) -> OutputResult<()> {
        for row in rows {
            self.tasks.write_record(&[
                row.task_id.to_string(),
                opt(row.parent_id),
                row.activity_type.clone(),
                row.status.to_string(),
                opt(row.start_micros),
                opt(row.end_micros),
                row.child_count.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_profiles(&mut self, rows: &[ProfileRow]) -> OutputResult<()> {
        for row in rows {
            self.profiles.write_record(&[
                row.cell.to_string(),
                row.resource.clone(),
                row.segment.to_string(),
                row.start_micros.to_string(),
                row.dynamics.clone(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.tasks.flush()?;
        self.profiles.flush()?;
        Ok(())
    }
}
