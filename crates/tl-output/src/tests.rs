//! Tests for tl-output.

use tempfile::TempDir;

use tl_cells::Linear;
use tl_core::{Duration, SimConfig};
use tl_engine::{SimBuilder, SimulationResults};
use tl_task::{ModelResult, TaskContext};

use crate::{CsvWriter, OutputWriter, ProfileRow, TaskRow, TraceObserver};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

/// Parent at t+1s spawns one child that drains `battery` for 10 s.
fn small_run<W: OutputWriter>(observer: &mut TraceObserver<W>) -> SimulationResults {
    let mut builder = SimBuilder::new(SimConfig::default());
    let battery = builder.allocate("battery", Linear::constant(100.0));
    builder.registry_mut().track(battery);
    let mut engine = builder
        .spawn_at(Duration::from_secs(1), "pass", move |ctx: &mut TaskContext| -> ModelResult<()> {
            ctx.spawn("drain", move |ctx: &mut TaskContext| -> ModelResult<()> {
                ctx.emit(battery, |b| b.with_rate(-2.0))?;
                ctx.delay(Duration::from_secs(10))?;
                ctx.emit(battery, |b| b.with_rate(0.0))
            })?;
            Ok(())
        })
        .build()
        .unwrap();
    engine.run(observer).unwrap()
}

fn read_csv(path: &std::path::Path) -> (Vec<String>, Vec<csv::StringRecord>) {
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().iter().map(str::to_owned).collect();
    let rows = rdr.records().map(|r| r.unwrap()).collect();
    (headers, rows)
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod row_tests {
    use super::*;

    #[test]
    fn rows_from_results() {
        let dir = tmp();
        let mut obs = TraceObserver::new(CsvWriter::new(dir.path()).unwrap());
        let results = small_run(&mut obs);

        let child = TaskRow::from(&results.tasks[1]);
        assert_eq!(child.parent_id, Some(0));
        assert_eq!(child.status, "complete");
        assert_eq!(child.start_micros, Some(1_000_000));
        assert_eq!(child.end_micros, Some(11_000_000));

        let rows = ProfileRow::from_profile(results.profile("battery").unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].segment, 2);
        assert_eq!(rows[2].start_micros, 11_000_000);
        assert_eq!(rows[2].dynamics, r#"{"rate":0.0,"value":80.0}"#);
        assert!(rows.iter().all(|r| r.cell == 0));
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use super::*;

    #[test]
    fn csv_files_created_with_headers() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let (headers, rows) = read_csv(&dir.path().join("tasks.csv"));
        assert_eq!(
            headers,
            ["task_id", "parent_id", "activity_type", "status", "start_micros", "end_micros", "child_count"]
        );
        assert!(rows.is_empty());

        let (headers, _) = read_csv(&dir.path().join("profiles.csv"));
        assert_eq!(headers, ["cell", "resource", "segment", "start_micros", "dynamics"]);
    }

    #[test]
    fn observer_writes_trace_at_end() {
        let dir = tmp();
        let mut obs = TraceObserver::new(CsvWriter::new(dir.path()).unwrap());
        small_run(&mut obs);
        assert!(obs.take_error().is_none());

        let (_, tasks) = read_csv(&dir.path().join("tasks.csv"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(&tasks[0][0], "0");
        assert_eq!(&tasks[0][1], ""); // root has no parent
        assert_eq!(&tasks[0][2], "pass");
        assert_eq!(&tasks[0][6], "1");
        assert_eq!(&tasks[1][1], "0");

        let (_, profiles) = read_csv(&dir.path().join("profiles.csv"));
        assert_eq!(profiles.len(), 3);
        assert_eq!(&profiles[0][0], "0");
        assert_eq!(&profiles[0][1], "battery");
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── SQLite ────────────────────────────────────────────────────────────────────

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use super::*;
    use crate::SqliteWriter;

    #[test]
    fn observer_writes_tables() {
        let dir = tmp();
        let mut obs = TraceObserver::new(SqliteWriter::new(dir.path()).unwrap());
        small_run(&mut obs);
        assert!(obs.take_error().is_none());
        drop(obs);

        let conn = rusqlite::Connection::open(dir.path().join("trace.db")).unwrap();
        let tasks: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |r| r.get(0)).unwrap();
        assert_eq!(tasks, 2);
        let parent: Option<i64> =
            conn.query_row("SELECT parent_id FROM tasks WHERE task_id = 1", [], |r| r.get(0)).unwrap();
        assert_eq!(parent, Some(0));
        let segments: i64 =
            conn.query_row("SELECT COUNT(*) FROM profiles WHERE resource = 'battery'", [], |r| r.get(0)).unwrap();
        assert_eq!(segments, 3);
    }

    #[test]
    fn same_named_cells_get_separate_profiles() {
        let dir = tmp();
        let mut obs = TraceObserver::new(SqliteWriter::new(dir.path()).unwrap());
        let mut builder = SimBuilder::new(SimConfig::default());
        let primary = builder.allocate("bus.holder", Linear::constant(1.0));
        let spare = builder.allocate("bus.holder", Linear::constant(2.0));
        builder.registry_mut().track(primary).track(spare);
        let mut engine = builder.build().unwrap();
        engine.run(&mut obs).unwrap();
        assert!(obs.take_error().is_none());
        drop(obs);

        let conn = rusqlite::Connection::open(dir.path().join("trace.db")).unwrap();
        let cells: i64 = conn
            .query_row("SELECT COUNT(DISTINCT cell) FROM profiles WHERE resource = 'bus.holder'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(cells, 2);
    }
}
