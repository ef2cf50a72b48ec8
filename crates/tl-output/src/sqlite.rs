//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `trace.db` file in the configured output directory with
//! two tables: `tasks` and `profiles`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::OutputWriter;
use crate::{OutputResult, ProfileRow, TaskRow};

pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `trace.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("trace.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS tasks (
                 task_id       INTEGER PRIMARY KEY,
                 parent_id     INTEGER,
                 activity_type TEXT    NOT NULL,
                 status        TEXT    NOT NULL,
                 start_micros  INTEGER,
                 end_micros    INTEGER,
                 child_count   INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS profiles (
                 cell         INTEGER NOT NULL,
                 resource     TEXT    NOT NULL,
                 segment      INTEGER NOT NULL,
                 start_micros INTEGER NOT NULL,
                 dynamics     TEXT    NOT NULL,
                 PRIMARY KEY (cell, segment)
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_tasks(&mut self, rows: &[TaskRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO tasks \
                 (task_id, parent_id, activity_type, status, start_micros, end_micros, child_count) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![
                    row.task_id as i64,
                    row.parent_id.map(|p| p as i64),
                    row.activity_type,
                    row.status,
                    row.start_micros,
                    row.end_micros,
                    row.child_count,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_profiles(&mut self, rows: &[ProfileRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO profiles (cell, resource, segment, start_micros, dynamics) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.cell, row.resource, row.segment, row.start_micros, row.dynamics])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
