//! Plan loaders.
//!
//! # CSV format
//!
//! One row per directive.  `arguments` is a JSON document (quote it per CSV
//! rules); an empty field means `null`.
//!
//! ```csv
//! start_secs,activity_type,arguments
//! 0,HoldLock,"{""name"":""C"",""priority"":""Low"",""hold_secs"":60}"
//! 10.5,HoldLock,"{""name"":""A"",""priority"":""Low"",""hold_secs"":30}"
//! 12,Heartbeat,
//! ```
//!
//! # JSON format
//!
//! An array of `{ "start": <micros>, "activity_type": ..., "arguments": ... }`
//! objects, i.e. the serde form of [`Plan`].

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use tl_core::Duration;

use crate::plan::{Directive, Plan};
use crate::{ScheduleError, ScheduleResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct DirectiveRecord {
    start_secs:    f64,
    activity_type: String,
    #[serde(default)]
    arguments:     String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a plan from a CSV file.
pub fn load_plan_csv(path: &Path) -> ScheduleResult<Plan> {
    let file = std::fs::File::open(path)?;
    load_plan_reader(file)
}

/// Like [`load_plan_csv`] but accepts any `Read` source.
pub fn load_plan_reader<R: Read>(reader: R) -> ScheduleResult<Plan> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut directives = Vec::new();

    for (i, result) in csv_reader.deserialize::<DirectiveRecord>().enumerate() {
        // Row numbers are 1-based and skip the header line.
        let row = i + 1;
        let record = result.map_err(|e| ScheduleError::Parse(e.to_string()))?;
        directives.push(parse_record(record, row)?);
    }

    Ok(Plan::new(directives))
}

/// Load a plan from its JSON (serde) form.
pub fn load_plan_json<R: Read>(reader: R) -> ScheduleResult<Plan> {
    let directives: Vec<Directive> =
        serde_json::from_reader(reader).map_err(|e| ScheduleError::Parse(e.to_string()))?;
    for (i, d) in directives.iter().enumerate() {
        check_start(d.start, i + 1)?;
    }
    Ok(Plan::new(directives))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_record(record: DirectiveRecord, row: usize) -> ScheduleResult<Directive> {
    if !record.start_secs.is_finite() {
        return Err(ScheduleError::Row { row, reason: format!("start_secs {} is not finite", record.start_secs) });
    }
    let start = Duration::from_secs_f64(record.start_secs);
    check_start(start, row)?;

    let activity_type = record.activity_type.trim().to_string();
    if activity_type.is_empty() {
        return Err(ScheduleError::Row { row, reason: "empty activity_type".into() });
    }

    let raw = record.arguments.trim();
    let arguments = if raw.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(raw)
            .map_err(|e| ScheduleError::Row { row, reason: format!("arguments are not valid JSON: {e}") })?
    };

    Ok(Directive { start, activity_type, arguments })
}

fn check_start(start: Duration, row: usize) -> ScheduleResult<()> {
    if start.is_negative() {
        return Err(ScheduleError::Row { row, reason: format!("negative start offset {start}") });
    }
    Ok(())
}
