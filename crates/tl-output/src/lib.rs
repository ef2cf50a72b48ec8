//! `tl-output` — trace writers for the rust_tl simulation kernel.
//!
//! | Feature  | Backend | Files created                  |
//! |----------|---------|--------------------------------|
//! | *(none)* | CSV     | `tasks.csv`, `profiles.csv`    |
//! | `sqlite` | SQLite  | `trace.db`                     |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`TraceObserver`], which implements `tl_engine::SimObserver` and writes
//! the whole trace once the run ends.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tl_output::{CsvWriter, TraceObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = TraceObserver::new(writer);
//! engine.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TraceObserver;
pub use row::{ProfileRow, TaskRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
