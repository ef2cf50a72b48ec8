//! `tl-schedule` — plans, the pending-event queue, and plan loading.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`plan`]        | `Directive`, `Plan`                                      |
//! | [`event_queue`] | `EventQueue` (`BTreeMap<SimTime, BTreeSet<TaskId>>`)     |
//! | [`loader`]      | `load_plan_csv`, `load_plan_reader`, `load_plan_json`    |
//! | [`error`]       | `ScheduleError`, `ScheduleResult<T>`                     |
//!
//! # Ordering model (summary)
//!
//! A plan is a list of `(start offset, activity type, arguments)` directives
//! supplied by the placement layer.  The engine turns each directive into a
//! task and pushes it onto the `EventQueue`, which always yields the pending
//! event with the smallest `(SimTime, TaskId)`:
//!
//! ```text
//! (t+0s, TaskId(0))  (t+0s, TaskId(3))  (t+5s, TaskId(1))  ...
//!  └── popped first   └── same time, created later
//! ```

pub mod error;
pub mod event_queue;
pub mod loader;
pub mod plan;


pub use error::{ScheduleError, ScheduleResult};
pub use event_queue::EventQueue;
pub use loader::{load_plan_csv, load_plan_json, load_plan_reader};
pub use plan::{Directive, Plan};
