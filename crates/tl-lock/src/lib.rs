//! `tl-lock` — a priority lock for effect models.
//!
//! The kernel itself needs no locks: only the task holding control can
//! touch the cell store.  `PriorityLock` is a *model-level* primitive for
//! activities that must take turns on a shared piece of hardware.  It holds
//! no state of its own; everything lives in two cells, so its history shows
//! up in profiles like any other resource.
//!
//! | Cell            | Dynamics                           |
//! |-----------------|------------------------------------|
//! | `<name>.holder` | `Discrete<Option<TaskId>>`         |
//! | `<name>.queue`  | `Discrete<Vec<Waiter<P>>>`         |
//!
//! # Policy
//!
//! - Waiters are ordered by descending priority, FIFO among equals.
//! - Non-preemptive: a higher-priority arrival waits for the holder to
//!   release.
//! - `release` hands the lock straight to the head of the queue, which wakes
//!   through a condition on the holder cell.

pub mod error;
pub mod lock;


pub use error::{LockError, LockResult};
pub use lock::{Priority, PriorityLock, Waiter};
