//! `tl-task` — cooperative activity tasks.
//!
//! Every started task runs its effect model on a dedicated OS thread, but
//! only one of {engine, one task} ever runs at a time.  The
//! [`control_channel`] enforces this: control is a token handed back and
//! forth, and the whole cell store (the [`Baton`]) travels with it.  A task
//! can only write cells while it owns the baton, so the single-writer rule is
//! enforced by ownership rather than by locks.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`channel`]  | `control_channel`, `EngineEnd`, `TaskEnd`, `Side`           |
//! | [`status`]   | `TaskStatus` state machine                                  |
//! | [`context`]  | `TaskContext` (model API), `Baton`, `Resume`, `Suspend`     |
//! | [`activity`] | `Activity` trait (blanket impl for closures)                |
//! | [`runner`]   | `start_task` — spawn the named thread for a task            |
//! | [`error`]    | `ChannelError`, `ModelError`                                |
//!
//! # Handoff protocol
//!
//! ```text
//!   engine                                   task thread
//!   ──────                                   ───────────
//!   resume(Resume { baton }) ──────────────► take_control()
//!        (blocked)                           effect model runs, writes cells
//!   ◄────────────── yield_control(Suspend { baton, reason, spawned })
//!   handle reason, schedule next event
//! ```

pub mod activity;
pub mod channel;
pub mod context;
pub mod error;
pub mod runner;
pub mod status;


pub use activity::{Activity, BoxedActivity};
pub use channel::{EngineEnd, Side, TaskEnd, control_channel};
pub use context::{Baton, Resume, SpawnRequest, Suspend, SuspendReason, TaskContext};
pub use error::{ChannelError, ChannelResult, ModelError, ModelResult};
pub use runner::{TaskThread, start_task};
pub use status::TaskStatus;
