//! `tl-core` — foundational types for the `rust_tl` simulation kernel.
//!
//! This crate is a dependency of every other `tl-*` crate.  It has no `tl-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                   |
//! |------------|------------------------------------------------------------|
//! | [`ids`]    | `TaskId`, `CellKey`                                        |
//! | [`time`]   | `SimTime`, `Duration`, `SimClock`                          |
//! | [`config`] | `SimConfig`                                                |
//! | [`rng`]    | `TaskRng` (per-task deterministic RNG)                     |
//! | [`error`]  | `CoreError`, `CoreResult`                                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{CoreError, CoreResult};
pub use ids::{CellKey, TaskId};
pub use rng::TaskRng;
pub use time::{Duration, SimClock, SimTime};
