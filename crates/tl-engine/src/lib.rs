//! `tl-engine` — the discrete-event loop of the rust_tl simulation kernel.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                   |
//! |--------------|------------------------------------------------------------|
//! | [`builder`]  | `SimBuilder` (validates config and plan)                   |
//! | [`engine`]   | `Engine` (event loop, condition revalidation, teardown)    |
//! | [`registry`] | `ModelRegistry` (activity types, named resources, profiles)|
//! | [`observer`] | `SimObserver` hooks, `NoopObserver`                        |
//! | [`results`]  | `SimulationResults`, `TaskSummary`, `Profile`              |
//! | [`error`]    | `SimError`, `SimResult<T>`                                 |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use serde::Deserialize;
//! use tl_cells::Linear;
//! use tl_core::{Duration, SimConfig};
//! use tl_engine::{NoopObserver, SimBuilder};
//! use tl_schedule::Plan;
//!
//! #[derive(Deserialize)]
//! struct Drain { rate: f64 }
//!
//! let mut builder = SimBuilder::new(SimConfig::default());
//! let battery = builder.allocate("battery", Linear::constant(100.0));
//! builder.registry_mut().activity("drain", move |p: Drain, ctx| {
//!     ctx.emit(battery, |b| b.with_rate(-p.rate))?;
//!     ctx.delay(Duration::MINUTE)
//! });
//! let plan = Plan::empty().with(Duration::ZERO, "drain", serde_json::json!({ "rate": 0.5 }));
//! let results = builder.plan(plan).build()?.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod engine;
pub mod error;
pub mod observer;
pub mod registry;
pub mod results;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use engine::Engine;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use registry::ModelRegistry;
pub use results::{Profile, ProfileSegment, SimulationResults, TaskSummary};
