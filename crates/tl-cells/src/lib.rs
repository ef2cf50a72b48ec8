//! `tl-cells` — versioned, time-indexed simulation state.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                    |
//! |---------------|-------------------------------------------------------------|
//! | [`dynamics`]  | `Dynamics` trait, `Discrete`, `Linear`, `Polynomial`, `Clock` |
//! | [`cell`]      | `Cell<D>` — one value plus its full (time, value) history   |
//! | [`store`]     | `CellStore`, typed `CellId<D>` handles                      |
//! | [`querier`]   | `Querier` — read view that records which cells were read    |
//! | [`resource`]  | `Resource` trait and `map`/`zip`/`constant` combinators     |
//! | [`error`]     | `CellError`, `CellResult<T>`                                |
//!
//! # State model (summary)
//!
//! A cell never stores samples.  It stores *dynamics*: a symbolic description
//! of how the value evolves with elapsed time.  Writing a cell appends a
//! `(SimTime, D)` entry; reading at time `t` finds the entry effective at `t`
//! (binary search) and steps it forward by `t - entry_time`:
//!
//! ```text
//! history:  (t0, linear(5, +1))   (t7, linear(12, -2))
//! sample_at(t9) = linear(12, -2).step(t9 - t7) = linear(8, -2)
//! ```
//!
//! Only the task currently holding control owns the store, so writes never
//! race; reads may look at any time up to the current clock.

pub mod cell;
pub mod dynamics;
pub mod error;
pub mod querier;
pub mod resource;
pub mod store;


pub use cell::Cell;
pub use dynamics::{Clock, Discrete, Dynamics, Linear, Polynomial};
pub use error::{CellError, CellResult};
pub use querier::Querier;
pub use resource::{Constant, Map, Resource, ResourceExt, Zip, constant, map, zip};
pub use store::{CellId, CellStore};
