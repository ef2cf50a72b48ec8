//! `tl-conditions` — predicates over the future of the cell store.
//!
//! A condition answers one question: *given the dynamics as they stand now,
//! and assuming nobody writes a relevant cell in the meantime, when does this
//! predicate next hold?*  Tasks suspend on conditions; the engine schedules
//! them at the predicted instant and re-asks whenever one of the cells the
//! condition read is written first.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`crossing`]  | `Direction`, `Window`, `Crossing`, `Strategy`, `Confidence` |
//! | [`evaluator`] | `Evaluator`, `SearchConfig`, grid + bisection search       |
//! | [`condition`] | `Condition` trait, `and`/`or`/`not`, `always`/`never`      |
//! | [`compare`]   | Threshold comparisons with an analytic fast path           |
//! | [`when`]      | Arbitrary predicates over a resource's value               |
//!
//! # Strategies
//!
//! ```text
//! dynamics.as_polynomial() ── degree ≤ 2 ──► roots ──► confirm µs with step()  (Analytic)
//!            │
//!            └── otherwise ──► grid of N samples ──► bisect bracket          (Search)
//! ```
//!
//! The search strategy assumes the predicate changes at most once in the
//! window.  When the grid shows more than one change, or shows none on a
//! grid coarser than the search resolution, the result is still
//! deterministic but is marked [`Confidence::Low`].

pub mod compare;
pub mod condition;
pub mod crossing;
pub mod evaluator;
pub mod when;

#[cfg(test)]
mod tests;

pub use compare::{Compare, Comparison, at_least, at_most, greater_than, less_than};
pub use condition::{
    Always, And, BoxedCondition, Condition, ConditionExt, Never, Not, Or, always, never,
};
pub use crossing::{Confidence, Crossing, Direction, Strategy, Window};
pub use evaluator::{Evaluator, SearchConfig};
pub use when::{When, when};
