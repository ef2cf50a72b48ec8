//! Deterministic per-task RNG.
//!
//! # Determinism strategy
//!
//! Each task gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (task_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive task IDs uniformly across the seed space.
//! Because task IDs are allocated in creation order, two runs with the same
//! seed and the same plan hand every task the same random stream, regardless
//! of how many OS threads the runs happened to use.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::TaskId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-task deterministic RNG, handed to effect models through their task
/// context.
pub struct TaskRng(SmallRng);

impl TaskRng {
    /// Seed deterministically from the run's global seed and a task ID.
    pub fn new(global_seed: u64, task: TaskId) -> Self {
        let seed = global_seed ^ task.0.wrapping_mul(MIXING_CONSTANT);
        TaskRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for use with `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    /// Sample a uniformly distributed value of any `Standard`-distributed type.
    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice, `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
