//! Evaluation context and the numeric search strategy.

use std::collections::BTreeSet;

use tl_cells::{CellResult, CellStore, Querier};
use tl_core::{CellKey, Duration, SimConfig, SimTime};

use crate::condition::Condition;
use crate::crossing::{Confidence, Crossing, Direction, Window};

/// Tuning for the search strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Evenly spaced samples taken across the window before bisecting.
    pub samples:    u32,
    /// Bisection stops once the bracket is this narrow.
    pub resolution: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { samples: 64, resolution: Duration::EPSILON }
    }
}

impl From<&SimConfig> for SearchConfig {
    fn from(config: &SimConfig) -> Self {
        SearchConfig {
            samples:    config.search_samples.max(1),
            resolution: config.search_resolution.max(Duration::EPSILON),
        }
    }
}

/// Everything a condition needs to answer a query: a read-tracking view of
/// the store at the evaluation time, plus search tuning.
pub struct Evaluator<'a> {
    querier: Querier<'a>,
    search:  SearchConfig,
}

impl<'a> Evaluator<'a> {
    pub fn new(cells: &'a CellStore, search: SearchConfig) -> Self {
        Evaluator { querier: Querier::new(cells), search }
    }

    #[inline]
    pub fn querier(&self) -> &Querier<'a> {
        &self.querier
    }

    /// The instant offsets are measured from.
    #[inline]
    pub fn now(&self) -> SimTime {
        self.querier.now()
    }

    #[inline]
    pub fn search_config(&self) -> SearchConfig {
        self.search
    }

    /// Earliest offset from now at which `condition` holds.
    pub fn next_satisfied<C: Condition + ?Sized>(&self, condition: &C) -> CellResult<Crossing> {
        condition.earliest(self, Direction::Rising, Window::from_now())
    }

    /// Earliest offset inside `window` at which `condition` holds.
    pub fn next_satisfied_within<C: Condition + ?Sized>(&self, condition: &C, window: Window) -> CellResult<Crossing> {
        condition.earliest(self, Direction::Rising, window)
    }

    /// Whether `condition` holds exactly at `offset`.
    pub fn holds_at<C: Condition + ?Sized>(&self, condition: &C, offset: Duration) -> CellResult<bool> {
        let crossing = condition.earliest(self, Direction::Rising, Window::at(offset))?;
        Ok(crossing.offset == Some(offset))
    }

    /// Cells read by every query made so far: the dependency set.
    pub fn into_reads(self) -> BTreeSet<CellKey> {
        self.querier.into_reads()
    }

    // ── Search strategy ───────────────────────────────────────────────────────

    /// Earliest offset in `window` where `pred` matches `direction`, by grid
    /// sampling then bisection of the first false→true bracket.
    pub fn search_earliest<F>(&self, direction: Direction, window: Window, mut pred: F) -> CellResult<Crossing>
    where
        F: FnMut(Duration) -> CellResult<bool>,
    {
        if window.is_empty() {
            return Ok(Crossing::searched(None, Confidence::Exact));
        }
        let grid = self.grid(window);
        let mut samples = Vec::with_capacity(grid.len());
        for &offset in &grid {
            samples.push(direction.accepts(pred(offset)?));
        }
        let confidence = self.confidence_of(&grid, &samples);

        let Some(first) = samples.iter().position(|&ok| ok) else {
            return Ok(Crossing::searched(None, confidence));
        };
        if first == 0 {
            return Ok(Crossing::searched(Some(grid[0]), confidence));
        }

        // grid[first - 1] rejects, grid[first] accepts.
        let (mut lo, mut hi) = (grid[first - 1], grid[first]);
        while hi - lo > self.search.resolution {
            let mid = lo + (hi - lo) / 2;
            if direction.accepts(pred(mid)?) {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(Crossing::searched(Some(hi), confidence))
    }

    /// Latest offset in `window` where `pred` matches `direction`, bisecting
    /// the last true→false bracket.
    pub fn search_latest<F>(&self, direction: Direction, window: Window, mut pred: F) -> CellResult<Crossing>
    where
        F: FnMut(Duration) -> CellResult<bool>,
    {
        if window.is_empty() {
            return Ok(Crossing::searched(None, Confidence::Exact));
        }
        let grid = self.grid(window);
        let mut samples = Vec::with_capacity(grid.len());
        for &offset in &grid {
            samples.push(direction.accepts(pred(offset)?));
        }
        let confidence = self.confidence_of(&grid, &samples);

        let Some(last) = samples.iter().rposition(|&ok| ok) else {
            return Ok(Crossing::searched(None, confidence));
        };
        if last == grid.len() - 1 {
            return Ok(Crossing::searched(Some(grid[last]), confidence));
        }

        // grid[last] accepts, grid[last + 1] rejects.
        let (mut lo, mut hi) = (grid[last], grid[last + 1]);
        while hi - lo > self.search.resolution {
            let mid = lo + (hi - lo) / 2;
            if direction.accepts(pred(mid)?) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(Crossing::searched(Some(lo), confidence))
    }

    /// `samples + 1` evenly spaced offsets covering both window ends, plus a
    /// ladder at `resolution * 2^k` from the window start so short-lived
    /// stretches near the start are not stepped over by a wide window.
    fn grid(&self, window: Window) -> Vec<Duration> {
        let start = window.earliest.micros() as i128;
        let span = (window.latest.micros() as i128 - start).max(0);
        let steps = (self.search.samples as i128).min(span).max(1);
        let mut grid: Vec<Duration> = (0..=steps)
            .map(|i| Duration((start + span * i / steps) as i64))
            .collect();

        let mut rung = self.search.resolution.micros().max(1) as i128;
        while rung < span {
            grid.push(Duration((start + rung) as i64));
            rung *= 2;
        }
        grid.sort_unstable();
        grid.dedup();
        grid
    }

    /// Exact if the accept/reject pattern changes exactly once across the
    /// grid, or never changes on a grid fine enough to trust.  A pattern that
    /// never changes on a coarse grid may have stepped over a short stretch.
    fn confidence_of(&self, grid: &[Duration], samples: &[bool]) -> Confidence {
        let changes = samples.windows(2).filter(|w| w[0] != w[1]).count();
        let widest = grid.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(Duration::ZERO);
        match changes {
            1 => Confidence::Exact,
            0 if samples.first() == Some(&true) || widest <= self.search.resolution => Confidence::Exact,
            _ => Confidence::Low,
        }
    }
}
