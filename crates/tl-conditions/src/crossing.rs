//! Query parameters and results shared by every condition.

use tl_core::Duration;

/// Which side of the predicate a query is looking for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The predicate holds.
    Rising,
    /// The predicate does not hold.
    Falling,
}

impl Direction {
    #[inline]
    pub fn flip(self) -> Direction {
        match self {
            Direction::Rising => Direction::Falling,
            Direction::Falling => Direction::Rising,
        }
    }

    /// Whether a raw predicate value satisfies this direction.
    #[inline]
    pub fn accepts(self, holds: bool) -> bool {
        match self {
            Direction::Rising => holds,
            Direction::Falling => !holds,
        }
    }
}

/// Inclusive bounds on the answer, as offsets from the evaluation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub earliest: Duration,
    pub latest:   Duration,
}

impl Window {
    pub fn new(earliest: Duration, latest: Duration) -> Self {
        Window { earliest, latest }
    }

    /// `[0, FOREVER]`: anything from now on.
    pub fn from_now() -> Self {
        Window { earliest: Duration::ZERO, latest: Duration::FOREVER }
    }

    /// The single instant `[at, at]`.
    pub fn at(at: Duration) -> Self {
        Window { earliest: at, latest: at }
    }

    pub fn is_empty(&self) -> bool {
        self.earliest > self.latest
    }

    pub fn contains(&self, offset: Duration) -> bool {
        self.earliest <= offset && offset <= self.latest
    }

    /// Same upper bound, later start.
    pub fn starting_at(self, earliest: Duration) -> Self {
        Window { earliest, ..self }
    }

    /// Same lower bound, earlier end.
    pub fn ending_at(self, latest: Duration) -> Self {
        Window { latest, ..self }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::from_now()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    Analytic,
    Search,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Confidence {
    /// Search observed more than one change of the predicate in the window.
    Low,
    Exact,
}

/// Result of a condition query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Crossing {
    /// `None` if the predicate never reaches the requested side in the window.
    pub offset:     Option<Duration>,
    pub strategy:   Strategy,
    pub confidence: Confidence,
}

impl Crossing {
    pub fn analytic(offset: Option<Duration>) -> Self {
        Crossing { offset, strategy: Strategy::Analytic, confidence: Confidence::Exact }
    }

    pub fn searched(offset: Option<Duration>, confidence: Confidence) -> Self {
        Crossing { offset, strategy: Strategy::Search, confidence }
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == Confidence::Low
    }

    /// Keep this offset but inherit the weaker strategy/confidence of `other`.
    pub fn merged_with(self, other: Crossing) -> Crossing {
        Crossing {
            offset:     self.offset,
            strategy:   self.strategy.max(other.strategy),
            confidence: self.confidence.min(other.confidence),
        }
    }

    /// Whichever of the two is earlier; `None` loses.
    pub fn earlier(a: Crossing, b: Crossing) -> Crossing {
        let offset = match (a.offset, b.offset) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, y) => x.or(y),
        };
        Crossing { offset, ..a.merged_with(b) }
    }

    /// Whichever of the two is later; `None` loses.
    pub fn later(a: Crossing, b: Crossing) -> Crossing {
        let offset = match (a.offset, b.offset) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (x, y) => x.or(y),
        };
        Crossing { offset, ..a.merged_with(b) }
    }
}
