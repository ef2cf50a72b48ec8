//! `Directive` and `Plan`: the initial seed of a simulation run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tl_core::Duration;

/// One activity placed on the timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// Offset from plan start.
    pub start:         Duration,
    pub activity_type: String,
    /// Serialized parameters, decoded by the activity type's registration.
    #[serde(default)]
    pub arguments:     Value,
}

impl Directive {
    pub fn new(start: Duration, activity_type: impl Into<String>, arguments: Value) -> Self {
        Directive { start, activity_type: activity_type.into(), arguments }
    }
}

/// Directives ordered by start offset.
///
/// Sorting is stable: directives with equal starts keep their insertion
/// order, which becomes their task creation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    directives: Vec<Directive>,
}

impl Plan {
    pub fn new(mut directives: Vec<Directive>) -> Self {
        directives.sort_by_key(|d| d.start);
        Plan { directives }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert a directive, keeping the plan ordered.  Lands after any
    /// directive with the same start.
    pub fn push(&mut self, directive: Directive) {
        let idx = self.directives.partition_point(|d| d.start <= directive.start);
        self.directives.insert(idx, directive);
    }

    /// Builder-style [`push`][Self::push].
    pub fn with(mut self, start: Duration, activity_type: impl Into<String>, arguments: Value) -> Self {
        self.push(Directive::new(start, activity_type, arguments));
        self
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Start of the last directive, or `None` for an empty plan.
    pub fn last_start(&self) -> Option<Duration> {
        self.directives.last().map(|d| d.start)
    }
}

impl IntoIterator for Plan {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.directives.into_iter()
    }
}
