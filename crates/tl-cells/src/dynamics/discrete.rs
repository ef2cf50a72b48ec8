use serde::{Deserialize, Serialize};

use tl_core::Duration;

use super::Dynamics;

/// A value that holds until it is overwritten.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Discrete<T>(pub T);

impl<T> Discrete<T> {
    pub fn new(value: T) -> Self {
        Discrete(value)
    }

    pub fn get(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Dynamics for Discrete<T>
where
    T: Clone + std::fmt::Debug + Send + Sync + 'static,
{
    type Value = T;

    #[inline]
    fn extract(&self) -> T {
        self.0.clone()
    }

    #[inline]
    fn step(&self, _elapsed: Duration) -> Self {
        self.clone()
    }

    fn is_constant(&self) -> bool {
        true
    }
}
