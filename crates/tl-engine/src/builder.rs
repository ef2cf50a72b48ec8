//! `SimBuilder` — validated construction of an `Engine`.

use tl_cells::{CellId, CellStore, Dynamics};
use tl_core::{Duration, SimConfig};
use tl_schedule::{Directive, Plan};
use tl_task::{Activity, Baton, BoxedActivity};

use crate::engine::{Engine, RootTask};
use crate::registry::ModelRegistry;
use crate::{SimError, SimResult};

/// A root task waiting for `build`.  Plan directives are instantiated
/// through the registry; direct activities are taken as given.
enum Seed {
    Directive { index: usize, directive: Directive },
    Activity { start: Duration, activity_type: String, activity: BoxedActivity },
}

/// Fluent builder for [`Engine`].
///
/// # Required inputs
///
/// - `config`: the `SimConfig` (horizon, seed, search tuning)
///
/// # Optional inputs
///
/// | Method          | Default            |
/// |-----------------|--------------------|
/// | `.registry(r)`  | empty registry     |
/// | `.cells(s)`     | empty store        |
/// | `.plan(p)`      | no directives      |
/// | `.spawn_at(..)` | no direct tasks    |
///
/// Root tasks get ids in the order they were added, plan directives first
/// within each `.plan(..)` call.
pub struct SimBuilder {
    config:     SimConfig,
    registry:   ModelRegistry,
    cells:      CellStore,
    seeds:      Vec<Seed>,
    directives: usize,
}

impl SimBuilder {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            registry: ModelRegistry::new(),
            cells: CellStore::new(),
            seeds: Vec::new(),
            directives: 0,
        }
    }

    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    /// Replace the initial cell store.  Its clock must still be at zero.
    pub fn cells(mut self, cells: CellStore) -> Self {
        self.cells = cells;
        self
    }

    pub fn cells_mut(&mut self) -> &mut CellStore {
        &mut self.cells
    }

    /// Allocate a cell in the initial store.
    pub fn allocate<D: Dynamics>(&mut self, name: impl Into<String>, initial: D) -> CellId<D> {
        self.cells.allocate(name, initial)
    }

    /// Add every directive of `plan` as a root task.
    pub fn plan(mut self, plan: Plan) -> Self {
        for directive in plan {
            let index = self.directives;
            self.directives += 1;
            self.seeds.push(Seed::Directive { index, directive });
        }
        self
    }

    /// Add a root task directly, bypassing the registry.
    pub fn spawn_at<A: Activity>(mut self, start: Duration, activity_type: impl Into<String>, activity: A) -> Self {
        self.seeds.push(Seed::Activity { start, activity_type: activity_type.into(), activity: Box::new(activity) });
        self
    }

    /// Validate all inputs and construct the `Engine`.
    ///
    /// # Errors
    ///
    /// - `SimError::Core` / `SimError::Config` if the configuration or the
    ///   initial store is unusable.
    /// - `SimError::Directive` naming the first directive whose activity
    ///   type is unknown or whose arguments do not deserialize.
    pub fn build(self) -> SimResult<Engine> {
        self.config.validate()?;
        if self.cells.now() != tl_core::SimTime::ZERO {
            return Err(SimError::Config(format!("initial cell store is already at {}", self.cells.now())));
        }

        let mut roots = Vec::with_capacity(self.seeds.len());
        for seed in self.seeds {
            let root = match seed {
                Seed::Directive { index, directive } => {
                    let reject = |source: SimError| SimError::Directive { index, source: Box::new(source) };
                    if directive.start.is_negative() {
                        return Err(reject(SimError::Config(format!("negative start offset {}", directive.start))));
                    }
                    let activity =
                        self.registry.instantiate(&directive.activity_type, &directive.arguments).map_err(reject)?;
                    RootTask { start: directive.start, activity_type: directive.activity_type, activity }
                }
                Seed::Activity { start, activity_type, activity } => {
                    if start.is_negative() {
                        return Err(SimError::Config(format!("{activity_type}: negative start offset {start}")));
                    }
                    RootTask { start, activity_type, activity }
                }
            };
            roots.push(root);
        }

        Ok(Engine::new(self.config, self.registry, Baton::new(self.cells), roots))
    }
}
