//! `ModelRegistry` — the named things a plan and the output layer can refer
//! to.
//!
//! | Kind       | Registered with | Used for                                    |
//! |------------|-----------------|---------------------------------------------|
//! | Activities | [`activity`]    | turning plan directives into tasks          |
//! | Resources  | [`resource`]    | sampling derived values by name             |
//! | Profiles   | [`track`]       | exporting a cell's full history             |
//!
//! [`activity`]: ModelRegistry::activity
//! [`resource`]: ModelRegistry::resource
//! [`track`]: ModelRegistry::track

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use tl_cells::{CellId, CellStore, Dynamics, Querier, Resource};
use tl_task::{BoxedActivity, ModelResult, TaskContext};

use crate::results::{Profile, ProfileSegment};
use crate::{SimError, SimResult};

type Factory = Arc<dyn Fn(&Value) -> SimResult<BoxedActivity> + Send + Sync>;
type Sampler = Arc<dyn Fn(&CellStore) -> SimResult<Value> + Send + Sync>;
type Exporter = Arc<dyn Fn(&CellStore) -> SimResult<Profile> + Send + Sync>;

#[derive(Clone, Default)]
pub struct ModelRegistry {
    activities: BTreeMap<String, Factory>,
    resources:  BTreeMap<String, Sampler>,
    tracked:    Vec<Exporter>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Activities ────────────────────────────────────────────────────────────

    /// Register an activity type.  Directive arguments are deserialized into
    /// `P` when the plan is loaded, so bad parameters fail before the run.
    ///
    /// A second registration under the same name replaces the first.
    pub fn activity<P, F>(&mut self, name: impl Into<String>, model: F) -> &mut Self
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P, &mut TaskContext) -> ModelResult<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let activity_type = name.clone();
        let model = Arc::new(model);
        let factory: Factory = Arc::new(move |arguments: &Value| {
            let params: P = serde_json::from_value(arguments.clone()).map_err(|e| {
                SimError::InvalidParameters { activity_type: activity_type.clone(), reason: e.to_string() }
            })?;
            let model = Arc::clone(&model);
            let activity: BoxedActivity = Box::new(move |ctx: &mut TaskContext| model(params, ctx));
            Ok(activity)
        });
        self.activities.insert(name, factory);
        self
    }

    pub fn has_activity(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Registered activity types, sorted.
    pub fn activity_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.activities.keys().map(String::as_str)
    }

    /// Build a runnable activity from a type name and its arguments.
    pub fn instantiate(&self, activity_type: &str, arguments: &Value) -> SimResult<BoxedActivity> {
        let factory = self
            .activities
            .get(activity_type)
            .ok_or_else(|| SimError::UnknownActivityType(activity_type.to_string()))?;
        factory(arguments)
    }

    // ── Resources ─────────────────────────────────────────────────────────────

    /// Expose a resource under `name`.  Its value is serialized with serde
    /// whenever it is sampled.
    pub fn resource<R>(&mut self, name: impl Into<String>, resource: R) -> &mut Self
    where
        R: Resource,
        <R::Dyn as Dynamics>::Value: Serialize,
    {
        let sampler: Sampler = Arc::new(move |cells: &CellStore| {
            let querier = Querier::new(cells);
            let value = resource.value(&querier)?;
            Ok(serde_json::to_value(value)?)
        });
        self.resources.insert(name.into(), sampler);
        self
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.resources.keys().map(String::as_str)
    }

    /// Value of the named resource at the store's current time.
    pub fn sample_resource(&self, name: &str, cells: &CellStore) -> SimResult<Value> {
        let sampler = self.resources.get(name).ok_or_else(|| SimError::UnknownResource(name.to_string()))?;
        sampler(cells)
    }

    pub(crate) fn sample_all(&self, cells: &CellStore) -> SimResult<BTreeMap<String, Value>> {
        self.resources.iter().map(|(name, sampler)| Ok((name.clone(), sampler(cells)?))).collect()
    }

    // ── Profiles ──────────────────────────────────────────────────────────────

    /// Include `cell`'s full history in the run results.
    pub fn track<D>(&mut self, cell: CellId<D>) -> &mut Self
    where
        D: Dynamics + Serialize,
    {
        self.tracked.push(Arc::new(move |cells: &CellStore| {
            let name = cells.name(cell.key()).unwrap_or_default().to_string();
            let segments = cells
                .history(cell)?
                .iter()
                .map(|(start, dynamics)| Ok(ProfileSegment { start: *start, dynamics: serde_json::to_value(dynamics)? }))
                .collect::<SimResult<Vec<_>>>()?;
            Ok(Profile { cell: cell.key(), name, segments })
        }));
        self
    }

    pub(crate) fn export_profiles(&self, cells: &CellStore) -> SimResult<Vec<Profile>> {
        self.tracked.iter().map(|export| export(cells)).collect()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("activities", &self.activities.keys().collect::<Vec<_>>())
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("tracked", &self.tracked.len())
            .finish()
    }
}
