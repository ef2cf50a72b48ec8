//! The `Activity` trait — an effect model ready to run as a task.

use crate::context::TaskContext;
use crate::error::ModelResult;

/// One activity's effect model.
///
/// Runs once, on its own thread, with exclusive access to the cell store
/// whenever it holds control.  Any closure
/// `FnOnce(&mut TaskContext) -> ModelResult<()>` is an activity:
///
/// ```rust,ignore
/// ctx.spawn("warm_up", move |ctx: &mut TaskContext| {
///     ctx.set(heater, Discrete(true))?;
///     ctx.delay(Duration::MINUTE * 5)?;
///     ctx.set(heater, Discrete(false))
/// })?;
/// ```
pub trait Activity: Send + 'static {
    fn run(self: Box<Self>, ctx: &mut TaskContext) -> ModelResult<()>;
}

impl<F> Activity for F
where
    F: FnOnce(&mut TaskContext) -> ModelResult<()> + Send + 'static,
{
    fn run(self: Box<Self>, ctx: &mut TaskContext) -> ModelResult<()> {
        (*self)(ctx)
    }
}

pub type BoxedActivity = Box<dyn Activity>;
