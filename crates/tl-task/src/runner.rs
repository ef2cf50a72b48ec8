//! Task threads.

use std::io;
use std::thread::{self, JoinHandle};

use log::debug;

use tl_core::{TaskId, TaskRng};

use crate::activity::BoxedActivity;
use crate::channel::{EngineEnd, control_channel};
use crate::context::{Resume, Suspend, SuspendReason, TaskContext};
use crate::error::ModelError;

/// Engine-side handle to a started task.
pub struct TaskThread {
    pub end:    EngineEnd<Resume, Suspend>,
    pub handle: JoinHandle<()>,
}

/// Spawn the thread for task `id`.  The thread blocks until the engine's
/// first `resume`.
pub fn start_task(
    id: TaskId,
    activity_type: String,
    activity: BoxedActivity,
    rng: TaskRng,
) -> io::Result<TaskThread> {
    let (end, task_end) = control_channel::<Resume, Suspend>();
    let handle = thread::Builder::new()
        .name(format!("task-{}", id.0))
        .spawn(move || {
            let ctx = TaskContext::new(id, activity_type, task_end, rng);
            run(ctx, activity);
        })?;
    Ok(TaskThread { end, handle })
}

/// Thread body: take control, run the model, wait for children, report.
fn run(mut ctx: TaskContext, activity: BoxedActivity) {
    if ctx.acquire().is_err() {
        // Torn down before its first turn.
        return;
    }
    debug!("{} ({}) started", ctx.id(), ctx.activity_type());

    let outcome = activity.run(&mut ctx).and_then(|()| ctx.wait_for_children());
    let reason = match outcome {
        Ok(()) => SuspendReason::Completed,
        Err(ModelError::Aborted) => {
            debug!("{} ({}) aborted", ctx.id(), ctx.activity_type());
            return;
        }
        Err(err) => SuspendReason::Failed(err),
    };

    let label = reason.label();
    if ctx.hand_back(reason).is_ok() {
        debug!("{} ({}) {}", ctx.id(), ctx.activity_type(), label);
    }
}
