use thiserror::Error;

use tl_core::TaskId;
use tl_task::ModelError;

#[derive(Debug, Error)]
pub enum LockError {
    /// `release` by a task that does not hold the lock.  Local to the call;
    /// the run goes on.
    #[error("{task} released a lock held by {holder:?}")]
    NotHolder { task: TaskId, holder: Option<TaskId> },

    #[error("{task} already holds or is waiting for this lock")]
    AlreadyRequested { task: TaskId },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type LockResult<T> = Result<T, LockError>;

/// Lets models use `?` on lock calls.  Wrapped model errors are passed
/// through unchanged so teardown (`Aborted`) still unwinds quietly.
impl From<LockError> for ModelError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Model(inner) => inner,
            other => ModelError::Other(Box::new(other)),
        }
    }
}
