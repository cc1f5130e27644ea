use super::cancel::cancel;
use super::core::{TaskHeader, TaskId};
use super::state::TaskState;
use crate::error::Result;
use crate::time::Deadline;

use std::fmt;
use std::rc::Rc;

/// A handle to a spawned task.
///
/// The handle is the only way to cancel and join the task: pass it to
/// [`cancel`](super::cancel), or use [`TaskHandle::cancel`] and
/// [`TaskHandle::join`].
///
/// Dropping the handle of an unfinished task does **not** stop the task;
/// it keeps running but can no longer be joined, and a warning is logged.
pub struct TaskHandle {
    pub(crate) header: Rc<TaskHeader>,

    /// Cleared when the owner deliberately gives up joining.
    joinable: bool,
}

impl TaskHandle {
    pub(crate) fn new(header: Rc<TaskHeader>) -> Self {
        Self {
            header,
            joinable: true,
        }
    }

    /// The task's identifier.
    pub fn id(&self) -> TaskId {
        self.header.id
    }

    /// The task's current lifecycle state.
    pub fn state(&self) -> TaskState {
        self.header.state()
    }

    /// Returns `true` once the task has finished.
    pub fn is_finished(&self) -> bool {
        self.header.state().is_done()
    }

    /// Returns `true` once a cancellation has been delivered to the task.
    pub fn is_canceled(&self) -> bool {
        self.header.is_canceled()
    }

    /// Cancels the task at `deadline` and waits for it to finish.
    ///
    /// Shorthand for [`cancel`](super::cancel) with a single task.
    pub async fn cancel(self, deadline: Deadline) -> Result<()> {
        cancel([self], deadline).await
    }

    /// Waits for the task to finish on its own.
    ///
    /// Equivalent to canceling with [`Deadline::Never`].
    pub async fn join(self) -> Result<()> {
        self.cancel(Deadline::Never).await
    }

    /// Gives up joining the task without a warning.
    pub(crate) fn detach(mut self) {
        self.joinable = false;
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.header.id)
            .field("state", &self.header.state())
            .field("canceled", &self.header.is_canceled())
            .finish()
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if self.joinable && !self.is_finished() && !std::thread::panicking() {
            tracing::warn!(
                task = %self.header.id,
                "task handle dropped before the task finished; the task is no longer joinable"
            );
        }
    }
}
