use super::cancel::cancel;
use super::core::{TaskId, spawn};
use super::handle::TaskHandle;
use crate::error::Result;
use crate::time::Deadline;

use std::future::Future;

/// A group of tasks canceled and joined together.
///
/// `TaskSet` is handy for fan-out work whose lifetime is bounded by a
/// parent: spawn workers into the set, then tear them all down with a
/// single [`TaskSet::cancel`].
///
/// Dropping a non-empty set cancels its members immediately. They still
/// run until they reach a suspension point, but nobody joins them.
#[derive(Debug, Default)]
pub struct TaskSet {
    handles: Vec<TaskHandle>,
}

impl TaskSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    /// Spawns a task into the set.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ResourceExhausted`](crate::Error::ResourceExhausted)
    /// when the runtime is at its task limit.
    pub fn spawn<F>(&mut self, future: F) -> Result<TaskId>
    where
        F: Future<Output = ()> + 'static,
    {
        let handle = spawn(future)?;
        let id = handle.id();
        self.handles.push(handle);
        Ok(id)
    }

    /// Adopts an already spawned task.
    pub fn insert(&mut self, handle: TaskHandle) {
        self.handles.push(handle);
    }

    /// Number of tasks in the set, finished or not.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancels every member at `deadline` and waits for all of them.
    ///
    /// The set is empty afterwards, even if this returns an error.
    pub async fn cancel(&mut self, deadline: Deadline) -> Result<()> {
        let handles = std::mem::take(&mut self.handles);
        cancel(handles, deadline).await
    }

    /// Waits for every member to finish on its own.
    pub async fn join_all(&mut self) -> Result<()> {
        self.cancel(Deadline::Never).await
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        if self.handles.is_empty() {
            return;
        }

        tracing::debug!(tasks = self.handles.len(), "task set dropped; canceling members");

        for handle in self.handles.drain(..) {
            handle.header.cancel();
            handle.detach();
        }
    }
}
