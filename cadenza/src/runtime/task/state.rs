/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// The task is queued and will be polled on the next scheduling pass.
    Runnable,

    /// The task is currently being polled.
    ///
    /// At most one task observes this state at a time.
    Running,

    /// The task is parked at a suspension point, waiting for a peer, a
    /// deadline, or a cancellation.
    Blocked,

    /// The task's future has returned and will not be polled again.
    Done,
}

impl TaskState {
    /// Returns `true` once the task has finished.
    pub fn is_done(self) -> bool {
        self == Self::Done
    }
}
