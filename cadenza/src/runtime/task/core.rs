use super::handle::TaskHandle;
use super::state::TaskState;
use super::waker::TaskWaker;
use crate::error::Result;
use crate::runtime::context;
use crate::time::timer::{TimerAction, TimerGuard};
use crate::time::Deadline;
use crate::utils::Key;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::Waker;
use std::time::Instant;

/// Unique identifier of a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Per-task state shared by the executor, the task's handle and timers.
pub(crate) struct TaskHeader {
    pub(crate) id: TaskId,

    /// Slot of the task inside the executor's slab.
    pub(crate) key: Key,

    state: Cell<TaskState>,

    /// Sticky: once set it stays set until the task exits.
    canceled: Cell<bool>,

    pub(crate) waker: Arc<TaskWaker>,

    /// Tasks waiting in `cancel` for this one to finish.
    joiners: RefCell<Vec<Waker>>,

    /// Cancellation armed for a future deadline.
    cancel_timer: RefCell<Option<(Instant, TimerGuard)>>,
}

impl TaskHeader {
    pub(crate) fn new(key: Key, waker: Arc<TaskWaker>) -> Self {
        Self {
            id: TaskId::next(),
            key,
            state: Cell::new(TaskState::Runnable),
            canceled: Cell::new(false),
            waker,
            joiners: RefCell::new(Vec::new()),
            cancel_timer: RefCell::new(None),
        }
    }

    /// A blocked task that has been woken (matched, timed out or canceled)
    /// reports `Runnable` before its next poll.
    pub(crate) fn state(&self) -> TaskState {
        match self.state.get() {
            TaskState::Blocked if self.waker.is_scheduled() => TaskState::Runnable,
            state => state,
        }
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        self.state.set(state);
    }

    pub(crate) fn is_canceled(&self) -> bool {
        self.canceled.get()
    }

    /// Cancels the task now.
    ///
    /// Sets the sticky flag and wakes the task, so a pending suspension
    /// point resolves with [`Error::Canceled`](crate::Error::Canceled).
    pub(crate) fn cancel(&self) {
        if self.state().is_done() {
            return;
        }

        self.cancel_timer.take();

        if !self.canceled.replace(true) {
            tracing::debug!(task = %self.id, state = ?self.state(), "cancellation delivered");
        }

        self.waker.schedule();
    }

    /// Arms cancellation according to `deadline`.
    ///
    /// Elapsed deadlines cancel synchronously, future ones arm a timer and
    /// [`Deadline::Never`] leaves the task alone.
    pub(crate) fn request_cancel(self: &Rc<Self>, deadline: Deadline) {
        if self.state().is_done() || self.is_canceled() {
            return;
        }

        if deadline.has_elapsed() {
            self.cancel();
        } else if let Deadline::At(at) = deadline {
            self.arm_cancel(at);
        }
    }

    fn arm_cancel(self: &Rc<Self>, at: Instant) {
        let mut armed = self.cancel_timer.borrow_mut();

        if let Some((armed_at, guard)) = armed.as_ref() {
            if *armed_at <= at && !guard.is_disarmed() {
                return;
            }
        }

        let guard = context::executor().add_timer(at, TimerAction::Cancel(Rc::downgrade(self)));
        *armed = Some((at, guard));

        tracing::debug!(task = %self.id, "cancellation armed");
    }

    /// Registers `waker` to be woken when the task finishes.
    pub(crate) fn register_joiner(&self, waker: &Waker) {
        let mut joiners = self.joiners.borrow_mut();

        if !joiners.iter().any(|joiner| joiner.will_wake(waker)) {
            joiners.push(waker.clone());
        }
    }

    /// Marks the task as finished and wakes every joiner.
    pub(crate) fn complete(&self) {
        self.state.set(TaskState::Done);
        self.cancel_timer.take();

        let joiners = self.joiners.take();
        for joiner in joiners {
            joiner.wake();
        }
    }
}

/// Spawns a future as a task onto the current runtime.
///
/// The task is queued and first polled on the next scheduling pass; the
/// caller keeps running until it reaches a suspension point.
///
/// # Errors
///
/// Returns [`Error::ResourceExhausted`](crate::Error::ResourceExhausted) if
/// the runtime already holds its configured maximum of live tasks.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(async {
///     let _ = yield_now().await;
/// })?;
///
/// handle.join().await?;
/// ```
pub fn spawn<F>(future: F) -> Result<TaskHandle>
where
    F: Future<Output = ()> + 'static,
{
    let header = context::executor().spawn(Box::pin(future))?;
    Ok(TaskHandle::new(header))
}

/// Identifier of the task currently being polled, if any.
pub fn current_id() -> Option<TaskId> {
    context::current_task().map(|task| task.id)
}
