use crate::error::{Error, Result};
use crate::runtime::executor::Executor;
use crate::runtime::task::TaskHeader;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Executor driving the current thread.
    ///
    /// Set for the duration of [`Runtime::block_on`](crate::Runtime::block_on)
    /// so that spawning, timers and cancellation can reach the scheduler
    /// without explicit parameter passing.
    pub(crate) static CURRENT_EXECUTOR: RefCell<Option<Rc<Executor>>> =
        const { RefCell::new(None) };

    /// Task currently being polled.
    pub(crate) static CURRENT_TASK: RefCell<Option<Rc<TaskHeader>>> =
        const { RefCell::new(None) };
}

/// Installs `executor` as the current thread's executor while `f` runs.
///
/// The previous context is restored afterwards, so runtimes may nest.
pub(crate) fn enter_context<R>(executor: Rc<Executor>, f: impl FnOnce() -> R) -> R {
    let prev_executor = CURRENT_EXECUTOR.with(|e| e.replace(Some(executor)));
    let prev_task = CURRENT_TASK.with(|t| t.replace(None));

    let out = f();

    CURRENT_TASK.with(|t| t.replace(prev_task));
    CURRENT_EXECUTOR.with(|e| e.replace(prev_executor));

    out
}

/// Marks `task` as the running task while `f` polls it.
pub(crate) fn enter_task<R>(task: Rc<TaskHeader>, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_TASK.with(|t| t.replace(Some(task)));

    let out = f();

    CURRENT_TASK.with(|t| t.replace(prev));

    out
}

/// Returns the current thread's executor.
///
/// # Panics
///
/// Panics if called outside the context of a runtime.
pub(crate) fn executor() -> Rc<Executor> {
    CURRENT_EXECUTOR.with(|e| {
        e.borrow()
            .clone()
            .expect("must be called within the context of a cadenza runtime")
    })
}

pub(crate) fn current_task() -> Option<Rc<TaskHeader>> {
    CURRENT_TASK.with(|t| t.borrow().clone())
}

/// Fails with [`Error::Canceled`] if the running task has been canceled.
///
/// Code running outside any task is never canceled.
pub(crate) fn check_canceled() -> Result<()> {
    match current_task() {
        Some(task) if task.is_canceled() => Err(Error::Canceled),
        _ => Ok(()),
    }
}
