use crate::error::{Error, Result};
use crate::runtime::context;
use crate::time::Deadline;
use crate::time::timer::{TimerAction, TimerGuard};

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// One-shot signal a parked task waits on.
///
/// The first [`resolve`](Self::resolve) decides the outcome; later calls
/// are ignored. Peers resolve it to hand a parked task its result, which
/// always wins over a deadline or cancellation observed afterwards.
#[derive(Default)]
pub(crate) struct WaitSignal {
    outcome: Cell<Option<Result<()>>>,
    waker: RefCell<Option<Waker>>,
}

impl WaitSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records `outcome` and wakes the parked task.
    ///
    /// Returns `false` if the signal was already resolved.
    pub(crate) fn resolve(&self, outcome: Result<()>) -> bool {
        if self.is_resolved() {
            return false;
        }

        self.outcome.set(Some(outcome));

        if let Some(waker) = self.waker.take() {
            waker.wake();
        }

        true
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.outcome.get().is_some()
    }

    fn outcome(&self) -> Option<Result<()>> {
        self.outcome.get()
    }
}

/// Suspends the current task until `signal` is resolved, the task is
/// canceled, or `deadline` elapses, whichever is observed first.
pub(crate) fn park(signal: &WaitSignal, deadline: Deadline) -> Park<'_> {
    Park {
        signal,
        deadline,
        timer: None,
    }
}

/// Future returned by [`park`].
pub(crate) struct Park<'a> {
    signal: &'a WaitSignal,
    deadline: Deadline,

    /// Wakes the task at `deadline`; disarmed when the future is dropped.
    timer: Option<TimerGuard>,
}

impl Future for Park<'_> {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if let Some(outcome) = this.signal.outcome() {
            return Poll::Ready(outcome);
        }

        let failure = if context::check_canceled().is_err() {
            Some(Error::Canceled)
        } else if this.deadline.has_elapsed() {
            Some(Error::Timeout)
        } else {
            None
        };

        if let Some(error) = failure {
            // Settle the signal so no peer matches a waiter that gave up.
            this.signal.waker.take();
            this.signal.resolve(Err(error));
            return Poll::Ready(Err(error));
        }

        *this.signal.waker.borrow_mut() = Some(cx.waker().clone());

        if this.timer.is_none() {
            if let Deadline::At(at) = this.deadline {
                let action = TimerAction::Wake(cx.waker().clone());
                this.timer = Some(context::executor().add_timer(at, action));
            }
        }

        Poll::Pending
    }
}
