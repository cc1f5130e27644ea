use super::handle::TaskHandle;
use crate::error::{Error, Result};
use crate::runtime::context;
use crate::time::Deadline;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Cancels a group of tasks at `deadline` and waits until all of them have
/// finished.
///
/// Each task is canceled according to `deadline`: an elapsed deadline
/// cancels it right away, a future one cancels it when the deadline is
/// reached unless it finishes first, and [`Deadline::Never`] just waits for
/// it. Tasks keep running until they exit, so cancellation is only an
/// invitation to wind down.
///
/// The handles are consumed: once this returns, the tasks are gone.
///
/// # Errors
///
/// Returns [`Error::Canceled`] if the calling task itself was canceled while
/// waiting. In that case every remaining target is canceled immediately and
/// still joined before the error is reported.
///
/// # Examples
///
/// ```rust,ignore
/// let a = task::spawn(worker(1))?;
/// let b = task::spawn(worker(2))?;
///
/// task::cancel([a, b], Deadline::after(Duration::from_millis(100))).await?;
/// ```
pub async fn cancel<I>(tasks: I, deadline: Deadline) -> Result<()>
where
    I: IntoIterator<Item = TaskHandle>,
{
    let handles: Vec<TaskHandle> = tasks.into_iter().collect();

    for handle in &handles {
        handle.header.request_cancel(deadline);
    }

    Join {
        handles,
        escalated: false,
    }
    .await
}

/// Waits for every handle to reach [`TaskState::Done`](super::TaskState::Done).
struct Join {
    handles: Vec<TaskHandle>,
    escalated: bool,
}

impl Join {
    fn escalate(&mut self) {
        self.escalated = true;

        for handle in &self.handles {
            handle.header.cancel();
        }

        tracing::debug!(
            tasks = self.handles.len(),
            "joining task canceled; canceling targets immediately"
        );
    }
}

impl Future for Join {
    type Output = Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if !this.escalated && context::check_canceled().is_err() {
            this.escalate();
        }

        this.handles.retain(|handle| !handle.is_finished());

        if this.handles.is_empty() {
            return Poll::Ready(if this.escalated {
                Err(Error::Canceled)
            } else {
                Ok(())
            });
        }

        for handle in &this.handles {
            handle.header.register_joiner(cx.waker());
        }

        Poll::Pending
    }
}
