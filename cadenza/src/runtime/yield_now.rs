use crate::error::Result;
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A future that yields execution back to the executor exactly once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = Result<()>;

    /// Polls the yield future.
    ///
    /// On the first poll, a canceled task fails right away; otherwise the
    /// task reschedules itself behind every task already queued and returns
    /// `Poll::Pending`. On the second poll, the future completes.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            context::check_canceled()?;

            self.0 = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(Ok(()))
    }
}

/// Yields execution back to the executor.
///
/// Every other runnable task gets a turn before the caller resumes.
///
/// # Errors
///
/// Returns [`Error::Canceled`](crate::Error::Canceled) without yielding if
/// the calling task has been canceled.
///
/// # Examples
///
/// ```rust,ignore
/// async fn task() -> cadenza::Result<()> {
///     // Allow other tasks to run
///     yield_now().await?;
///     Ok(())
/// }
/// ```
pub async fn yield_now() -> Result<()> {
    YieldOnce(false).await
}
